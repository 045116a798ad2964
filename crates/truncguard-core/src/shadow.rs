//! Shadow length tracking.
//!
//! The host's document length is never read on the hot path. Each editor
//! instance gets a counter in a side-table, seeded once from the instance's
//! real text length and then adjusted by every allowed insert and delete.
//!
//! All lengths are in UTF-16 code units, the host's index space.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Content handed to the host's insert primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Plain text.
    Text(&'a str),
    /// A non-text atomic unit such as an image or other embed.
    Embed,
}

impl Payload<'_> {
    /// Length this payload adds to the document.
    pub fn units(&self) -> usize {
        match self {
            Payload::Text(text) => text.encode_utf16().count(),
            Payload::Embed => 1,
        }
    }
}

/// Per-instance shadow lengths, keyed by an opaque instance key.
///
/// Kept beside the host's objects rather than on them so the host's field
/// layout is never touched.
#[derive(Debug, Clone)]
pub struct ShadowTable<K> {
    lengths: HashMap<K, usize>,
}

impl<K> Default for ShadowTable<K> {
    fn default() -> Self {
        Self {
            lengths: HashMap::new(),
        }
    }
}

impl<K> ShadowTable<K>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the shadow length for `key` if it has none yet.
    ///
    /// `probe` reads the instance's real text length and is only called on
    /// first use. A failed probe seeds zero. Returns the current length.
    pub fn seed_with(&mut self, key: K, probe: impl FnOnce() -> Option<usize>) -> usize {
        *self.lengths.entry(key).or_insert_with(|| {
            let seeded = probe();
            match seeded {
                Some(len) => tracing::debug!(?key, len, "seeded shadow length"),
                None => tracing::debug!(?key, "text length unreadable, seeding zero"),
            }
            seeded.unwrap_or(0)
        })
    }

    /// Current shadow length, if the instance has been seen.
    pub fn get(&self, key: K) -> Option<usize> {
        self.lengths.get(&key).copied()
    }

    /// Record an insert of `units` code units.
    ///
    /// Returns `None` without recording anything if `key` was never seeded.
    pub fn record_insert(&mut self, key: K, units: usize) -> Option<usize> {
        let len = self.lengths.get_mut(&key)?;
        *len = len.saturating_add(units);
        Some(*len)
    }

    /// Record an allowed delete of `units` code units, clamped at zero.
    ///
    /// Returns `None` without recording anything if `key` was never seeded.
    pub fn record_delete(&mut self, key: K, units: usize) -> Option<usize> {
        let len = self.lengths.get_mut(&key)?;
        *len = len.saturating_sub(units);
        Some(*len)
    }

    /// Drop the entry for an instance that no longer exists.
    pub fn remove(&mut self, key: K) -> Option<usize> {
        self.lengths.remove(&key)
    }

    /// Reset one instance to zero after a full clear.
    pub fn reset(&mut self, key: K) {
        self.lengths.insert(key, 0);
    }

    /// Reset every tracked instance to zero.
    pub fn reset_all(&mut self) {
        self.lengths.values_mut().for_each(|len| *len = 0);
    }

    /// Number of tracked instances.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}
