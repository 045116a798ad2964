//! Delete classification.
//!
//! Decides whether a delete call is the user removing content or the host
//! silently truncating a suffix it considers too long. The host's length-limit
//! truncation always removes a suffix, so only deletions that touch the
//! tracked end are suspects.

use serde::{Deserialize, Serialize};

use crate::signals::{SignalSnapshot, UserEvent};

/// Classification policy.
///
/// - `Strict`: only delete keys and cut authorize end-touching deletions.
///   Paste does not, so truncation right after a large paste is caught.
/// - `Permissive`: pointer-down, paste and composition start also authorize.
///   Fewer false blocks for IME and mouse-driven edits, but paste-triggered
///   truncation slips through.
/// - `TypingFix`: the permissive event set, plus any deletion no longer than
///   `short_edit_max` is allowed regardless of position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Policy {
    #[default]
    Strict,
    Permissive,
    TypingFix,
}

impl Policy {
    /// Whether `event` counts as an authorizing signal under this policy.
    pub fn qualifies(self, event: UserEvent) -> bool {
        match self {
            Policy::Strict => matches!(event, UserEvent::DeleteKey | UserEvent::Cut),
            Policy::Permissive | Policy::TypingFix => true,
        }
    }
}

/// A requested removal of `length` units starting at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRequest {
    pub index: usize,
    pub length: usize,
}

impl DeleteRequest {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// One past the last removed unit.
    pub fn end(&self) -> usize {
        self.index.saturating_add(self.length)
    }

    /// Whether the range touches or passes the end of `tracked` content.
    pub fn reaches_end(&self, tracked: usize) -> bool {
        self.end() >= tracked
    }
}

/// Why a deletion was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// A programmatic clear is in progress.
    ManualClear,
    /// A qualifying user action happened within the recency window.
    UserAction,
    /// Deletion starts at index 0 (select-all delete, clear on send).
    FromStart,
    /// Deletion ends before the tracked end of content.
    Interior,
    /// Short deletion exempted by [`Policy::TypingFix`].
    ShortEdit,
}

/// Outcome of classifying a delete call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward to the host and decrement the shadow length.
    Allow(AllowReason),
    /// Drop the call. Shadow length is unchanged.
    Block,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow(_))
    }
}

/// The decision function, parameterized by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    policy: Policy,
    short_edit_max: usize,
}

impl Classifier {
    pub fn new(policy: Policy, short_edit_max: usize) -> Self {
        Self {
            policy,
            short_edit_max,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Classify `request` against `tracked` shadow length. First match wins.
    pub fn classify(
        &self,
        tracked: usize,
        request: DeleteRequest,
        signals: SignalSnapshot,
    ) -> Verdict {
        if signals.manual_clear {
            return Verdict::Allow(AllowReason::ManualClear);
        }
        if signals.recent_user_action {
            return Verdict::Allow(AllowReason::UserAction);
        }
        if request.index == 0 {
            return Verdict::Allow(AllowReason::FromStart);
        }
        if !request.reaches_end(tracked) {
            return Verdict::Allow(AllowReason::Interior);
        }
        if self.policy == Policy::TypingFix && request.length <= self.short_edit_max {
            return Verdict::Allow(AllowReason::ShortEdit);
        }
        Verdict::Block
    }
}
