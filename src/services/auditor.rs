// Completion rule for a draft session, independent of how it got there.

use std::collections::HashMap;

use crate::dto::draft_dto::{DraftSession, DraftStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    NotStarted,
    InProgress,
    AlreadyComplete,
    /// The session was still open but should not have been; it is now closed.
    JustCompleted,
}

impl AuditOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, AuditOutcome::AlreadyComplete | AuditOutcome::JustCompleted)
    }
}

/// True when every team has filled its roster, or the pick counter has run
/// past the last pick.
pub fn is_complete(session: &DraftSession, roster_counts: &HashMap<i64, i64>) -> bool {
    if session.team_order.is_empty() {
        return false;
    }
    if session.position.pick_number > session.total_picks() {
        return true;
    }
    let slots = session.slots_per_team();
    session
        .team_order
        .iter()
        .all(|team| roster_counts.get(team).copied().unwrap_or(0) >= slots)
}

/// What a reconciliation pass would conclude, without touching anything.
pub fn assess(session: &DraftSession, roster_counts: &HashMap<i64, i64>) -> AuditOutcome {
    match session.status {
        DraftStatus::NotStarted => AuditOutcome::NotStarted,
        DraftStatus::Complete => AuditOutcome::AlreadyComplete,
        DraftStatus::InProgress if is_complete(session, roster_counts) => AuditOutcome::JustCompleted,
        DraftStatus::InProgress => AuditOutcome::InProgress,
    }
}
