use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::roster_rules::RosterLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Complete,
}

/// Where the draft currently stands. `pick_number` is 1-based and counts
/// across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPosition {
    pub round: i64,
    pub pick_in_round: i64,
    pub pick_number: i64,
}

impl DraftPosition {
    pub const FIRST: DraftPosition = DraftPosition {
        round: 1,
        pick_in_round: 1,
        pick_number: 1,
    };
}

/// The live draft of one league, as persisted on the league row.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSession {
    pub league_id: i64,
    pub team_order: Vec<i64>,
    pub roster_layout: RosterLayout,
    pub status: DraftStatus,
    pub position: DraftPosition,
}

impl DraftSession {
    pub fn team_count(&self) -> i64 {
        self.team_order.len() as i64
    }

    pub fn slots_per_team(&self) -> i64 {
        self.roster_layout.slots_per_team()
    }

    pub fn total_picks(&self) -> i64 {
        self.team_count() * self.slots_per_team()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub team_id: i64,
    pub round: i64,
    pub pick_in_round: i64,
    pub pick_number: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub armed_for_pick_number: i64,
    pub expires_at: DateTime<Utc>,
}

/// Read model served to spectators and reconnecting clients.
#[derive(Debug, Clone, Serialize)]
pub struct DraftStatusView {
    pub league_id: i64,
    pub status: DraftStatus,
    pub current_round: i64,
    pub current_pick_number: i64,
    pub total_picks: i64,
    pub team_order: Vec<i64>,
    pub on_the_clock: Option<Turn>,
    pub next_turn: Option<Turn>,
    pub timer: Option<TimerSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct DraftStarted {
    pub team_count: usize,
    pub team_order: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct CompletionCheck {
    pub completed: bool,
}
