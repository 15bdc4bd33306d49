use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::dto::draft_dto::{DraftPosition, DraftSession, DraftStatus};
use crate::services::roster_rules::RosterLayout;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub commissioner_user_id: String,
    pub pick_time_limit_secs: i64,
    pub roster_layout: Json<RosterLayout>,
    pub draft_status: DraftStatus,
    pub team_order: Json<Vec<i64>>,
    pub current_round: i64,
    pub current_pick_in_round: i64,
    pub current_pick_number: i64,
    pub draft_started_at: Option<DateTime<Utc>>,
    pub draft_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl League {
    pub fn session(&self) -> DraftSession {
        DraftSession {
            league_id: self.id,
            team_order: self.team_order.0.clone(),
            roster_layout: self.roster_layout.0,
            status: self.draft_status,
            position: DraftPosition {
                round: self.current_round,
                pick_in_round: self.current_pick_in_round,
                pick_number: self.current_pick_number,
            },
        }
    }

    pub fn pick_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pick_time_limit_secs.max(1) as u64)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLeague {
    pub name: String,
    pub pick_time_limit_secs: Option<i64>,
    pub roster_layout: Option<RosterLayout>,
}

#[derive(Debug, Serialize)]
pub struct LeagueCreated {
    pub league_id: i64,
}
