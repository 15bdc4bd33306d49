use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::dto::asset_dto::AssetType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AcquiredVia {
    Draft,
    Waiver,
    Trade,
}

/// Append-only history row, one per committed pick.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct DraftPick {
    pub league_id: i64,
    pub pick_number: i64,
    pub round: i64,
    pub team_id: i64,
    pub asset_type: AssetType,
    pub asset_id: i64,
    pub picked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct RosterEntry {
    pub league_id: i64,
    pub team_id: i64,
    pub asset_type: AssetType,
    pub asset_id: i64,
    pub acquired_via: AcquiredVia,
    pub acquired_at_round: i64,
    pub acquired_at: DateTime<Utc>,
}

impl RosterEntry {
    pub fn drafted(pick: &DraftPick) -> Self {
        Self {
            league_id: pick.league_id,
            team_id: pick.team_id,
            asset_type: pick.asset_type,
            asset_id: pick.asset_id,
            acquired_via: AcquiredVia::Draft,
            acquired_at_round: pick.round,
            acquired_at: pick.picked_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub team_id: i64,
    pub asset_type: AssetType,
    pub asset_id: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct PickReceipt {
    pub asset_name: String,
    pub pick_number: i64,
    pub round: i64,
}

/// Draft board row: a pick joined with team and asset names.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct BoardPick {
    pub pick_number: i64,
    pub round: i64,
    pub team_id: i64,
    pub team_name: String,
    pub asset_type: AssetType,
    pub asset_id: i64,
    pub asset_name: String,
    pub picked_at: DateTime<Utc>,
}
