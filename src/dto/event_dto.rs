use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dto::asset_dto::AssetType;

/// Messages pushed to everyone watching a league's draft room.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    DraftStarted {
        league_id: i64,
        team_count: usize,
        team_order: Vec<i64>,
        timestamp: DateTime<Utc>,
    },
    PickMade {
        team_id: i64,
        team_name: String,
        asset_type: AssetType,
        asset_id: i64,
        asset_name: String,
        pick_number: i64,
        round: i64,
    },
    NextTurn {
        team_id: i64,
        team_name: String,
        pick_number: i64,
        round: i64,
        expires_at: Option<DateTime<Utc>>,
    },
    /// The clock ran out; the slot stays empty.
    PickSkipped {
        team_id: i64,
        pick_number: i64,
        round: i64,
    },
    DraftCompleted {
        league_id: i64,
        timestamp: DateTime<Utc>,
    },
}

impl DraftEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DraftEvent::DraftStarted { .. } => "draft_started",
            DraftEvent::PickMade { .. } => "pick_made",
            DraftEvent::NextTurn { .. } => "next_turn",
            DraftEvent::PickSkipped { .. } => "pick_skipped",
            DraftEvent::DraftCompleted { .. } => "draft_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = DraftEvent::PickMade {
            team_id: 1,
            team_name: "Greenhouse".into(),
            asset_type: AssetType::Manufacturer,
            asset_id: 7,
            asset_name: "Aurora".into(),
            pick_number: 1,
            round: 1,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "pick_made");
        assert_eq!(value["asset_type"], "manufacturer");
        assert_eq!(value["asset_name"], "Aurora");
        assert_eq!(event.kind(), "pick_made");
    }
}
