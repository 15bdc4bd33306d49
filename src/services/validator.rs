use tracing::debug;

use crate::db::DraftStore;
use crate::dto::asset_dto::{Asset, AssetType};
use crate::dto::draft_dto::DraftSession;
use crate::error::DraftError;
use crate::services::scheduler;

/// Decide whether `team_id` may take this asset right now. Reads only; the
/// caller must hold the league's lock so the snapshot can't move underneath.
///
/// On success returns the catalog entry so the caller has the asset name for
/// the broadcast.
pub async fn validate(
    store: &dyn DraftStore,
    session: &DraftSession,
    team_id: i64,
    asset_type: AssetType,
    asset_id: i64,
) -> Result<Asset, DraftError> {
    let turn = scheduler::current_turn(session)?;
    if turn.team_id != team_id {
        debug!(
            "Team {} tried to pick on pick {} owned by team {}",
            team_id, turn.pick_number, turn.team_id
        );
        return Err(DraftError::NotYourTurn);
    }

    let asset = store
        .lookup_asset(asset_type, asset_id)
        .await?
        .ok_or_else(|| DraftError::AssetNotFound {
            asset_type: asset_type.to_string(),
            asset_id,
        })?;

    if store.is_drafted(session.league_id, asset_type, asset_id).await? {
        return Err(DraftError::AlreadyDrafted {
            asset_type: asset_type.to_string(),
            asset_id,
        });
    }

    let counts = store.slot_counts(session.league_id, team_id).await?;
    if !session.roster_layout.can_hold(&counts, asset_type) {
        return Err(DraftError::SlotUnavailable(asset_type.to_string()));
    }

    Ok(asset)
}
