use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::db::SqliteStore;
use crate::dto::draft_dto::CompletionCheck;
use crate::dto::pick_dto::PickRequest;
use crate::error::DraftError;
use crate::services::auth_user::AuthUser;
use crate::services::coordinator::SharedCoordinator;

pub async fn start_draft(
    Extension(coordinator): Extension<SharedCoordinator>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
) -> Result<impl IntoResponse, DraftError> {
    info!("Starting draft for league {}.", league_id);
    let started = coordinator.start_draft(league_id, &claims.sub).await?;
    Ok((StatusCode::OK, Json(started)))
}

pub async fn draft_pick(
    Extension(coordinator): Extension<SharedCoordinator>,
    Extension(store): Extension<SqliteStore>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<PickRequest>,
) -> Result<impl IntoResponse, DraftError> {
    info!(
        "Team {} drafting {} #{} in league {}",
        payload.team_id, payload.asset_type, payload.asset_id, league_id
    );

    let team = store
        .team(league_id, payload.team_id)
        .await?
        .ok_or(DraftError::TeamNotFound(payload.team_id))?;
    if team.owner_user_id != claims.sub {
        return Err(DraftError::Unauthorized(
            "You do not have permission to pick for this team.".to_string(),
        ));
    }

    let receipt = coordinator
        .commit_pick(league_id, payload.team_id, payload.asset_type, payload.asset_id)
        .await?;
    Ok((StatusCode::OK, Json(receipt)))
}

pub async fn get_status(
    Extension(coordinator): Extension<SharedCoordinator>,
    Path(league_id): Path<i64>,
) -> Result<impl IntoResponse, DraftError> {
    let status = coordinator.status(league_id).await?;
    Ok((StatusCode::OK, Json(status)))
}

pub async fn check_completion(
    Extension(coordinator): Extension<SharedCoordinator>,
    AuthUser(_claims): AuthUser,
    Path(league_id): Path<i64>,
) -> Result<impl IntoResponse, DraftError> {
    let completed = coordinator.force_completion_check(league_id).await?;
    Ok((StatusCode::OK, Json(CompletionCheck { completed })))
}

/// Every pick so far, with team and asset names, for the draft board.
pub async fn get_board(
    Extension(store): Extension<SqliteStore>,
    Path(league_id): Path<i64>,
) -> Result<impl IntoResponse, DraftError> {
    let picks = store.board(league_id).await?;
    Ok((StatusCode::OK, Json(picks)))
}
