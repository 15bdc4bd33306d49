use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::db::{LeagueStore, SqliteStore};
use crate::dto::league_dto::{CreateLeague, LeagueCreated};
use crate::dto::team_dto::CreateTeam;
use crate::error::DraftError;
use crate::services::auth_user::AuthUser;
use crate::services::coordinator::SharedCoordinator;

/**
 * POST request to create a league. The caller becomes its commissioner.
 */
pub async fn create_league(
    Extension(coordinator): Extension<SharedCoordinator>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateLeague>,
) -> Result<impl IntoResponse, DraftError> {
    info!("Creating league {}", payload.name);

    let league_id = coordinator
        .create_league(
            &claims.sub,
            &payload.name,
            payload.pick_time_limit_secs,
            payload.roster_layout,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(LeagueCreated { league_id })))
}

/**
 * GET request to get all the teams of a league, in join order.
 */
pub async fn get_teams(
    Extension(store): Extension<SqliteStore>,
    Path(league_id): Path<i64>,
) -> Result<impl IntoResponse, DraftError> {
    info!("Fetching teams for league {}.", league_id);
    let teams = store.teams(league_id).await?;
    Ok((StatusCode::OK, Json(teams)))
}

/**
 * POST request to join a league with a new team. Only allowed before the draft.
 */
pub async fn create_team(
    Extension(coordinator): Extension<SharedCoordinator>,
    AuthUser(claims): AuthUser,
    Path(league_id): Path<i64>,
    Json(payload): Json<CreateTeam>,
) -> Result<impl IntoResponse, DraftError> {
    info!("Creating team {} in league {}", payload.name, league_id);
    let team_id = coordinator.join_league(league_id, &payload.name, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "team_id": team_id }))))
}
