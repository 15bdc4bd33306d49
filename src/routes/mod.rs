pub mod assets;
pub mod draft;
pub mod teams;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::db::SqliteStore;
use crate::services::auth_user::JwtSecret;
use crate::services::coordinator::SharedCoordinator;
use crate::services::websocket::websocket_handler;

pub fn app(coordinator: SharedCoordinator, store: SqliteStore, secret: JwtSecret) -> Router {
    Router::new()
        .route("/leagues", post(teams::create_league))
        .route("/leagues/{league_id}/teams", get(teams::get_teams).post(teams::create_team))
        .route("/assets", post(assets::save_assets))
        .route("/leagues/{league_id}/assets/{asset_type}", get(assets::get_available_assets))
        .route("/leagues/{league_id}/draft", get(draft::get_status))
        .route("/leagues/{league_id}/draft/start", post(draft::start_draft))
        .route("/leagues/{league_id}/draft/picks", get(draft::get_board).post(draft::draft_pick))
        .route("/leagues/{league_id}/draft/completion-check", post(draft::check_completion))
        .route("/leagues/{league_id}/draft/ws", get(websocket_handler))
        .layer(Extension(coordinator))
        .layer(Extension(store))
        .layer(Extension(secret))
        .layer(CorsLayer::permissive())
}
