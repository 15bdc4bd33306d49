use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::db::SqliteStore;
use crate::dto::asset_dto::{AssetType, AvailableAssetsQuery, NewAsset};
use crate::error::DraftError;
use crate::services::auth_user::AuthUser;

/**
 * POST request to import or rename catalog assets.
 */
pub async fn save_assets(
    Extension(store): Extension<SqliteStore>,
    AuthUser(_claims): AuthUser,
    Json(payload): Json<Vec<NewAsset>>,
) -> Result<impl IntoResponse, DraftError> {
    info!("Importing {} catalog assets.", payload.len());
    store.save_assets(&payload).await?;
    Ok((StatusCode::OK, format!("Saved {} assets.", payload.len())))
}

/**
 * GET the assets of one category nobody in the league has drafted yet.
 */
pub async fn get_available_assets(
    Extension(store): Extension<SqliteStore>,
    Path((league_id, asset_type)): Path<(i64, AssetType)>,
    Query(query): Query<AvailableAssetsQuery>,
) -> Result<impl IntoResponse, DraftError> {
    let assets = store
        .available_assets(league_id, asset_type, query.search.as_deref(), query.limit)
        .await?;
    Ok((StatusCode::OK, Json(assets)))
}
