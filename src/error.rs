use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::services::roster_rules::LayoutError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("league {league_id} is no longer at pick {expected}")]
    StaleSession { league_id: i64, expected: i64 },
}

/// Everything a draft operation can be rejected with.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("it is not this team's turn to pick")]
    NotYourTurn,
    #[error("{asset_type} #{asset_id} has already been drafted in this league")]
    AlreadyDrafted { asset_type: String, asset_id: i64 },
    #[error("no roster slot left that can hold a {0}")]
    SlotUnavailable(String),
    #[error("{asset_type} #{asset_id} does not exist")]
    AssetNotFound { asset_type: String, asset_id: i64 },
    #[error("the draft is not in progress")]
    DraftNotInProgress,
    #[error("the draft has already started")]
    AlreadyStarted,
    #[error("need at least 2 teams to start the draft, found {0}")]
    InsufficientTeams(usize),
    #[error("{0}")]
    Unauthorized(String),
    #[error("the draft is complete")]
    DraftAlreadyComplete,
    #[error("league {0} was not found")]
    LeagueNotFound(i64),
    #[error("team {0} was not found in this league")]
    TeamNotFound(i64),
    #[error("invalid roster layout: {0}")]
    InvalidRosterLayout(#[from] LayoutError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl DraftError {
    /// Stable identifier clients can switch on.
    pub fn code(&self) -> &'static str {
        match self {
            DraftError::NotYourTurn => "not_your_turn",
            DraftError::AlreadyDrafted { .. } => "already_drafted",
            DraftError::SlotUnavailable(_) => "slot_unavailable",
            DraftError::AssetNotFound { .. } => "asset_not_found",
            DraftError::DraftNotInProgress => "draft_not_in_progress",
            DraftError::AlreadyStarted => "already_started",
            DraftError::InsufficientTeams(_) => "insufficient_teams",
            DraftError::Unauthorized(_) => "unauthorized",
            DraftError::DraftAlreadyComplete => "draft_already_complete",
            DraftError::LeagueNotFound(_) => "league_not_found",
            DraftError::TeamNotFound(_) => "team_not_found",
            DraftError::InvalidRosterLayout(_) => "invalid_roster_layout",
            DraftError::Storage(_) => "internal",
        }
    }

    /// Infrastructure failures; the same request may succeed on retry.
    pub fn is_retriable(&self) -> bool {
        matches!(self, DraftError::Storage(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DraftError::NotYourTurn
            | DraftError::AlreadyDrafted { .. }
            | DraftError::SlotUnavailable(_)
            | DraftError::DraftNotInProgress
            | DraftError::AlreadyStarted
            | DraftError::DraftAlreadyComplete => StatusCode::CONFLICT,
            DraftError::InsufficientTeams(_) | DraftError::InvalidRosterLayout(_) => StatusCode::BAD_REQUEST,
            DraftError::AssetNotFound { .. }
            | DraftError::LeagueNotFound(_)
            | DraftError::TeamNotFound(_) => StatusCode::NOT_FOUND,
            DraftError::Unauthorized(_) => StatusCode::FORBIDDEN,
            DraftError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for DraftError {
    fn from(e: sqlx::Error) -> Self {
        DraftError::Storage(StoreError::Database(e))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for DraftError {
    fn into_response(self) -> Response {
        let message = if let DraftError::Storage(e) = &self {
            error!("Storage failure: {}", e);
            "Internal error, retry the request".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (self.status_code(), Json(body)).into_response()
    }
}
