//! Storage seams the draft engine talks through, and the SQLite pool setup.

pub mod sqlite;

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::dto::asset_dto::{Asset, AssetType};
use crate::dto::draft_dto::DraftPosition;
use crate::dto::league_dto::League;
use crate::dto::pick_dto::{DraftPick, RosterEntry};
use crate::dto::team_dto::Team;
use crate::error::StoreError;
use crate::services::roster_rules::{RosterLayout, SlotCounts};

pub use sqlite::SqliteStore;

#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn lookup_asset(&self, asset_type: AssetType, asset_id: i64) -> Result<Option<Asset>, StoreError>;
}

#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn slot_counts(&self, league_id: i64, team_id: i64) -> Result<SlotCounts, StoreError>;

    /// Roster size per team id. Teams with no entries are absent.
    async fn roster_counts(&self, league_id: i64) -> Result<HashMap<i64, i64>, StoreError>;

    async fn is_drafted(&self, league_id: i64, asset_type: AssetType, asset_id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PickLedger: Send + Sync {
    /// Insert the pick, the roster entry and the advanced position in one
    /// transaction. Nothing is written if any part fails.
    async fn record_pick(&self, pick: &DraftPick, entry: &RosterEntry, next: DraftPosition) -> Result<(), StoreError>;

    /// Picks ordered by pick number.
    async fn picks(&self, league_id: i64) -> Result<Vec<DraftPick>, StoreError>;
}

#[async_trait]
pub trait LeagueStore: Send + Sync {
    async fn create_league(
        &self,
        name: &str,
        commissioner_user_id: &str,
        pick_time_limit_secs: i64,
        roster_layout: RosterLayout,
    ) -> Result<i64, StoreError>;

    async fn create_team(&self, league_id: i64, name: &str, owner_user_id: &str) -> Result<i64, StoreError>;

    async fn league(&self, league_id: i64) -> Result<Option<League>, StoreError>;

    /// Teams in join order.
    async fn teams(&self, league_id: i64) -> Result<Vec<Team>, StoreError>;

    async fn is_commissioner(&self, league_id: i64, user_id: &str) -> Result<bool, StoreError>;

    async fn begin_draft(&self, league_id: i64, team_order: &[i64], at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Move the session to `next` without recording a pick.
    async fn advance(&self, league_id: i64, next: DraftPosition) -> Result<(), StoreError>;

    async fn mark_complete(&self, league_id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn in_progress_leagues(&self) -> Result<Vec<i64>, StoreError>;
}

/// Everything the coordinator needs from persistence.
pub trait DraftStore: AssetCatalog + RosterStore + PickLedger + LeagueStore {}

impl<T> DraftStore for T where T: AssetCatalog + RosterStore + PickLedger + LeagueStore {}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS leagues (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        commissioner_user_id TEXT NOT NULL,
        pick_time_limit_secs INTEGER NOT NULL,
        roster_layout TEXT NOT NULL,
        draft_status TEXT NOT NULL DEFAULT 'not_started',
        team_order TEXT NOT NULL DEFAULT '[]',
        current_round INTEGER NOT NULL DEFAULT 0,
        current_pick_in_round INTEGER NOT NULL DEFAULT 0,
        current_pick_number INTEGER NOT NULL DEFAULT 0,
        draft_started_at TEXT,
        draft_completed_at TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        league_id INTEGER NOT NULL REFERENCES leagues(id),
        name TEXT NOT NULL,
        owner_user_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assets (
        asset_type TEXT NOT NULL,
        id INTEGER NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (asset_type, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS draft_picks (
        league_id INTEGER NOT NULL REFERENCES leagues(id),
        pick_number INTEGER NOT NULL,
        round INTEGER NOT NULL,
        team_id INTEGER NOT NULL REFERENCES teams(id),
        asset_type TEXT NOT NULL,
        asset_id INTEGER NOT NULL,
        picked_at TEXT NOT NULL,
        PRIMARY KEY (league_id, pick_number),
        UNIQUE (league_id, asset_type, asset_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roster_entries (
        league_id INTEGER NOT NULL REFERENCES leagues(id),
        team_id INTEGER NOT NULL REFERENCES teams(id),
        asset_type TEXT NOT NULL,
        asset_id INTEGER NOT NULL,
        acquired_via TEXT NOT NULL,
        acquired_at_round INTEGER NOT NULL,
        acquired_at TEXT NOT NULL,
        UNIQUE (league_id, asset_type, asset_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_roster_team ON roster_entries (league_id, team_id)",
    "CREATE INDEX IF NOT EXISTS idx_teams_league ON teams (league_id)",
];

/// Open the pool and make sure the schema exists. In-memory databases get a
/// single long-lived connection, otherwise each connection would see its own
/// empty database.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    info!("Database schema ready.");
    Ok(())
}
