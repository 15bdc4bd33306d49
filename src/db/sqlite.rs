use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::{debug, info};

use crate::db::{AssetCatalog, LeagueStore, PickLedger, RosterStore};
use crate::dto::asset_dto::{Asset, AssetType, NewAsset};
use crate::dto::draft_dto::{DraftPosition, DraftStatus};
use crate::dto::league_dto::League;
use crate::dto::pick_dto::{BoardPick, DraftPick, RosterEntry};
use crate::dto::team_dto::Team;
use crate::error::StoreError;
use crate::services::roster_rules::{RosterLayout, SlotCounts};

pub const DEFAULT_ASSET_LIMIT: i64 = 200;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn team(&self, league_id: i64, team_id: i64) -> Result<Option<Team>, StoreError> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE league_id = ? AND id = ?")
            .bind(league_id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(team)
    }

    pub async fn save_assets(&self, assets: &[NewAsset]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        for asset in assets {
            sqlx::query(
                r#"
                INSERT INTO assets (asset_type, id, name, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(asset_type, id) DO UPDATE SET
                    name = excluded.name
                "#,
            )
            .bind(asset.asset_type)
            .bind(asset.id)
            .bind(&asset.name)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Saved {} catalog assets.", assets.len());
        Ok(())
    }

    /// Catalog entries of one category nobody in the league owns yet.
    pub async fn available_assets(
        &self,
        league_id: i64,
        asset_type: AssetType,
        search: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Asset>, StoreError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let assets = sqlx::query_as::<_, Asset>(
            r#"
            SELECT a.asset_type, a.id, a.name
            FROM assets a
            WHERE a.asset_type = ?
              AND NOT EXISTS (
                  SELECT 1 FROM roster_entries r
                  WHERE r.league_id = ? AND r.asset_type = a.asset_type AND r.asset_id = a.id
              )
              AND (? IS NULL OR a.name LIKE ? ESCAPE '\')
            ORDER BY a.name
            LIMIT ?
            "#,
        )
        .bind(asset_type)
        .bind(league_id)
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(limit.unwrap_or(DEFAULT_ASSET_LIMIT).clamp(1, 1000))
        .fetch_all(&self.pool)
        .await?;

        Ok(assets)
    }

    pub async fn board(&self, league_id: i64) -> Result<Vec<BoardPick>, StoreError> {
        let picks = sqlx::query_as::<_, BoardPick>(
            r#"
            SELECT p.pick_number,
                   p.round,
                   p.team_id,
                   COALESCE(t.name, 'Unknown Team') AS team_name,
                   p.asset_type,
                   p.asset_id,
                   COALESCE(a.name, 'Unknown') AS asset_name,
                   p.picked_at
            FROM draft_picks p
            LEFT JOIN teams t ON t.id = p.team_id
            LEFT JOIN assets a ON a.asset_type = p.asset_type AND a.id = p.asset_id
            WHERE p.league_id = ?
            ORDER BY p.pick_number
            "#,
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(picks)
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'` with the user's wildcards taken literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl AssetCatalog for SqliteStore {
    async fn lookup_asset(&self, asset_type: AssetType, asset_id: i64) -> Result<Option<Asset>, StoreError> {
        let asset = sqlx::query_as::<_, Asset>("SELECT asset_type, id, name FROM assets WHERE asset_type = ? AND id = ?")
            .bind(asset_type)
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(asset)
    }
}

#[async_trait]
impl RosterStore for SqliteStore {
    async fn slot_counts(&self, league_id: i64, team_id: i64) -> Result<SlotCounts, StoreError> {
        let rows = sqlx::query_as::<_, (AssetType, i64)>(
            r#"
            SELECT asset_type, COUNT(*)
            FROM roster_entries
            WHERE league_id = ? AND team_id = ?
            GROUP BY asset_type
            "#,
        )
        .bind(league_id)
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(t, n)| (t, n as u32)).collect())
    }

    async fn roster_counts(&self, league_id: i64) -> Result<HashMap<i64, i64>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT team_id, COUNT(*) FROM roster_entries WHERE league_id = ? GROUP BY team_id",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn is_drafted(&self, league_id: i64, asset_type: AssetType, asset_id: i64) -> Result<bool, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roster_entries WHERE league_id = ? AND asset_type = ? AND asset_id = ?",
        )
        .bind(league_id)
        .bind(asset_type)
        .bind(asset_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl PickLedger for SqliteStore {
    async fn record_pick(&self, pick: &DraftPick, entry: &RosterEntry, next: DraftPosition) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO draft_picks (league_id, pick_number, round, team_id, asset_type, asset_id, picked_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(pick.league_id)
        .bind(pick.pick_number)
        .bind(pick.round)
        .bind(pick.team_id)
        .bind(pick.asset_type)
        .bind(pick.asset_id)
        .bind(pick.picked_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO roster_entries (league_id, team_id, asset_type, asset_id, acquired_via, acquired_at_round, acquired_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.league_id)
        .bind(entry.team_id)
        .bind(entry.asset_type)
        .bind(entry.asset_id)
        .bind(entry.acquired_via)
        .bind(entry.acquired_at_round)
        .bind(entry.acquired_at)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE leagues
            SET current_round = ?, current_pick_in_round = ?, current_pick_number = ?
            WHERE id = ? AND current_pick_number = ? AND draft_status = ?
            "#,
        )
        .bind(next.round)
        .bind(next.pick_in_round)
        .bind(next.pick_number)
        .bind(pick.league_id)
        .bind(pick.pick_number)
        .bind(DraftStatus::InProgress)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // dropping tx rolls back both inserts
            return Err(StoreError::StaleSession {
                league_id: pick.league_id,
                expected: pick.pick_number,
            });
        }

        tx.commit().await?;
        debug!("Recorded pick {} for league {}", pick.pick_number, pick.league_id);
        Ok(())
    }

    async fn picks(&self, league_id: i64) -> Result<Vec<DraftPick>, StoreError> {
        let picks = sqlx::query_as::<_, DraftPick>(
            "SELECT * FROM draft_picks WHERE league_id = ? ORDER BY pick_number",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(picks)
    }
}

#[async_trait]
impl LeagueStore for SqliteStore {
    async fn create_league(
        &self,
        name: &str,
        commissioner_user_id: &str,
        pick_time_limit_secs: i64,
        roster_layout: RosterLayout,
    ) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leagues (name, commissioner_user_id, pick_time_limit_secs, roster_layout, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(commissioner_user_id)
        .bind(pick_time_limit_secs)
        .bind(Json(roster_layout))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let league_id = result.last_insert_rowid();
        info!("Created league {} ({})", league_id, name);
        Ok(league_id)
    }

    async fn create_team(&self, league_id: i64, name: &str, owner_user_id: &str) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO teams (league_id, name, owner_user_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(league_id)
        .bind(name)
        .bind(owner_user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn league(&self, league_id: i64) -> Result<Option<League>, StoreError> {
        let league = sqlx::query_as::<_, League>("SELECT * FROM leagues WHERE id = ?")
            .bind(league_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(league)
    }

    async fn teams(&self, league_id: i64) -> Result<Vec<Team>, StoreError> {
        let teams = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE league_id = ? ORDER BY id")
            .bind(league_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(teams)
    }

    async fn is_commissioner(&self, league_id: i64, user_id: &str) -> Result<bool, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leagues WHERE id = ? AND commissioner_user_id = ?",
        )
        .bind(league_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn begin_draft(&self, league_id: i64, team_order: &[i64], at: DateTime<Utc>) -> Result<(), StoreError> {
        let first = DraftPosition::FIRST;
        let updated = sqlx::query(
            r#"
            UPDATE leagues
            SET draft_status = ?, team_order = ?, current_round = ?, current_pick_in_round = ?,
                current_pick_number = ?, draft_started_at = ?
            WHERE id = ? AND draft_status = ?
            "#,
        )
        .bind(DraftStatus::InProgress)
        .bind(Json(team_order))
        .bind(first.round)
        .bind(first.pick_in_round)
        .bind(first.pick_number)
        .bind(at)
        .bind(league_id)
        .bind(DraftStatus::NotStarted)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::StaleSession { league_id, expected: 0 });
        }
        Ok(())
    }

    async fn advance(&self, league_id: i64, next: DraftPosition) -> Result<(), StoreError> {
        let expected = next.pick_number - 1;
        let updated = sqlx::query(
            r#"
            UPDATE leagues
            SET current_round = ?, current_pick_in_round = ?, current_pick_number = ?
            WHERE id = ? AND current_pick_number = ? AND draft_status = ?
            "#,
        )
        .bind(next.round)
        .bind(next.pick_in_round)
        .bind(next.pick_number)
        .bind(league_id)
        .bind(expected)
        .bind(DraftStatus::InProgress)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::StaleSession { league_id, expected });
        }
        Ok(())
    }

    async fn mark_complete(&self, league_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE leagues
            SET draft_status = ?, draft_completed_at = ?
            WHERE id = ? AND draft_status = ?
            "#,
        )
        .bind(DraftStatus::Complete)
        .bind(at)
        .bind(league_id)
        .bind(DraftStatus::InProgress)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn in_progress_leagues(&self) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM leagues WHERE draft_status = ? ORDER BY id")
            .bind(DraftStatus::InProgress)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
