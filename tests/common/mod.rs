#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use draft_room::config::DraftSettings;
use draft_room::db::{self, DraftStore, LeagueStore, SqliteStore};
use draft_room::dto::asset_dto::{AssetType, NewAsset};
use draft_room::dto::event_dto::DraftEvent;
use draft_room::services::coordinator::{DraftCoordinator, SharedCoordinator};
use draft_room::services::roster_rules::RosterLayout;

pub const COMMISSIONER: &str = "commish";
pub const LONG_CLOCK_SECS: i64 = 3600;

pub struct Fixture {
    pub coordinator: SharedCoordinator,
    pub store: SqliteStore,
    pub league_id: i64,
    pub teams: Vec<i64>,
}

pub fn settings() -> DraftSettings {
    DraftSettings {
        default_pick_time_limit: Duration::from_secs(LONG_CLOCK_SECS as u64),
        randomize_order: false,
    }
}

pub fn two_slot_layout() -> RosterLayout {
    RosterLayout {
        manufacturer: 1,
        cannabis_strain: 1,
        product: 0,
        pharmacy: 0,
        brand: 0,
        flex: 0,
    }
}

pub async fn memory_store() -> SqliteStore {
    let pool = db::connect("sqlite::memory:").await.expect("in-memory sqlite");
    let store = SqliteStore::new(pool);
    seed_catalog(&store, 50).await;
    store
}

/// `per_type` assets of every category, ids 1..=per_type.
pub async fn seed_catalog(store: &SqliteStore, per_type: i64) {
    let assets: Vec<NewAsset> = AssetType::ALL
        .iter()
        .flat_map(|t| {
            (1..=per_type).map(move |id| NewAsset {
                asset_type: *t,
                id,
                name: format!("{t} {id}"),
            })
        })
        .collect();
    store.save_assets(&assets).await.expect("seed catalog");
}

pub async fn league_with_teams(
    store: &SqliteStore,
    team_count: usize,
    layout: RosterLayout,
    pick_secs: i64,
) -> (i64, Vec<i64>) {
    let league_id = store
        .create_league("Test League", COMMISSIONER, pick_secs, layout)
        .await
        .expect("create league");

    let mut teams = Vec::new();
    for i in 1..=team_count {
        let id = store
            .create_team(league_id, &format!("Team {i}"), &format!("owner{i}"))
            .await
            .expect("create team");
        teams.push(id);
    }
    (league_id, teams)
}

pub async fn fixture(team_count: usize, layout: RosterLayout, pick_secs: i64) -> Fixture {
    let store = memory_store().await;
    let (league_id, teams) = league_with_teams(&store, team_count, layout, pick_secs).await;
    let coordinator = DraftCoordinator::new(Arc::new(store.clone()), settings());
    Fixture {
        coordinator,
        store,
        league_id,
        teams,
    }
}

pub fn coordinator_over(store: Arc<dyn DraftStore>) -> SharedCoordinator {
    DraftCoordinator::new(store, settings())
}

/// Everything currently buffered on the receiver.
pub fn drain(rx: &mut broadcast::Receiver<DraftEvent>) -> Vec<DraftEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn kinds(events: &[DraftEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.kind()).collect()
}
