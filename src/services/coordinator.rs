// Draft lifecycle: start, pick, clock expiry, completion.
//
// Every mutation of a league's draft goes through that league's mutex and
// holds it for the whole read-validate-write-notify sequence. Different
// leagues never contend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use rand::rng;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DraftSettings;
use crate::db::DraftStore;
use crate::dto::asset_dto::AssetType;
use crate::dto::draft_dto::{DraftPosition, DraftStarted, DraftStatus, DraftStatusView, TimerSnapshot};
use crate::dto::event_dto::DraftEvent;
use crate::dto::league_dto::League;
use crate::dto::pick_dto::{DraftPick, PickReceipt, RosterEntry};
use crate::dto::team_dto::Team;
use crate::error::DraftError;
use crate::services::auditor::{self, AuditOutcome};
use crate::services::pick_timer::PickTimers;
use crate::services::roster_rules::RosterLayout;
use crate::services::scheduler;
use crate::services::validator;
use crate::services::websocket::DraftBroadcaster;

pub type SharedCoordinator = Arc<DraftCoordinator>;

pub struct DraftCoordinator {
    store: Arc<dyn DraftStore>,
    events: DraftBroadcaster,
    timers: PickTimers,
    locks: DashMap<i64, Arc<Mutex<()>>>,
    settings: DraftSettings,
}

impl DraftCoordinator {
    pub fn new(store: Arc<dyn DraftStore>, settings: DraftSettings) -> SharedCoordinator {
        Arc::new(Self {
            store,
            events: DraftBroadcaster::new(),
            timers: PickTimers::new(),
            locks: DashMap::new(),
            settings,
        })
    }

    pub fn events(&self) -> &DraftBroadcaster {
        &self.events
    }

    pub fn timers(&self) -> &PickTimers {
        &self.timers
    }

    pub fn settings(&self) -> &DraftSettings {
        &self.settings
    }

    /// Leagues with a live lock entry.
    pub fn tracked_leagues(&self) -> usize {
        self.locks.len()
    }

    fn league_lock(&self, league_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry(league_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_league(&self, league_id: i64) -> Result<League, DraftError> {
        self.store
            .league(league_id)
            .await?
            .ok_or(DraftError::LeagueNotFound(league_id))
    }

    /// Create a league owned by `commissioner_user_id`. Missing settings fall
    /// back to the configured defaults.
    pub async fn create_league(
        &self,
        commissioner_user_id: &str,
        name: &str,
        pick_time_limit_secs: Option<i64>,
        roster_layout: Option<RosterLayout>,
    ) -> Result<i64, DraftError> {
        let layout = roster_layout.unwrap_or_default();
        layout.validate()?;
        let pick_time_limit_secs = pick_time_limit_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(self.settings.default_pick_time_limit.as_secs() as i64);

        Ok(self
            .store
            .create_league(name, commissioner_user_id, pick_time_limit_secs, layout)
            .await?)
    }

    /// Add a team to a league whose draft has not started. Serialized with
    /// `start_draft` so the team either makes the draft order or is refused.
    pub async fn join_league(&self, league_id: i64, name: &str, owner_user_id: &str) -> Result<i64, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let league = self.load_league(league_id).await?;
        if league.draft_status != DraftStatus::NotStarted {
            return Err(DraftError::AlreadyStarted);
        }

        let team_id = self.store.create_team(league_id, name, owner_user_id).await?;
        info!("Team {} ({}) joined league {}", team_id, name, league_id);
        Ok(team_id)
    }

    pub async fn start_draft(self: &Arc<Self>, league_id: i64, user_id: &str) -> Result<DraftStarted, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let league = self.load_league(league_id).await?;
        if !self.store.is_commissioner(league_id, user_id).await? {
            return Err(DraftError::Unauthorized(
                "Only the commissioner can start the draft".to_string(),
            ));
        }
        if league.draft_status != DraftStatus::NotStarted {
            return Err(DraftError::AlreadyStarted);
        }
        league.roster_layout.0.validate()?;

        let teams = self.store.teams(league_id).await?;
        if teams.len() < 2 {
            return Err(DraftError::InsufficientTeams(teams.len()));
        }

        let mut order: Vec<i64> = teams.iter().map(|t| t.id).collect();
        if self.settings.randomize_order {
            order.shuffle(&mut rng());
        }

        let now = Utc::now();
        self.store.begin_draft(league_id, &order, now).await?;
        info!("Draft started for league {} with {} teams", league_id, order.len());

        self.events.publish(
            league_id,
            DraftEvent::DraftStarted {
                league_id,
                team_count: order.len(),
                team_order: order.clone(),
                timestamp: now,
            },
        );

        let mut league = league;
        league.draft_status = DraftStatus::InProgress;
        league.team_order.0 = order.clone();
        league.draft_started_at = Some(now);
        set_position(&mut league, DraftPosition::FIRST);
        self.announce_turn(&league, &teams)?;

        Ok(DraftStarted {
            team_count: order.len(),
            team_order: order,
        })
    }

    pub async fn commit_pick(
        self: &Arc<Self>,
        league_id: i64,
        team_id: i64,
        asset_type: AssetType,
        asset_id: i64,
    ) -> Result<PickReceipt, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let league = self.load_league(league_id).await?;
        match league.draft_status {
            DraftStatus::NotStarted => return Err(DraftError::DraftNotInProgress),
            DraftStatus::Complete => {
                self.retire(league_id);
                return Err(DraftError::DraftAlreadyComplete);
            }
            DraftStatus::InProgress => {}
        }

        // A stuck draft gets closed here rather than answering with a turn error.
        if self.audit_locked(&league).await?.is_complete() {
            return Err(DraftError::DraftAlreadyComplete);
        }

        let session = league.session();
        let asset = match validator::validate(self.store.as_ref(), &session, team_id, asset_type, asset_id).await {
            Ok(asset) => asset,
            Err(e) => {
                if !e.is_retriable() && self.audit_locked(&league).await?.is_complete() {
                    return Err(DraftError::DraftAlreadyComplete);
                }
                info!("Rejected pick by team {} in league {}: {}", team_id, league_id, e);
                return Err(e);
            }
        };

        let turn = scheduler::current_turn(&session)?;
        let teams = self.store.teams(league_id).await?;
        let next = scheduler::step(session.position, session.team_count());

        let pick = DraftPick {
            league_id,
            pick_number: turn.pick_number,
            round: turn.round,
            team_id,
            asset_type,
            asset_id,
            picked_at: Utc::now(),
        };
        self.store.record_pick(&pick, &RosterEntry::drafted(&pick), next).await?;
        self.timers.cancel(league_id);

        info!(
            "League {} pick {}: team {} took {} #{} ({})",
            league_id, pick.pick_number, team_id, asset_type, asset_id, asset.name
        );
        self.events.publish(
            league_id,
            DraftEvent::PickMade {
                team_id,
                team_name: team_name(&teams, team_id),
                asset_type,
                asset_id,
                asset_name: asset.name.clone(),
                pick_number: pick.pick_number,
                round: pick.round,
            },
        );

        let mut league = league;
        set_position(&mut league, next);
        if let Err(e) = self.after_advance(&league, &teams).await {
            // The pick is durable; keep a clock running so the draft can't stall.
            error!("Pick {} in league {} committed but follow-up failed: {}", pick.pick_number, league_id, e);
            self.keep_clock_running(&league);
        }

        Ok(PickReceipt {
            asset_name: asset.name,
            pick_number: pick.pick_number,
            round: pick.round,
        })
    }

    /// Forced advance when the pick clock runs out. The slot is skipped, not
    /// filled. Returns false when the timer was stale.
    pub async fn expire_pick(self: &Arc<Self>, league_id: i64, armed_for_pick_number: i64) -> Result<bool, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let league = self.load_league(league_id).await?;
        match league.draft_status {
            DraftStatus::InProgress => {}
            DraftStatus::Complete => {
                self.retire(league_id);
                return Ok(false);
            }
            DraftStatus::NotStarted => return Ok(false),
        }
        if league.current_pick_number != armed_for_pick_number {
            debug!(
                "Ignoring stale clock for league {}: armed for pick {}, now at {}",
                league_id, armed_for_pick_number, league.current_pick_number
            );
            return Ok(false);
        }
        if self.audit_locked(&league).await?.is_complete() {
            return Ok(false);
        }

        let session = league.session();
        let turn = scheduler::current_turn(&session)?;
        let teams = self.store.teams(league_id).await?;
        let next = scheduler::step(session.position, session.team_count());
        self.store.advance(league_id, next).await?;

        warn!(
            "Team {} ran out of time on pick {} in league {}; slot skipped",
            turn.team_id, turn.pick_number, league_id
        );
        self.events.publish(
            league_id,
            DraftEvent::PickSkipped {
                team_id: turn.team_id,
                pick_number: turn.pick_number,
                round: turn.round,
            },
        );

        let mut league = league;
        set_position(&mut league, next);
        if let Err(e) = self.after_advance(&league, &teams).await {
            error!("Skipped pick {} in league {} but follow-up failed: {}", turn.pick_number, league_id, e);
            self.keep_clock_running(&league);
        }
        Ok(true)
    }

    /// Lock-free read of the last committed state. A draft that should be
    /// over but isn't marked yet is closed first, and a running draft that
    /// lost its clock gets a new one.
    pub async fn status(self: &Arc<Self>, league_id: i64) -> Result<DraftStatusView, DraftError> {
        let mut league = self.load_league(league_id).await?;
        if league.draft_status == DraftStatus::InProgress {
            let counts = self.store.roster_counts(league_id).await?;
            if auditor::is_complete(&league.session(), &counts) {
                self.force_completion_check(league_id).await?;
                league = self.load_league(league_id).await?;
            } else if !self.clock_matches(&league) {
                self.restore_clock(league_id).await?;
                league = self.load_league(league_id).await?;
            }
        }

        let session = league.session();
        Ok(DraftStatusView {
            league_id,
            status: league.draft_status,
            current_round: league.current_round,
            current_pick_number: league.current_pick_number,
            total_picks: session.total_picks(),
            team_order: session.team_order.clone(),
            on_the_clock: scheduler::current_turn(&session).ok(),
            next_turn: scheduler::next_turn(&session),
            timer: self.timers.snapshot(league_id),
        })
    }

    /// Idempotent repair hook. Returns whether the draft is complete.
    pub async fn force_completion_check(self: &Arc<Self>, league_id: i64) -> Result<bool, DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let league = self.load_league(league_id).await?;
        Ok(self.audit_locked(&league).await?.is_complete())
    }

    /// Re-arm the clock for the pick on the clock if no timer covers it.
    async fn restore_clock(self: &Arc<Self>, league_id: i64) -> Result<(), DraftError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().await;

        let league = self.load_league(league_id).await?;
        if league.draft_status != DraftStatus::InProgress || self.clock_matches(&league) {
            return Ok(());
        }
        if self.audit_locked(&league).await?.is_complete() {
            return Ok(());
        }

        warn!("League {} had no clock for pick {}; re-arming", league_id, league.current_pick_number);
        let teams = self.store.teams(league_id).await?;
        self.announce_turn(&league, &teams)?;
        Ok(())
    }

    fn clock_matches(&self, league: &League) -> bool {
        self.timers
            .snapshot(league.id)
            .is_some_and(|t| t.armed_for_pick_number == league.current_pick_number)
    }

    /// Fallback after a failed follow-up: arm a clock for the current pick
    /// unless one is already running. When it fires, `expire_pick` audits
    /// the draft again before doing anything else.
    fn keep_clock_running(self: &Arc<Self>, league: &League) {
        let pick_number = league.current_pick_number;
        let budget = league.pick_budget();
        let on_expire = self.on_clock_expiry(league.id, pick_number, budget);
        if self.timers.arm_if_idle(league.id, pick_number, budget, on_expire).is_some() {
            warn!("Re-armed clock for league {} pick {} after a failed follow-up", league.id, pick_number);
        }
    }

    /// Complete drafts never change again, so their lock and room can go.
    fn retire(&self, league_id: i64) {
        self.locks.remove(&league_id);
        self.events.release(league_id);
    }

    /// Re-arm clocks for drafts that were running when the process stopped.
    pub async fn resume_drafts(self: &Arc<Self>) -> Result<usize, DraftError> {
        let mut resumed = 0;
        for league_id in self.store.in_progress_leagues().await? {
            let lock = self.league_lock(league_id);
            let _guard = lock.lock().await;

            let league = self.load_league(league_id).await?;
            if league.draft_status != DraftStatus::InProgress {
                continue;
            }
            if self.audit_locked(&league).await?.is_complete() {
                continue;
            }

            let teams = self.store.teams(league_id).await?;
            self.announce_turn(&league, &teams)?;
            resumed += 1;
        }

        if resumed > 0 {
            info!("Resumed {} drafts in progress", resumed);
        }
        Ok(resumed)
    }

    /// Close the session if it should be closed. Caller holds the league lock.
    async fn audit_locked(&self, league: &League) -> Result<AuditOutcome, DraftError> {
        let session = league.session();
        let counts = match session.status {
            DraftStatus::InProgress => self.store.roster_counts(league.id).await?,
            _ => HashMap::new(),
        };

        let outcome = auditor::assess(&session, &counts);
        if outcome == AuditOutcome::AlreadyComplete {
            self.retire(league.id);
        }
        if outcome == AuditOutcome::JustCompleted {
            let now = Utc::now();
            self.store.mark_complete(league.id, now).await?;
            self.timers.cancel(league.id);
            info!("Draft complete for league {}", league.id);
            self.events.publish(
                league.id,
                DraftEvent::DraftCompleted {
                    league_id: league.id,
                    timestamp: now,
                },
            );
            self.retire(league.id);
        }
        Ok(outcome)
    }

    async fn after_advance(self: &Arc<Self>, league: &League, teams: &[Team]) -> Result<(), DraftError> {
        if self.audit_locked(league).await?.is_complete() {
            return Ok(());
        }
        self.announce_turn(league, teams)?;
        Ok(())
    }

    /// Arm the clock for the pick on the clock and tell everyone whose turn it is.
    fn announce_turn(self: &Arc<Self>, league: &League, teams: &[Team]) -> Result<TimerSnapshot, DraftError> {
        let turn = scheduler::current_turn(&league.session())?;
        let timer = self.arm_timer(league.id, turn.pick_number, league.pick_budget());

        self.events.publish(
            league.id,
            DraftEvent::NextTurn {
                team_id: turn.team_id,
                team_name: team_name(teams, turn.team_id),
                pick_number: turn.pick_number,
                round: turn.round,
                expires_at: Some(timer.expires_at),
            },
        );
        Ok(timer)
    }

    fn arm_timer(self: &Arc<Self>, league_id: i64, pick_number: i64, budget: Duration) -> TimerSnapshot {
        let on_expire = self.on_clock_expiry(league_id, pick_number, budget);
        self.timers.arm(league_id, pick_number, budget, on_expire)
    }

    fn on_clock_expiry(self: &Arc<Self>, league_id: i64, pick_number: i64, budget: Duration) -> BoxFuture<'static, ()> {
        let coordinator = Arc::downgrade(self);
        Box::pin(async move {
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            match coordinator.expire_pick(league_id, pick_number).await {
                Ok(true) => {}
                Ok(false) => debug!("Clock for league {} pick {} had nothing to do", league_id, pick_number),
                Err(e) if e.is_retriable() => {
                    error!("Failed to advance league {} after clock expiry, retrying: {}", league_id, e);
                    // A pick committed meanwhile has armed its own clock; leave that one alone.
                    let retry = coordinator.on_clock_expiry(league_id, pick_number, budget);
                    coordinator.timers.arm_if_idle(league_id, pick_number, budget, retry);
                }
                Err(e) => error!("Failed to advance league {} after clock expiry: {}", league_id, e),
            }
        })
    }
}

fn set_position(league: &mut League, position: DraftPosition) {
    league.current_round = position.round;
    league.current_pick_in_round = position.pick_in_round;
    league.current_pick_number = position.pick_number;
}

fn team_name(teams: &[Team], team_id: i64) -> String {
    teams
        .iter()
        .find(|t| t.id == team_id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "Unknown Team".to_string())
}
