//! Async front door for many concurrent battles
//!
//! Each session sits behind its own mutex, so one action is in flight per
//! battle while different battles proceed in parallel. Every change is
//! staged on a clone, persisted, and only then committed in memory.

use ahash::AHashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::battle::action::{ActionReport, ActionSubmission};
use crate::battle::ai::EnemyPolicy;
use crate::battle::outcome::BattleReport;
use crate::battle::session::BattleSession;
use crate::battle::setup::{BattleSetup, EnemySetup};
use crate::battle::snapshot::SessionSnapshot;
use crate::battle::store::SessionStore;
use crate::combat::catalog::CombatCatalog;
use crate::core::error::{CombatError, Result};
use crate::core::types::{BattleId, CombatantId, Timestamp};

/// Buffered end-of-battle reports per subscriber
const REPORT_CHANNEL_CAPACITY: usize = 64;

type SessionHandle = Arc<Mutex<BattleSession>>;

pub struct BattleService<S: SessionStore> {
    catalog: Arc<CombatCatalog>,
    store: Arc<S>,
    policy: Arc<dyn EnemyPolicy>,
    sessions: RwLock<AHashMap<BattleId, SessionHandle>>,
    reports: broadcast::Sender<BattleReport>,
}

impl<S: SessionStore> BattleService<S> {
    pub fn new(catalog: Arc<CombatCatalog>, store: Arc<S>, policy: Arc<dyn EnemyPolicy>) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            catalog,
            store,
            policy,
            sessions: RwLock::new(AHashMap::new()),
            reports,
        }
    }

    pub fn catalog(&self) -> &Arc<CombatCatalog> {
        &self.catalog
    }

    /// Reports for every battle that ends from now on
    pub fn subscribe(&self) -> broadcast::Receiver<BattleReport> {
        self.reports.subscribe()
    }

    /// Battles currently held in memory
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start a battle. AI actors ahead of the first human act immediately.
    pub async fn create(
        &self,
        setup: &BattleSetup,
        now: Timestamp,
    ) -> Result<(BattleId, Vec<ActionReport>)> {
        let mut session = BattleSession::new(setup, &self.catalog)?;
        let actions = session.run_ai_turns(self.policy.as_ref(), &self.catalog, now)?;
        let report = session.take_report(&self.catalog);
        self.persist(&session)?;

        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!("Battle {} registered", id);
        if let Some(report) = report {
            self.publish(report);
        }
        Ok((id, actions))
    }

    /// Apply one submission plus every AI action that follows it
    pub async fn submit(
        &self,
        id: BattleId,
        submission: &ActionSubmission,
        now: Timestamp,
    ) -> Result<Vec<ActionReport>> {
        self.transact(id, |staged, catalog, policy| {
            let mut actions = vec![staged.submit(submission, catalog, now)?];
            actions.extend(staged.run_ai_turns(policy, catalog, now)?);
            Ok(actions)
        })
        .await
    }

    /// Advance the turn timer; expiry passes and lets the AI respond
    pub async fn tick_timer(
        &self,
        id: BattleId,
        elapsed: u64,
        now: Timestamp,
    ) -> Result<Vec<ActionReport>> {
        self.transact(id, |staged, catalog, policy| {
            let mut actions: Vec<ActionReport> =
                staged.tick_timer(elapsed, catalog, now)?.into_iter().collect();
            if !actions.is_empty() {
                actions.extend(staged.run_ai_turns(policy, catalog, now)?);
            }
            Ok(actions)
        })
        .await
    }

    /// Reinforce the enemy side mid-battle
    pub async fn add_enemy(
        &self,
        id: BattleId,
        setup: &EnemySetup,
        now: Timestamp,
    ) -> Result<CombatantId> {
        self.transact(id, |staged, catalog, _| staged.add_enemy(setup, catalog, now))
            .await
    }

    pub async fn snapshot(
        &self,
        id: BattleId,
        viewer: Option<CombatantId>,
    ) -> Result<SessionSnapshot> {
        let handle = self.get_or_load(id).await?;
        let session = handle.lock().await;
        Ok(session.snapshot(viewer, &self.catalog))
    }

    /// Drop a battle from memory; the store still has it
    pub async fn evict(&self, id: BattleId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Run `change` on a clone, persist it, then commit and publish
    async fn transact<T, F>(&self, id: BattleId, change: F) -> Result<T>
    where
        F: FnOnce(&mut BattleSession, &CombatCatalog, &dyn EnemyPolicy) -> Result<T>,
    {
        let handle = self.get_or_load(id).await?;
        let mut session = handle.lock().await;

        let mut staged = session.clone();
        let value = change(&mut staged, &self.catalog, self.policy.as_ref())?;
        let report = staged.take_report(&self.catalog);
        self.persist(&staged)?;

        *session = staged;
        if let Some(report) = report {
            self.publish(report);
        }
        Ok(value)
    }

    fn persist(&self, session: &BattleSession) -> Result<()> {
        self.store.save(session).map_err(|e| {
            warn!("Battle {}: save failed, change discarded: {}", session.id(), e);
            e
        })
    }

    fn publish(&self, report: BattleReport) {
        let battle = report.battle_id;
        if self.reports.send(report).is_err() {
            debug!("Battle {} report had no subscribers", battle);
        }
    }

    async fn get_or_load(&self, id: BattleId) -> Result<SessionHandle> {
        if let Some(handle) = self.sessions.read().await.get(&id) {
            return Ok(handle.clone());
        }
        let loaded = self
            .store
            .load(id, &self.catalog)?
            .ok_or(CombatError::BattleNotFound(id))?;
        let mut sessions = self.sessions.write().await;
        let handle = sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(loaded)))
            .clone();
        Ok(handle)
    }
}
