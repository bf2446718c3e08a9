//! Session persistence
//!
//! Sessions are stored as JSON. Loading always re-runs the integrity check,
//! so a tampered or truncated save surfaces as `CorruptState`.

use ahash::AHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::battle::session::BattleSession;
use crate::combat::catalog::CombatCatalog;
use crate::core::error::{CombatError, Result};
use crate::core::types::BattleId;

/// Where committed sessions live
pub trait SessionStore: Send + Sync {
    fn save(&self, session: &BattleSession) -> Result<()>;

    fn load(&self, id: BattleId, catalog: &CombatCatalog) -> Result<Option<BattleSession>>;
}

/// In-process store, keeps the serialized form
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<AHashMap<BattleId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, session: &BattleSession) -> Result<()> {
        let json = session.to_json()?;
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| CombatError::Store("memory store lock poisoned".into()))?;
        sessions.insert(session.id(), json);
        Ok(())
    }

    fn load(&self, id: BattleId, catalog: &CombatCatalog) -> Result<Option<BattleSession>> {
        let json = {
            let sessions = self
                .sessions
                .lock()
                .map_err(|_| CombatError::Store("memory store lock poisoned".into()))?;
            sessions.get(&id).cloned()
        };
        json.map(|j| BattleSession::from_json(&j, catalog)).transpose()
    }
}

/// One `{id}.json` file per session
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: BattleId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl SessionStore for JsonDirStore {
    /// Write to a temp file and rename, so a crash never leaves half a save
    fn save(&self, session: &BattleSession) -> Result<()> {
        let path = self.path_for(session.id());
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, session.to_json()?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, id: BattleId, catalog: &CombatCatalog) -> Result<Option<BattleSession>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        BattleSession::from_json(&json, catalog).map(Some)
    }
}
