use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use derivative::Derivative;
use log::info;

use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::session::GameSession;

/// Open game sessions by id. Each session sits behind its own lock, so
/// sessions can be driven from different threads independently.
#[derive(Derivative)]
#[derivative(Default)]
pub struct SessionManager {
    sessions: DashMap<String, Arc<Mutex<GameSession>>>,
    config: GameConfig,
}

impl SessionManager {
    pub fn new(config: GameConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// Opens a fresh session under `id`, replacing any session of that id.
    pub fn open(&self, id: impl Into<String>) -> Result<Arc<Mutex<GameSession>>> {
        let id = id.into();
        let session = Arc::new(Mutex::new(GameSession::new(self.config.clone())?));
        if self
            .sessions
            .insert(id.clone(), Arc::clone(&session))
            .is_some()
        {
            info!("Replaced game session {}", id);
        } else {
            info!("Opened game session {}", id);
        }
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Mutex<GameSession>>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Runs `f` with exclusive access to a session.
    pub fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut GameSession) -> Result<T>,
    ) -> Result<T> {
        let session = self.get(id)?;
        let mut guard = session.lock().map_err(|_| Error::LockPoisoned)?;
        f(&mut guard)
    }

    pub fn close(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!("Closed game session {}", id);
        }
        removed
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
