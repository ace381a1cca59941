// ── Persistent controller list ──
//
// Only identities are persisted, never secrets or snapshots.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::ControllerIdentity;

/// Storage for the list of known controllers.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Empty when nothing has been saved yet.
    async fn load(&self) -> Result<Vec<ControllerIdentity>, CoreError>;

    /// Replace the stored list.
    async fn save(&self, controllers: &[ControllerIdentity]) -> Result<(), CoreError>;
}

/// Non-persistent store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStateStore {
    controllers: Mutex<Vec<ControllerIdentity>>,
}

impl MemoryStateStore {
    pub fn new(initial: Vec<ControllerIdentity>) -> Self {
        Self {
            controllers: Mutex::new(initial),
        }
    }

    pub fn snapshot(&self) -> Vec<ControllerIdentity> {
        self.controllers
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Vec<ControllerIdentity>, CoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, controllers: &[ControllerIdentity]) -> Result<(), CoreError> {
        let mut stored = self
            .controllers
            .lock()
            .map_err(|_| CoreError::StateStore {
                message: "memory store lock poisoned".into(),
            })?;
        *stored = controllers.to_vec();
        Ok(())
    }
}
