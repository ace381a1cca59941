// ── Resource registry ──
//
// Authoritative in-memory snapshot of one controller's remote state.
// One `watch` channel per category: subscribers see every replacement
// and can tell loading, loaded and failed apart. No network or
// credential knowledge lives here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::state::CategoryState;
use crate::error::CoreError;
use crate::model::{Category, ConfigSnapshot, EndpointList, RegistrationList, Snapshot};

pub struct ResourceRegistry {
    config: watch::Sender<CategoryState>,
    endpoints: watch::Sender<CategoryState>,
    registrations: watch::Sender<CategoryState>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            config: watch::channel(CategoryState::NotFetched).0,
            endpoints: watch::channel(CategoryState::NotFetched).0,
            registrations: watch::channel(CategoryState::NotFetched).0,
        }
    }

    fn cell(&self, category: Category) -> &watch::Sender<CategoryState> {
        match category {
            Category::Config => &self.config,
            Category::Endpoints => &self.endpoints,
            Category::Registrations => &self.registrations,
        }
    }

    /// Replace a category with a freshly fetched snapshot.
    pub fn update(&self, snapshot: Snapshot) -> DateTime<Utc> {
        let updated_at = Utc::now();
        // `send_replace` updates unconditionally, even with zero receivers.
        self.cell(snapshot.category()).send_replace(CategoryState::Loaded {
            snapshot,
            updated_at,
        });
        updated_at
    }

    /// Record a failed fetch. The previous value is kept as stale data.
    pub fn fail(&self, category: Category, error: CoreError) -> DateTime<Utc> {
        let updated_at = Utc::now();
        self.cell(category).send_modify(|state| {
            let stale = state.snapshot().cloned();
            *state = CategoryState::Failed {
                error,
                updated_at,
                stale,
            };
        });
        updated_at
    }

    pub fn get(&self, category: Category) -> CategoryState {
        self.cell(category).borrow().clone()
    }

    /// Change stream for one category.
    pub fn subscribe(&self, category: Category) -> watch::Receiver<CategoryState> {
        self.cell(category).subscribe()
    }

    /// Back to "not fetched" for every category.
    pub fn clear(&self) {
        for category in Category::ALL {
            self.cell(category).send_replace(CategoryState::NotFetched);
        }
    }

    // ── Typed accessors ─────────────────────────────────────────────

    pub fn config(&self) -> Option<Arc<ConfigSnapshot>> {
        match self.get(Category::Config).snapshot() {
            Some(Snapshot::Config(c)) => Some(Arc::clone(c)),
            _ => None,
        }
    }

    pub fn endpoints(&self) -> Option<Arc<EndpointList>> {
        match self.get(Category::Endpoints).snapshot() {
            Some(Snapshot::Endpoints(e)) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    pub fn registrations(&self) -> Option<Arc<RegistrationList>> {
        match self.get(Category::Registrations).snapshot() {
            Some(Snapshot::Registrations(r)) => Some(Arc::clone(r)),
            _ => None,
        }
    }
}
