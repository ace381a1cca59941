// ── Change notification ──
//
// One broadcast channel per controller relays category updates and tree
// changes to the UI host. There is no global bus: a host subscribes to
// each controller it displays.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::CoreError;
use crate::model::{Category, ControllerId, RegistrationKey, Snapshot};
use crate::tree::{Reconciliation, ResourceNode};

/// Something the UI host should re-render.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// A category fetch completed. `outcome` is the error marker on failure.
    CategoryUpdated {
        controller: ControllerId,
        category: Category,
        outcome: Result<Snapshot, CoreError>,
        timestamp: DateTime<Utc>,
    },
    /// The resource tree under a controller changed.
    TreeChanged {
        controller: ControllerId,
        nodes: Vec<Arc<ResourceNode>>,
        added: Vec<RegistrationKey>,
        removed: Vec<RegistrationKey>,
        updated: Vec<RegistrationKey>,
        timestamp: DateTime<Utc>,
    },
}

impl ConsoleEvent {
    pub fn controller(&self) -> ControllerId {
        match self {
            Self::CategoryUpdated { controller, .. } | Self::TreeChanged { controller, .. } => {
                *controller
            }
        }
    }
}

pub struct ChangeNotifier {
    controller: ControllerId,
    tx: broadcast::Sender<Arc<ConsoleEvent>>,
}

impl ChangeNotifier {
    pub fn new(controller: ControllerId, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { controller, tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ConsoleEvent>> {
        self.tx.subscribe()
    }

    pub fn category_updated(
        &self,
        category: Category,
        outcome: Result<Snapshot, CoreError>,
        timestamp: DateTime<Utc>,
    ) {
        self.publish(ConsoleEvent::CategoryUpdated {
            controller: self.controller,
            category,
            outcome,
            timestamp,
        });
    }

    /// Publish a tree change. No-op if the reconciliation changed nothing.
    pub fn tree_changed(&self, reconciliation: &Reconciliation) -> bool {
        if !reconciliation.changed() {
            return false;
        }
        self.publish(ConsoleEvent::TreeChanged {
            controller: self.controller,
            nodes: reconciliation.nodes.clone(),
            added: reconciliation.added.clone(),
            removed: reconciliation.removed.clone(),
            updated: reconciliation.updated.clone(),
            timestamp: Utc::now(),
        });
        true
    }

    fn publish(&self, event: ConsoleEvent) {
        // No subscribers is fine; the registry still holds the state.
        if self.tx.send(Arc::new(event)).is_err() {
            trace!(controller = %self.controller, "event dropped: no subscribers");
        }
    }
}
