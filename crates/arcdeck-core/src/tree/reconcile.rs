// ── Tree reconciliation ──
//
// Diffs a fresh registration list against the current child nodes by
// `(instanceType, instanceName)`. Nodes whose key survives are updated in
// place and reused; new keys get new nodes; vanished keys are dropped.
// Reconciliation never fails: malformed entries are skipped.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::node::ResourceNode;
use crate::model::{ControllerId, Registration, RegistrationKey};

/// Result of one reconciliation pass.
#[derive(Debug, Default, Clone)]
pub struct Reconciliation {
    /// The new child set, in incoming order.
    pub nodes: Vec<Arc<ResourceNode>>,
    pub added: Vec<RegistrationKey>,
    pub removed: Vec<RegistrationKey>,
    /// Reused nodes whose registration changed.
    pub updated: Vec<RegistrationKey>,
    /// Entries dropped for lack of an instance name.
    pub skipped: usize,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty())
    }
}

/// Pure reconciliation of `incoming` against `previous`.
pub fn reconcile(
    controller: ControllerId,
    previous: &[Arc<ResourceNode>],
    incoming: &[Registration],
) -> Reconciliation {
    let by_key: HashMap<&RegistrationKey, &Arc<ResourceNode>> =
        previous.iter().map(|n| (n.key(), n)).collect();

    let mut out = Reconciliation::default();
    let mut placed: HashMap<RegistrationKey, usize> = HashMap::with_capacity(incoming.len());
    let mut updated: HashSet<RegistrationKey> = HashSet::new();
    let mut fresh: HashSet<RegistrationKey> = HashSet::new();

    for registration in incoming {
        let Some(key) = registration.key() else {
            warn!(
                controller = %controller,
                instance_type = %registration.instance_type,
                "skipping registration without an instance name"
            );
            out.skipped += 1;
            continue;
        };

        if let Some(&idx) = placed.get(&key) {
            warn!(controller = %controller, resource = %key, "duplicate registration; later entry wins");
            if out.nodes[idx].update_registration(registration.clone()) && !fresh.contains(&key) {
                updated.insert(key);
            }
            continue;
        }

        let node = match by_key.get(&key) {
            Some(existing) => {
                if existing.update_registration(registration.clone()) {
                    updated.insert(key.clone());
                }
                Arc::clone(existing)
            }
            None => {
                fresh.insert(key.clone());
                out.added.push(key.clone());
                Arc::new(ResourceNode::new(controller, key.clone(), registration.clone()))
            }
        };
        placed.insert(key, out.nodes.len());
        out.nodes.push(node);
    }

    out.removed = previous
        .iter()
        .map(|n| n.key())
        .filter(|k| !placed.contains_key(*k))
        .cloned()
        .collect();

    // Report updates in display order.
    out.updated = out
        .nodes
        .iter()
        .map(|n| n.key())
        .filter(|k| updated.contains(*k))
        .cloned()
        .collect();

    debug!(
        controller = %controller,
        nodes = out.nodes.len(),
        added = out.added.len(),
        removed = out.removed.len(),
        updated = out.updated.len(),
        skipped = out.skipped,
        "reconciled resource tree"
    );
    out
}

/// Holds the current child set of one controller between passes.
pub struct TreeReconciler {
    controller: ControllerId,
    nodes: Mutex<Vec<Arc<ResourceNode>>>,
}

impl TreeReconciler {
    pub fn new(controller: ControllerId) -> Self {
        Self {
            controller,
            nodes: Mutex::new(Vec::new()),
        }
    }

    /// The node list stays usable after a panic elsewhere; every write
    /// replaces it wholesale.
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<ResourceNode>>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reconcile against the current set and make the result current.
    pub fn apply(&self, incoming: &[Registration]) -> Reconciliation {
        let mut nodes = self.lock();
        let result = reconcile(self.controller, &nodes, incoming);
        *nodes = result.nodes.clone();
        result
    }

    pub fn nodes(&self) -> Vec<Arc<ResourceNode>> {
        self.lock().clone()
    }

    pub fn find(&self, key: &RegistrationKey) -> Option<Arc<ResourceNode>> {
        self.lock().iter().find(|n| n.key() == key).cloned()
    }

    /// Drop every node. Returns how many were held.
    pub fn clear(&self) -> usize {
        let mut nodes = self.lock();
        let count = nodes.len();
        nodes.clear();
        count
    }
}
