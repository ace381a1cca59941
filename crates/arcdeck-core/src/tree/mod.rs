// ── Resource tree ──

mod node;
mod reconcile;

pub use node::ResourceNode;
pub use reconcile::{Reconciliation, TreeReconciler, reconcile};
