// ── Reactive per-controller state ──

mod registry;
mod state;

pub use registry::ResourceRegistry;
pub use state::CategoryState;
