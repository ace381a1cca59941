//! Live mirror of data controllers for arcdeck UI hosts.
//!
//! This crate keeps an in-memory view of each known controller (config,
//! endpoints, and the registrations of its managed database instances)
//! fresh, and drives a resource tree whose nodes keep their identity
//! across refreshes:
//!
//! - **[`Console`]**: facade a UI host talks to. Adds, edits and removes
//!   controllers, refreshes them (on demand or periodically), and hands
//!   out per-controller event subscriptions.
//!
//! - **[`SessionManager`]** / **[`CredentialBroker`]**: one session per
//!   controller; passwords come from a [`CredentialStore`] or an
//!   interactive [`PasswordPrompt`], with a single re-prompt after a
//!   rejected login.
//!
//! - **[`RefreshCoordinator`]**: single-flight refresh per controller.
//!   Categories are fetched concurrently and settle independently.
//!
//! - **[`ResourceRegistry`]**: per-category `watch` channels holding
//!   [`CategoryState`] (not fetched / loaded / failed).
//!
//! - **[`TreeReconciler`]**: key-based diff of registrations against
//!   existing [`ResourceNode`]s, updating survivors in place.
//!
//! - **[`ChangeNotifier`]**: per-controller broadcast of [`ConsoleEvent`]s.
//!
//! File, keyring and terminal I/O live in the UI host; this crate only
//! sees the [`CredentialStore`], [`PasswordPrompt`] and [`StateStore`]
//! traits.

pub mod config;
pub mod controller;
pub mod convert;
pub mod credential;
pub mod error;
pub mod model;
pub mod notify;
pub mod persist;
pub mod refresh;
pub mod session;
pub mod store;
pub mod tree;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConsoleSettings;
pub use controller::{Console, ControllerHandle, ControllerUpdate, NewController};
pub use credential::{
    CredentialBroker, CredentialKey, CredentialStore, MemoryCredentialStore, PasswordPrompt,
    PromptReason, PromptRequest,
};
pub use error::CoreError;
pub use notify::{ChangeNotifier, ConsoleEvent};
pub use persist::{MemoryStateStore, StateStore};
pub use refresh::{CategoryReport, RefreshCoordinator, RefreshReport, TreeSummary, TypeReport};
pub use session::{SessionManager, SessionState};
pub use store::{CategoryState, ResourceRegistry};
pub use tree::{Reconciliation, ResourceNode, TreeReconciler};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Category, ConfigSnapshot, ConnectionProfile, ConnectionTarget, ControllerId,
    ControllerIdentity, Endpoint, EndpointList, Registration, RegistrationKey, RegistrationList,
    ResourceModel, Snapshot,
};

pub use arcdeck_api::ResourceType;
