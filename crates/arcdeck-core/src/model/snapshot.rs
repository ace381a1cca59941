// ── Per-category snapshots ──
//
// Each category of remote state is fetched, stored and announced on its
// own. `Snapshot` is the tagged union the registry and the event stream
// carry around.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::registration::Registration;

// ── Category ────────────────────────────────────────────────────────

/// A refreshable slice of a controller's remote state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Config,
    Endpoints,
    Registrations,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Config, Self::Endpoints, Self::Registrations];
}

// ── Config ──────────────────────────────────────────────────────────

/// Data controller configuration, flattened for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub uid: Option<String>,
    pub infrastructure: Option<String>,
    /// `direct` or `indirect`.
    pub connection_mode: Option<String>,
    pub location: Option<String>,
    pub resource_group: Option<String>,
    pub subscription: Option<String>,
    pub state: Option<String>,
    pub running_version: Option<String>,
}

// ── Endpoints ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub description: Option<String>,
    pub endpoint: String,
    pub protocol: Option<String>,
}

pub type EndpointList = Vec<Endpoint>;

/// The merged registrations of every resource type.
pub type RegistrationList = Vec<Registration>;

// ── Snapshot ────────────────────────────────────────────────────────

/// A successfully fetched category value.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Config(Arc<ConfigSnapshot>),
    Endpoints(Arc<EndpointList>),
    Registrations(Arc<RegistrationList>),
}

impl Snapshot {
    pub fn category(&self) -> Category {
        match self {
            Self::Config(_) => Category::Config,
            Self::Endpoints(_) => Category::Endpoints,
            Self::Registrations(_) => Category::Registrations,
        }
    }

    /// Short human summary, e.g. `"3 endpoints"`.
    pub fn summary(&self) -> String {
        match self {
            Self::Config(c) => c
                .name
                .as_deref()
                .map_or_else(|| "config".to_owned(), |n| format!("config '{n}'")),
            Self::Endpoints(e) => format!("{} endpoints", e.len()),
            Self::Registrations(r) => format!("{} registrations", r.len()),
        }
    }
}
