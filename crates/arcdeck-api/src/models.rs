// Command backend response types
//
// Wire models for controller config, endpoints, and resource registrations.
// Every response is wrapped in the `CommandOutput<T>` envelope. Fields use
// `#[serde(default)]` liberally because controller versions disagree about
// which fields are present.

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard command output envelope.
///
/// ```json
/// { "result": ..., "logs": [], "stdout": [], "stderr": [] }
/// ```
#[derive(Debug, Deserialize)]
pub struct CommandOutput<T> {
    pub result: T,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub stdout: Vec<String>,
    #[serde(default)]
    pub stderr: Vec<String>,
}

// ── Resource type ────────────────────────────────────────────────────

/// Kind of managed instance a registration describes.
///
/// Each variant is also a registration category: the backend lists
/// registrations one type at a time.
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
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ResourceType {
    PostgresInstances,
    SqlManagedInstances,
}

impl ResourceType {
    /// Every type the console knows how to list.
    pub const ALL: [ResourceType; 2] = [Self::PostgresInstances, Self::SqlManagedInstances];

    /// Human-friendly label for tree and table output.
    pub fn label(self) -> &'static str {
        match self {
            Self::PostgresInstances => "PostgreSQL server",
            Self::SqlManagedInstances => "SQL managed instance",
        }
    }
}

// ── Registration ─────────────────────────────────────────────────────

/// One managed instance as reported by the controller.
///
/// Identity fields are optional on the wire; the core drops entries that
/// arrive without an instance name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub instance_namespace: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub external_endpoint: Option<String>,
    #[serde(default)]
    pub v_cores: Option<String>,
    #[serde(default)]
    pub last_update_time: Option<String>,
    /// Catch-all for type-specific fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Controller config ────────────────────────────────────────────────

/// Data controller custom resource, trimmed to what the console shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfigRecord {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMetadata,
    #[serde(default)]
    pub spec: ControllerSpec,
    #[serde(default)]
    pub status: Option<ControllerStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSpec {
    #[serde(default)]
    pub infrastructure: Option<String>,
    #[serde(default)]
    pub cloud: Option<CloudSettings>,
}

/// Where the controller reports to and how it is connected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSettings {
    /// `direct` or `indirect`.
    #[serde(default)]
    pub connection_mode: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub resource_group: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub running_version: Option<String>,
}

// ── Endpoints ────────────────────────────────────────────────────────

/// A network endpoint exposed by the controller (management API,
/// metrics dashboard, log search, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub endpoint: String,
    #[serde(default)]
    pub protocol: Option<String>,
}
