// ── Registration domain type ──

use std::fmt;

use arcdeck_api::ResourceType;
use serde::{Deserialize, Serialize};

/// One managed resource instance reported by a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub instance_name: String,
    pub instance_type: ResourceType,
    pub state: Option<String>,
    pub namespace: Option<String>,
    /// `host:port` the instance is reachable at, if exposed.
    pub external_endpoint: Option<String>,
    pub vcores: Option<String>,
    pub last_updated: Option<String>,
    /// Type-specific fields the console does not interpret.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Registration {
    /// Minimal registration, mostly useful for building fixtures.
    pub fn new(instance_type: ResourceType, instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            instance_type,
            state: None,
            namespace: None,
            external_endpoint: None,
            vcores: None,
            last_updated: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.external_endpoint = Some(endpoint.into());
        self
    }

    /// Identity key, or `None` if the entry is missing its instance name.
    pub fn key(&self) -> Option<RegistrationKey> {
        let name = self.instance_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(RegistrationKey::new(self.instance_type, name))
        }
    }
}

// ── RegistrationKey ─────────────────────────────────────────────────

/// `(instanceType, instanceName)`, unique within a controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationKey {
    pub instance_type: ResourceType,
    pub instance_name: String,
}

impl RegistrationKey {
    pub fn new(instance_type: ResourceType, instance_name: impl Into<String>) -> Self {
        Self {
            instance_type,
            instance_name: instance_name.into(),
        }
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instance_type, self.instance_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_has_no_key() {
        let reg = Registration::new(ResourceType::PostgresInstances, "  ");
        assert!(reg.key().is_none());
    }

    #[test]
    fn key_distinguishes_types() {
        let pg = Registration::new(ResourceType::PostgresInstances, "orders");
        let sql = Registration::new(ResourceType::SqlManagedInstances, "orders");
        assert_ne!(pg.key(), sql.key());
        assert_eq!(
            pg.key().map(|k| k.to_string()).as_deref(),
            Some("postgresInstances/orders")
        );
    }
}
