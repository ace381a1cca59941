// ── Per-type resource models ──
//
// A closed set of variants, one per instance kind. The reconciler and
// registry only see the common `Registration` shape; anything that
// depends on the kind of database lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arcdeck_api::ResourceType;

use super::registration::Registration;

/// Where a resource can be reached, parsed from its external endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresModel {
    pub default_database: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlManagedInstanceModel {
    pub default_database: String,
}

/// Type-specific behavior for a resource node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceModel {
    Postgres(PostgresModel),
    SqlManagedInstance(SqlManagedInstanceModel),
}

impl ResourceModel {
    pub fn for_type(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::PostgresInstances => Self::Postgres(PostgresModel {
                default_database: "postgres".into(),
            }),
            ResourceType::SqlManagedInstances => {
                Self::SqlManagedInstance(SqlManagedInstanceModel {
                    default_database: "master".into(),
                })
            }
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Postgres(_) => ResourceType::PostgresInstances,
            Self::SqlManagedInstance(_) => ResourceType::SqlManagedInstances,
        }
    }

    pub fn default_user(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::SqlManagedInstance(_) => "sa",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres(_) => 5432,
            Self::SqlManagedInstance(_) => 1433,
        }
    }

    pub fn default_database(&self) -> &str {
        match self {
            Self::Postgres(m) => &m.default_database,
            Self::SqlManagedInstance(m) => &m.default_database,
        }
    }

    /// Parse the registration's external endpoint.
    ///
    /// Accepts `host`, `host:port`, `host,port` (SQL style) and
    /// `[v6]:port`. A missing port falls back to the type default.
    pub fn target(&self, registration: &Registration) -> Option<ConnectionTarget> {
        let raw = registration.external_endpoint.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let raw = raw
            .split_once("://")
            .map_or(raw, |(_, rest)| rest)
            .trim_end_matches('/');

        let (host, port) = if let Some(rest) = raw.strip_prefix('[') {
            let (host, tail) = rest.split_once(']')?;
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            (host, port)
        } else if let Some((host, port)) = raw.rsplit_once(',').or_else(|| raw.rsplit_once(':')) {
            (host, Some(port.trim().parse().ok()?))
        } else {
            (raw, None)
        };

        if host.is_empty() {
            return None;
        }
        Some(ConnectionTarget {
            host: host.to_owned(),
            port: port.unwrap_or_else(|| self.default_port()),
        })
    }

    /// Server string in the form the type's client tools expect.
    pub fn server_string(&self, target: &ConnectionTarget) -> String {
        match self {
            Self::Postgres(_) => format!("{}:{}", target.host, target.port),
            Self::SqlManagedInstance(_) => format!("{},{}", target.host, target.port),
        }
    }
}

// ── Cached connection ───────────────────────────────────────────────

/// The last successful connection made to a resource.
///
/// Held by the resource node so it survives refreshes that leave the
/// resource in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub server: String,
    pub username: String,
    pub connection_id: Uuid,
    pub established_at: DateTime<Utc>,
}

impl ConnectionProfile {
    pub fn new(server: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            connection_id: Uuid::new_v4(),
            established_at: Utc::now(),
        }
    }
}
