// ── API-to-domain type conversions ──
//
// Bridges raw `arcdeck_api` wire records into `arcdeck_core::model`
// domain types. Blank strings are normalized to `None`.

use arcdeck_api::{ControllerConfigRecord, EndpointRecord, RegistrationRecord, ResourceType};
use tracing::debug;

use crate::model::{ConfigSnapshot, Endpoint, Registration};

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

// ── Config ─────────────────────────────────────────────────────────

impl From<ControllerConfigRecord> for ConfigSnapshot {
    fn from(r: ControllerConfigRecord) -> Self {
        let cloud = r.spec.cloud.unwrap_or_default();
        let status = r.status.unwrap_or_default();
        Self {
            name: non_empty(r.metadata.name),
            namespace: non_empty(r.metadata.namespace),
            uid: non_empty(r.metadata.uid),
            infrastructure: non_empty(r.spec.infrastructure),
            connection_mode: non_empty(cloud.connection_mode),
            location: non_empty(cloud.location),
            resource_group: non_empty(cloud.resource_group),
            subscription: non_empty(cloud.subscription),
            state: non_empty(status.state),
            running_version: non_empty(status.running_version),
        }
    }
}

// ── Endpoints ──────────────────────────────────────────────────────

impl From<EndpointRecord> for Endpoint {
    fn from(r: EndpointRecord) -> Self {
        Self {
            name: r.name,
            description: non_empty(r.description),
            endpoint: r.endpoint,
            protocol: non_empty(r.protocol),
        }
    }
}

// ── Registrations ──────────────────────────────────────────────────

/// Convert a registration fetched for `fetched_as`.
///
/// The record's own `instanceType` wins when it parses; otherwise the
/// category it was listed under is used. A missing instance name is kept
/// as an empty string so the reconciler can report and skip it.
pub(crate) fn registration(record: RegistrationRecord, fetched_as: ResourceType) -> Registration {
    let instance_type = match record.instance_type.as_deref() {
        Some(raw) => raw.parse::<ResourceType>().unwrap_or_else(|_| {
            debug!(instance_type = raw, fallback = %fetched_as, "unrecognized instance type");
            fetched_as
        }),
        None => fetched_as,
    };

    Registration {
        instance_name: record.instance_name.unwrap_or_default(),
        instance_type,
        state: non_empty(record.state),
        namespace: non_empty(record.instance_namespace),
        external_endpoint: non_empty(record.external_endpoint),
        vcores: non_empty(record.v_cores),
        last_updated: non_empty(record.last_update_time),
        extra: record.extra,
    }
}
