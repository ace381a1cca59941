// ── Domain model ──

pub mod identity;
pub mod registration;
pub mod resource;
pub mod snapshot;

pub use identity::{ControllerId, ControllerIdentity};
pub use registration::{Registration, RegistrationKey};
pub use resource::{
    ConnectionProfile, ConnectionTarget, PostgresModel, ResourceModel, SqlManagedInstanceModel,
};
pub use snapshot::{Category, ConfigSnapshot, Endpoint, EndpointList, RegistrationList, Snapshot};
