//! Command backend boundary for arcdeck.
//!
//! Everything the console needs from a data controller goes through the
//! [`CommandBackend`] trait: log in, show the controller config, list its
//! network endpoints, and list resource registrations per
//! [`ResourceType`]. [`HttpBackend`] is the JSON-over-HTTP implementation
//! used by the CLI; tests substitute their own fakes.

pub mod backend;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod transport;

pub use backend::CommandBackend;
pub use error::Error;
pub use http::HttpBackend;
pub use models::{
    CloudSettings, CommandOutput, ControllerConfigRecord, ControllerSpec, ControllerStatus,
    EndpointRecord, ObjectMetadata, RegistrationRecord, ResourceType,
};
pub use session::Session;
pub use transport::{TlsMode, TransportConfig};
