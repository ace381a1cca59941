// ── Command backend contract ──
//
// The core never talks HTTP (or spawns processes) itself. Everything it
// needs from a controller goes through this trait, keyed by a `Session`.

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::models::{ControllerConfigRecord, EndpointRecord, RegistrationRecord, ResourceType};
use crate::session::Session;

/// Operations the console issues against a controller.
///
/// All calls except [`login`](Self::login) are scoped to a session. An
/// authorization failure is reported as [`Error::Authentication`] or
/// [`Error::SessionExpired`], distinguishable from [`Error::NotFound`].
#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Authenticate against the controller at `endpoint` / `namespace`.
    async fn login(
        &self,
        endpoint: &Url,
        namespace: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, Error>;

    /// Show the data controller's own configuration.
    async fn show_config(&self, session: &Session) -> Result<ControllerConfigRecord, Error>;

    /// List the controller's network endpoints.
    async fn list_endpoints(&self, session: &Session) -> Result<Vec<EndpointRecord>, Error>;

    /// List resource registrations of a single type.
    async fn list_registrations(
        &self,
        session: &Session,
        resource_type: ResourceType,
    ) -> Result<Vec<RegistrationRecord>, Error>;

    /// End a session. Backends without server-side sessions need not
    /// override this.
    async fn logout(&self, _session: &Session) -> Result<(), Error> {
        Ok(())
    }
}
