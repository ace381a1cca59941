// JSON-over-HTTP command backend.

mod auth;
mod client;
mod resources;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

pub use client::HttpBackend;

use crate::backend::CommandBackend;
use crate::error::Error;
use crate::models::{ControllerConfigRecord, EndpointRecord, RegistrationRecord, ResourceType};
use crate::session::Session;

#[async_trait]
impl CommandBackend for HttpBackend {
    async fn login(
        &self,
        endpoint: &Url,
        namespace: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, Error> {
        self.login_inner(endpoint, namespace, username, password)
            .await
    }

    async fn show_config(&self, session: &Session) -> Result<ControllerConfigRecord, Error> {
        self.show_config_inner(session).await
    }

    async fn list_endpoints(&self, session: &Session) -> Result<Vec<EndpointRecord>, Error> {
        self.list_endpoints_inner(session).await
    }

    async fn list_registrations(
        &self,
        session: &Session,
        resource_type: ResourceType,
    ) -> Result<Vec<RegistrationRecord>, Error> {
        self.list_registrations_inner(session, resource_type).await
    }

    async fn logout(&self, session: &Session) -> Result<(), Error> {
        self.logout_inner(session).await
    }
}
