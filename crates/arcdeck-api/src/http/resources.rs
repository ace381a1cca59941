// Controller resource endpoints: config, endpoints, registrations.

use super::client::HttpBackend;
use crate::error::Error;
use crate::models::{ControllerConfigRecord, EndpointRecord, RegistrationRecord, ResourceType};
use crate::session::Session;

impl HttpBackend {
    /// `GET namespaces/{ns}/config`
    pub(crate) async fn show_config_inner(
        &self,
        session: &Session,
    ) -> Result<ControllerConfigRecord, Error> {
        let url = Self::namespace_url(session, "config")?;
        self.get(session, url, "controller config").await
    }

    /// `GET namespaces/{ns}/endpoints`
    pub(crate) async fn list_endpoints_inner(
        &self,
        session: &Session,
    ) -> Result<Vec<EndpointRecord>, Error> {
        let url = Self::namespace_url(session, "endpoints")?;
        self.get(session, url, "controller endpoints").await
    }

    /// `GET namespaces/{ns}/registrations?type={resource_type}`
    pub(crate) async fn list_registrations_inner(
        &self,
        session: &Session,
        resource_type: ResourceType,
    ) -> Result<Vec<RegistrationRecord>, Error> {
        let mut url = Self::namespace_url(session, "registrations")?;
        url.query_pairs_mut()
            .append_pair("type", resource_type.as_ref());
        self.get(session, url, "registrations").await
    }
}
