// ── Resource tree node ──
//
// One node per registration, shared with the UI host as `Arc<ResourceNode>`.
// The registration is swapped in place on refresh, so the node object
// (and any cached connection it holds) survives for as long as the
// resource keeps appearing in the controller's list.

use std::sync::{Arc, OnceLock};

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::debug;

use crate::credential::CredentialKey;
use crate::model::{
    ConnectionProfile, ConnectionTarget, ControllerId, Registration, RegistrationKey,
    ResourceModel,
};

pub struct ResourceNode {
    key: RegistrationKey,
    controller: ControllerId,
    registration: ArcSwap<Registration>,
    /// Built on first use.
    model: OnceLock<ResourceModel>,
    connection: ArcSwapOption<ConnectionProfile>,
}

impl std::fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceNode")
            .field("key", &self.key)
            .field("controller", &self.controller)
            .field("state", &self.registration.load().state)
            .field("connected", &self.connection.load().is_some())
            .finish_non_exhaustive()
    }
}

impl ResourceNode {
    pub(crate) fn new(
        controller: ControllerId,
        key: RegistrationKey,
        registration: Registration,
    ) -> Self {
        Self {
            model: OnceLock::new(),
            key,
            controller,
            registration: ArcSwap::from_pointee(registration),
            connection: ArcSwapOption::empty(),
        }
    }

    pub fn key(&self) -> &RegistrationKey {
        &self.key
    }

    pub fn controller(&self) -> ControllerId {
        self.controller
    }

    pub fn name(&self) -> &str {
        &self.key.instance_name
    }

    /// The latest registration for this resource.
    pub fn registration(&self) -> Arc<Registration> {
        self.registration.load_full()
    }

    pub fn model(&self) -> &ResourceModel {
        self.model
            .get_or_init(|| ResourceModel::for_type(self.key.instance_type))
    }

    /// Swap in a newer registration. Returns `true` if anything changed.
    pub(crate) fn update_registration(&self, registration: Registration) -> bool {
        if **self.registration.load() == registration {
            return false;
        }
        self.registration.store(Arc::new(registration));
        true
    }

    pub fn state(&self) -> Option<String> {
        self.registration.load().state.clone()
    }

    /// Parsed external endpoint, if the resource is exposed.
    pub fn target(&self) -> Option<ConnectionTarget> {
        self.model().target(&self.registration.load())
    }

    /// Key under which this resource's own password is stored.
    pub fn credential_key(&self) -> CredentialKey {
        CredentialKey::resource(self.controller, self.key.instance_type, &self.key.instance_name)
    }

    // ── Cached connection ────────────────────────────────────────────

    pub fn connection(&self) -> Option<Arc<ConnectionProfile>> {
        self.connection.load_full()
    }

    pub fn set_connection(&self, profile: ConnectionProfile) {
        debug!(resource = %self.key, connection = %profile.connection_id, "connection cached");
        self.connection.store(Some(Arc::new(profile)));
    }

    /// Record a successful connection to this resource as `username`.
    pub fn connect_as(&self, username: Option<&str>) -> Option<Arc<ConnectionProfile>> {
        let target = self.target()?;
        let model = self.model();
        let server = model.server_string(&target);
        let username = username.unwrap_or_else(|| model.default_user());
        self.set_connection(ConnectionProfile::new(server, username));
        self.connection()
    }

    pub fn clear_connection(&self) -> Option<Arc<ConnectionProfile>> {
        self.connection.swap(None)
    }
}

impl Drop for ResourceNode {
    fn drop(&mut self) {
        if let Some(profile) = self.connection.swap(None) {
            debug!(
                resource = %self.key,
                connection = %profile.connection_id,
                "releasing cached connection"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcdeck_api::ResourceType;

    fn node(endpoint: Option<&str>) -> ResourceNode {
        let mut reg = Registration::new(ResourceType::SqlManagedInstances, "sql-1").with_state("Ready");
        reg.external_endpoint = endpoint.map(str::to_owned);
        let key = reg.key().expect("key");
        ResourceNode::new(ControllerId::generate(), key, reg)
    }

    #[test]
    fn identical_registration_is_not_an_update() {
        let n = node(None);
        let same = (*n.registration()).clone();
        assert!(!n.update_registration(same));

        let changed = (*n.registration()).clone().with_state("Updating");
        assert!(n.update_registration(changed));
        assert_eq!(n.state().as_deref(), Some("Updating"));
    }

    #[test]
    fn connect_uses_type_defaults() {
        let n = node(Some("10.1.1.1:31433"));
        let profile = n.connect_as(None).expect("connected");
        assert_eq!(profile.server, "10.1.1.1,31433");
        assert_eq!(profile.username, "sa");
        assert!(n.clear_connection().is_some());
        assert!(n.connection().is_none());
    }

    #[test]
    fn model_is_built_on_first_use() {
        let n = node(None);
        assert!(n.model.get().is_none());
        assert_eq!(n.model().default_user(), "sa");
        assert!(n.model.get().is_some());
    }

    #[test]
    fn unexposed_resource_cannot_connect() {
        let n = node(None);
        assert!(n.connect_as(Some("me")).is_none());
    }

    #[test]
    fn credential_key_includes_resource() {
        let n = node(None);
        assert!(
            n.credential_key()
                .as_str()
                .ends_with("::sqlManagedInstances::sql-1")
        );
    }
}
