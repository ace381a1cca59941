// ── Session management ──
//
// Turns a controller identity plus a password into an authenticated
// backend session. Holds at most one session per controller, in memory
// only. A rejected password is retried exactly once, through a fresh
// interactive prompt.

use std::sync::Arc;

use dashmap::DashMap;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use arcdeck_api::{CommandBackend, Session};

use crate::credential::{
    CredentialBroker, CredentialKey, PasswordSource, PromptReason, ResolveOptions,
    ResolvedPassword,
};
use crate::error::CoreError;
use crate::model::{ControllerId, ControllerIdentity};

/// Authentication state of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NoSession,
    Authenticating,
    Authenticated,
    Failed {
        message: String,
    },
}

/// Owns the sessions of every controller.
pub struct SessionManager {
    backend: Arc<dyn CommandBackend>,
    broker: Arc<CredentialBroker>,
    interactive: bool,
    sessions: DashMap<ControllerId, Session>,
    states: DashMap<ControllerId, SessionState>,
    /// Serializes logins per controller so two callers never prompt twice.
    login_locks: DashMap<ControllerId, Arc<Mutex<()>>>,
    /// Last password that produced a session in this process. Only read
    /// back for controllers that remember their password.
    passwords: DashMap<ControllerId, SecretString>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn CommandBackend>,
        broker: Arc<CredentialBroker>,
        interactive: bool,
    ) -> Self {
        Self {
            backend,
            broker,
            interactive,
            sessions: DashMap::new(),
            states: DashMap::new(),
            login_locks: DashMap::new(),
            passwords: DashMap::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn CommandBackend> {
        &self.backend
    }

    pub fn broker(&self) -> &Arc<CredentialBroker> {
        &self.broker
    }

    /// Return the current session, logging in if there is none.
    ///
    /// With `force_reprompt` the existing session and any remembered
    /// password are ignored and the user is asked again.
    pub async fn login(
        &self,
        identity: &ControllerIdentity,
        force_reprompt: bool,
    ) -> Result<Session, CoreError> {
        let reason = if force_reprompt {
            PromptReason::Reauthenticate
        } else {
            PromptReason::MissingPassword
        };
        self.login_with(identity, force_reprompt, reason).await
    }

    /// First login for a controller that is being added: always prompts,
    /// with confirmation.
    pub(crate) async fn connect_new(
        &self,
        identity: &ControllerIdentity,
    ) -> Result<Session, CoreError> {
        self.login_with(identity, true, PromptReason::FirstConnect)
            .await
    }

    async fn login_with(
        &self,
        identity: &ControllerIdentity,
        force_reprompt: bool,
        first_reason: PromptReason,
    ) -> Result<Session, CoreError> {
        let id = identity.id;
        if !force_reprompt {
            if let Some(session) = self.session_for(identity) {
                return Ok(session);
            }
        }

        let lock = Arc::clone(self.login_locks.entry(id).or_default().value());
        let _guard = lock.lock().await;

        // Another caller may have logged in while we waited.
        if !force_reprompt {
            if let Some(session) = self.session_for(identity) {
                return Ok(session);
            }
        }

        self.states.insert(id, SessionState::Authenticating);
        let result = self.authenticate(identity, force_reprompt, first_reason).await;
        match &result {
            Ok(_) => {
                self.states.insert(id, SessionState::Authenticated);
            }
            Err(CoreError::UserCancelled) => {
                self.states.insert(id, SessionState::NoSession);
            }
            Err(e) => {
                self.states.insert(
                    id,
                    SessionState::Failed {
                        message: e.to_string(),
                    },
                );
            }
        }
        result
    }

    async fn authenticate(
        &self,
        identity: &ControllerIdentity,
        force_reprompt: bool,
        first_reason: PromptReason,
    ) -> Result<Session, CoreError> {
        let id = identity.id;
        let controller = identity.display_name();
        let mut reprompted = false;

        loop {
            let cached = if force_reprompt || reprompted || !identity.remember_password {
                None
            } else {
                self.passwords.get(&id).map(|p| p.value().clone())
            };

            let (secret, source) = match cached {
                Some(secret) => (secret, PasswordSource::Store),
                None => {
                    let options = ResolveOptions {
                        allow_interactive: self.interactive,
                        use_stored: identity.remember_password && !force_reprompt && !reprompted,
                        reason: if reprompted {
                            PromptReason::Reauthenticate
                        } else {
                            first_reason
                        },
                    };
                    match self.broker.resolve_password(identity, options).await? {
                        ResolvedPassword::Password { secret, source } => (secret, source),
                        ResolvedPassword::UserCancelled => {
                            debug!(controller = %id, "login cancelled by user");
                            return Err(CoreError::UserCancelled);
                        }
                        ResolvedPassword::NotFound => {
                            return Err(CoreError::NoCredentials { controller });
                        }
                    }
                }
            };

            debug!(controller = %id, url = %identity.url, "logging in");
            match self
                .backend
                .login(&identity.url, &identity.namespace, &identity.username, &secret)
                .await
            {
                Ok(session) => {
                    info!(controller = %id, "authenticated");
                    self.sessions.insert(id, session.clone());
                    if identity.remember_password && source == PasswordSource::Prompt {
                        let key = CredentialKey::controller(id);
                        if let Err(e) = self.broker.store_password(&key, &secret).await {
                            warn!(controller = %id, error = %e, "could not remember password");
                        }
                    }
                    self.passwords.insert(id, secret);
                    return Ok(session);
                }
                Err(e) if e.is_auth_rejected() => {
                    self.passwords.remove(&id);
                    let can_retry = !reprompted && self.interactive && self.broker.can_prompt();
                    warn!(controller = %id, error = %e, retry = can_retry, "login rejected");
                    if !can_retry {
                        return Err(CoreError::AuthenticationFailed {
                            controller,
                            message: e.to_string(),
                        });
                    }
                    reprompted = true;
                }
                Err(e) => {
                    warn!(controller = %id, error = %e, "login failed");
                    return Err(CoreError::from(e));
                }
            }
        }
    }

    /// Current session, if any. Never touches the network.
    pub fn session(&self, id: ControllerId) -> Option<Session> {
        self.sessions.get(&id).map(|s| s.value().clone())
    }

    /// The held session, if it was issued for this identity's endpoint.
    fn session_for(&self, identity: &ControllerIdentity) -> Option<Session> {
        let session = self.session(identity.id)?;
        let issued_for_identity = *session.endpoint() == identity.url
            && session.namespace() == identity.namespace
            && session.username() == identity.username;
        if !issued_for_identity {
            debug!(controller = %identity.id, "held session belongs to a previous endpoint");
        }
        issued_for_identity.then_some(session)
    }

    pub fn state(&self, id: ControllerId) -> SessionState {
        self.states
            .get(&id)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Drop the session so the next refresh logs in again.
    pub fn invalidate(&self, id: ControllerId) {
        if self.sessions.remove(&id).is_some() {
            debug!(controller = %id, "session invalidated");
        }
        self.states.insert(id, SessionState::NoSession);
    }

    /// Invalidate and end the session on the controller. Failures are
    /// logged only.
    pub async fn logout(&self, id: ControllerId) {
        let session = self.sessions.remove(&id).map(|(_, s)| s);
        self.states.insert(id, SessionState::NoSession);
        if let Some(session) = session {
            if let Err(e) = self.backend.logout(&session).await {
                warn!(controller = %id, error = %e, "logout failed");
            }
        }
    }

    /// Forget everything held for `id`, including the in-memory password.
    pub fn forget(&self, id: ControllerId) {
        self.sessions.remove(&id);
        self.states.remove(&id);
        self.passwords.remove(&id);
        self.login_locks.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credential::{CredentialStore, MemoryCredentialStore};
    use crate::credential::tests::{ScriptedPrompt, identity};
    use crate::testing::FakeBackend;
    use secrecy::ExposeSecret;

    struct Harness {
        backend: Arc<FakeBackend>,
        store: Arc<MemoryCredentialStore>,
        prompt: Arc<ScriptedPrompt>,
        manager: SessionManager,
    }

    fn harness(answers: Vec<Option<&'static str>>, interactive: bool) -> Harness {
        let backend = Arc::new(FakeBackend::new("correct"));
        let store = Arc::new(MemoryCredentialStore::new());
        let prompt = Arc::new(ScriptedPrompt::new(answers));
        let broker = Arc::new(CredentialBroker::new(store.clone(), Some(prompt.clone())));
        let manager = SessionManager::new(backend.clone(), broker, interactive);
        Harness {
            backend,
            store,
            prompt,
            manager,
        }
    }

    #[tokio::test]
    async fn existing_session_is_reused_without_network() {
        let h = harness(vec![Some("correct")], true);
        let id = identity(false);

        let first = h.manager.login(&id, false).await.unwrap();
        let second = h.manager.login(&id, false).await.unwrap();

        assert!(first.same_as(&second));
        assert_eq!(h.backend.logins(), 1);
        assert_eq!(h.manager.state(id.id), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn remembered_password_is_written_after_success() {
        let h = harness(vec![Some("correct")], true);
        let id = identity(true);

        h.manager.login(&id, false).await.unwrap();

        let key = CredentialKey::controller(id.id);
        assert!(h.store.contains(&key));
    }

    #[tokio::test]
    async fn unremembered_password_is_not_stored() {
        let h = harness(vec![Some("correct")], true);
        let id = identity(false);
        h.manager.login(&id, false).await.unwrap();
        assert!(!h.store.contains(&CredentialKey::controller(id.id)));
    }

    #[tokio::test]
    async fn stale_stored_password_triggers_one_reprompt() {
        let h = harness(vec![Some("correct")], true);
        let id = identity(true);
        let key = CredentialKey::controller(id.id);
        h.manager
            .broker()
            .store_password(&key, &SecretString::from("stale"))
            .await
            .unwrap();

        h.manager.login(&id, false).await.unwrap();

        assert_eq!(h.backend.logins(), 2);
        assert_eq!(h.prompt.calls(), 1);
        let stored = h.store.read(&key).await.unwrap().unwrap();
        assert_eq!(stored.expose_secret(), "correct");
    }

    #[tokio::test]
    async fn second_rejection_is_authentication_failure() {
        let h = harness(vec![Some("wrong"), Some("also-wrong"), Some("correct")], true);
        let id = identity(false);

        let err = h.manager.login(&id, false).await.unwrap_err();

        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(h.backend.logins(), 2);
        assert_eq!(h.prompt.calls(), 2);
        assert!(matches!(h.manager.state(id.id), SessionState::Failed { .. }));
    }

    #[tokio::test]
    async fn rejected_then_cancelled_is_user_cancelled() {
        let h = harness(vec![None], true);
        let id = identity(true);
        h.manager
            .broker()
            .store_password(&CredentialKey::controller(id.id), &SecretString::from("stale"))
            .await
            .unwrap();

        let err = h.manager.login(&id, false).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(h.backend.logins(), 1);
        assert_eq!(h.manager.state(id.id), SessionState::NoSession);
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let h = harness(vec![Some("correct"), Some("correct")], true);
        h.backend.fail_login_transport(true);
        let id = identity(false);

        let err = h.manager.login(&id, false).await.unwrap_err();

        assert!(!err.is_auth_failure());
        assert_eq!(h.backend.logins(), 1);
        assert_eq!(h.prompt.calls(), 1);
    }

    #[tokio::test]
    async fn non_interactive_without_password_reports_no_credentials() {
        let h = harness(vec![Some("correct")], false);
        let err = h.manager.login(&identity(true), false).await.unwrap_err();
        assert!(matches!(err, CoreError::NoCredentials { .. }));
        assert_eq!(h.backend.logins(), 0);
    }

    #[tokio::test]
    async fn force_reprompt_replaces_session() {
        let h = harness(vec![Some("correct"), Some("correct")], true);
        let id = identity(false);

        let first = h.manager.login(&id, false).await.unwrap();
        let second = h.manager.login(&id, true).await.unwrap();

        assert!(!first.same_as(&second));
        assert_eq!(h.prompt.calls(), 2);
    }

    #[tokio::test]
    async fn unremembered_password_is_asked_again_after_invalidate() {
        let h = harness(vec![Some("correct"), Some("correct")], true);
        let id = identity(false);

        h.manager.login(&id, false).await.unwrap();
        h.manager.invalidate(id.id);
        assert_eq!(h.manager.state(id.id), SessionState::NoSession);
        h.manager.login(&id, false).await.unwrap();

        assert_eq!(h.backend.logins(), 2);
        assert_eq!(h.prompt.calls(), 2);
    }

    #[tokio::test]
    async fn remembered_password_survives_invalidate() {
        let h = harness(vec![Some("correct")], true);
        let id = identity(true);

        h.manager.login(&id, false).await.unwrap();
        h.manager.invalidate(id.id);
        h.manager.login(&id, false).await.unwrap();

        assert_eq!(h.backend.logins(), 2);
        assert_eq!(h.prompt.calls(), 1);
    }

    #[tokio::test]
    async fn session_for_old_endpoint_is_not_reused() {
        let h = harness(vec![Some("correct"), Some("correct")], true);
        let old = identity(false);
        let mut moved = old.clone();
        moved.url = url::Url::parse("https://new.local/").unwrap();

        let first = h.manager.login(&old, false).await.unwrap();
        let second = h.manager.login(&moved, false).await.unwrap();

        assert!(!first.same_as(&second));
        assert_eq!(second.endpoint().as_str(), "https://new.local/");
        assert_eq!(h.backend.logins(), 2);
    }
}
