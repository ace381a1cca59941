// ── Console facade ──
//
// Single entry point for a UI host: owns the known controllers and wires
// sessions, refresh, registry, tree and notifications together. Cheaply
// cloneable via `Arc<ConsoleInner>`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use arcdeck_api::CommandBackend;

use crate::config::ConsoleSettings;
use crate::credential::{CredentialBroker, CredentialKey, CredentialStore, PasswordPrompt};
use crate::error::CoreError;
use crate::model::{Category, ControllerId, ControllerIdentity};
use crate::notify::{ChangeNotifier, ConsoleEvent};
use crate::persist::StateStore;
use crate::refresh::{RefreshCoordinator, RefreshReport, RefreshTarget};
use crate::session::{SessionManager, SessionState};
use crate::store::ResourceRegistry;
use crate::tree::{ResourceNode, TreeReconciler};

// ── Requests ────────────────────────────────────────────────────────

/// Input for [`Console::add_controller`].
#[derive(Debug, Clone)]
pub struct NewController {
    pub url: Url,
    pub namespace: String,
    pub username: String,
    pub remember_password: bool,
    pub name: Option<String>,
}

/// Fields to change in [`Console::update_controller`]. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct ControllerUpdate {
    pub name: Option<String>,
    pub url: Option<Url>,
    pub namespace: Option<String>,
    pub username: Option<String>,
    pub remember_password: Option<bool>,
}

// ── ControllerHandle ────────────────────────────────────────────────

/// Live state of one known controller.
pub struct ControllerHandle {
    identity: ArcSwap<ControllerIdentity>,
    registry: Arc<ResourceRegistry>,
    tree: Arc<TreeReconciler>,
    notifier: Arc<ChangeNotifier>,
    /// Bumped whenever the controller is reset.
    epoch: Arc<AtomicU64>,
}

impl ControllerHandle {
    fn new(identity: ControllerIdentity, event_capacity: usize) -> Self {
        let id = identity.id;
        Self {
            identity: ArcSwap::from_pointee(identity),
            registry: Arc::new(ResourceRegistry::new()),
            tree: Arc::new(TreeReconciler::new(id)),
            notifier: Arc::new(ChangeNotifier::new(id, event_capacity)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn id(&self) -> ControllerId {
        self.identity.load().id
    }

    pub fn identity(&self) -> ControllerIdentity {
        (**self.identity.load()).clone()
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Current resource nodes, in display order.
    pub fn nodes(&self) -> Vec<Arc<ResourceNode>> {
        self.tree.nodes()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ConsoleEvent>> {
        self.notifier.subscribe()
    }

    fn target(&self) -> RefreshTarget {
        // Epoch before identity: a target holding the new epoch always
        // sees the identity stored before the bump.
        let epoch = self.epoch.load(Ordering::Acquire);
        RefreshTarget {
            identity: self.identity(),
            registry: Arc::clone(&self.registry),
            tree: Arc::clone(&self.tree),
            notifier: Arc::clone(&self.notifier),
            epoch,
            current_epoch: Arc::clone(&self.epoch),
        }
    }

    /// Mark every outstanding refresh target as stale.
    fn supersede(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Drop snapshots and nodes. The identity is untouched.
    fn reset(&self) {
        self.registry.clear();
        let dropped = self.tree.clear();
        debug!(controller = %self.id(), nodes = dropped, "controller state cleared");
    }
}

// ── Console ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    settings: ConsoleSettings,
    sessions: Arc<SessionManager>,
    coordinator: Arc<RefreshCoordinator>,
    state_store: Arc<dyn StateStore>,
    handles: DashMap<ControllerId, Arc<ControllerHandle>>,
    /// Known controllers in insertion order; also the persisted list.
    list: watch::Sender<Arc<Vec<ControllerIdentity>>>,
    /// Serializes add/update/remove and the writes they trigger.
    mutate: Mutex<()>,
}

impl Console {
    pub fn new(
        backend: Arc<dyn CommandBackend>,
        credentials: Arc<dyn CredentialStore>,
        prompt: Option<Arc<dyn PasswordPrompt>>,
        state_store: Arc<dyn StateStore>,
        settings: ConsoleSettings,
    ) -> Self {
        let broker = Arc::new(CredentialBroker::new(credentials, prompt));
        let sessions = Arc::new(SessionManager::new(backend, broker, settings.interactive));
        let coordinator = Arc::new(RefreshCoordinator::new(Arc::clone(&sessions)));
        let (list, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            inner: Arc::new(ConsoleInner {
                settings,
                sessions,
                coordinator,
                state_store,
                handles: DashMap::new(),
                list,
                mutate: Mutex::new(()),
            }),
        }
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.inner.settings
    }

    // ── Controller list ──────────────────────────────────────────────

    /// Load persisted controllers. Returns how many are known afterwards.
    pub async fn load(&self) -> Result<usize, CoreError> {
        let stored = self.inner.state_store.load().await?;
        let _guard = self.inner.mutate.lock().await;
        for identity in stored {
            if self.inner.handles.contains_key(&identity.id) {
                warn!(controller = %identity.id, "duplicate controller in saved state; skipping");
                continue;
            }
            self.insert(identity);
        }
        let count = self.inner.handles.len();
        info!(controllers = count, "controllers loaded");
        Ok(count)
    }

    pub fn controllers(&self) -> Vec<ControllerIdentity> {
        Vec::clone(&self.inner.list.borrow())
    }

    /// Subscribe to the list of known controllers.
    pub fn watch_controllers(&self) -> watch::Receiver<Arc<Vec<ControllerIdentity>>> {
        self.inner.list.subscribe()
    }

    pub fn get(&self, id: ControllerId) -> Option<Arc<ControllerHandle>> {
        self.inner.handles.get(&id).map(|h| Arc::clone(h.value()))
    }

    /// Look up by id or (case-insensitive) name.
    pub fn find(&self, identifier: &str) -> Result<Arc<ControllerHandle>, CoreError> {
        if let Ok(id) = identifier.parse::<ControllerId>() {
            if let Some(handle) = self.get(id) {
                return Ok(handle);
            }
        }
        let mut matches = self
            .controllers()
            .into_iter()
            .filter(|c| c.display_name().eq_ignore_ascii_case(identifier));
        match (matches.next(), matches.next()) {
            (Some(identity), None) => self.handle(identity.id),
            (Some(_), Some(_)) => Err(CoreError::Validation {
                field: "controller".into(),
                reason: format!("'{identifier}' matches more than one controller; use its id"),
            }),
            (None, _) => Err(CoreError::ControllerNotFound {
                identifier: identifier.to_owned(),
            }),
        }
    }

    /// Stop any running refresh from writing back, then wait for it to
    /// settle so its login cannot outlive the reset that follows.
    async fn quiesce(&self, handle: &ControllerHandle) {
        let id = handle.id();
        let epoch = handle.supersede();
        if self.inner.coordinator.is_refreshing(id) {
            debug!(controller = %id, epoch, "waiting for running refresh to settle");
            self.inner.coordinator.settled(id).await;
        }
    }

    fn handle(&self, id: ControllerId) -> Result<Arc<ControllerHandle>, CoreError> {
        self.get(id).ok_or_else(|| CoreError::ControllerNotFound {
            identifier: id.to_string(),
        })
    }

    fn insert(&self, identity: ControllerIdentity) {
        let handle = ControllerHandle::new(identity.clone(), self.inner.settings.event_capacity);
        self.inner.handles.insert(identity.id, Arc::new(handle));
        self.inner.list.send_modify(|list| {
            Arc::make_mut(list).push(identity);
        });
    }

    async fn persist(&self) -> Result<(), CoreError> {
        let list = self.controllers();
        self.inner.state_store.save(&list).await?;
        debug!(controllers = list.len(), "controller list saved");
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Connect to a new controller and remember it.
    ///
    /// Prompts for the password (with confirmation). The controller is
    /// persisted only after a successful login.
    pub async fn add_controller(
        &self,
        request: NewController,
    ) -> Result<ControllerIdentity, CoreError> {
        validate_url(&request.url)?;
        validate_non_empty("namespace", &request.namespace)?;
        validate_non_empty("username", &request.username)?;

        let identity = ControllerIdentity::new(
            request.url,
            request.namespace.trim(),
            request.username.trim(),
            request.remember_password,
            request.name,
        );
        if let Some(existing) = self
            .controllers()
            .into_iter()
            .find(|c| !c.endpoint_differs(&identity))
        {
            return Err(CoreError::Validation {
                field: "controller".into(),
                reason: format!("already added as '{}'", existing.display_name()),
            });
        }

        if let Err(e) = self.inner.sessions.connect_new(&identity).await {
            self.inner.sessions.forget(identity.id);
            return Err(e);
        }

        let _guard = self.inner.mutate.lock().await;
        self.insert(identity.clone());
        self.persist().await?;
        info!(controller = %identity.id, name = %identity.name, "controller added");
        Ok(identity)
    }

    /// Rename a controller or change where it points.
    ///
    /// Changing the URL, namespace or username drops the session and all
    /// cached snapshots; the next refresh logs in again.
    pub async fn update_controller(
        &self,
        id: ControllerId,
        update: ControllerUpdate,
    ) -> Result<ControllerIdentity, CoreError> {
        let _guard = self.inner.mutate.lock().await;
        let handle = self.handle(id)?;
        let current = handle.identity();
        let mut next = current.clone();

        if let Some(url) = update.url {
            validate_url(&url)?;
            next.url = url;
        }
        if let Some(namespace) = update.namespace {
            validate_non_empty("namespace", &namespace)?;
            next.namespace = namespace.trim().to_owned();
        }
        if let Some(username) = update.username {
            validate_non_empty("username", &username)?;
            next.username = username.trim().to_owned();
        }
        if let Some(name) = update.name {
            next.name = name.trim().to_owned();
        }
        if let Some(remember) = update.remember_password {
            next.remember_password = remember;
        }

        if next == current {
            return Ok(current);
        }

        handle.identity.store(Arc::new(next.clone()));

        if current.endpoint_differs(&next) {
            info!(controller = %id, "endpoint changed; dropping session and snapshots");
            self.quiesce(&handle).await;
            self.inner.sessions.logout(id).await;
            self.inner.sessions.forget(id);
            self.inner.sessions.broker().forget(id, &[]).await;
            handle.reset();
        } else if current.remember_password && !next.remember_password {
            self.inner.sessions.broker().forget(id, &[]).await;
        }

        self.inner.list.send_modify(|list| {
            if let Some(slot) = Arc::make_mut(list).iter_mut().find(|c| c.id == id) {
                *slot = next.clone();
            }
        });
        self.persist().await?;
        Ok(next)
    }

    /// Forget a controller: session, stored passwords, and saved entry.
    pub async fn remove_controller(&self, id: ControllerId) -> Result<ControllerIdentity, CoreError> {
        let _guard = self.inner.mutate.lock().await;
        let handle = self.handle(id)?;

        self.quiesce(&handle).await;
        let resource_keys: Vec<CredentialKey> =
            handle.nodes().iter().map(|n| n.credential_key()).collect();
        self.inner.sessions.logout(id).await;
        self.inner.sessions.forget(id);
        self.inner.sessions.broker().forget(id, &resource_keys).await;
        handle.reset();

        self.inner.handles.remove(&id);
        self.inner.list.send_modify(|list| {
            Arc::make_mut(list).retain(|c| c.id != id);
        });
        self.persist().await?;
        info!(controller = %id, "controller removed");
        Ok(handle.identity())
    }

    /// Drop the session and in-memory snapshots. The controller stays
    /// known and persisted.
    pub async fn disconnect(&self, id: ControllerId) -> Result<(), CoreError> {
        let handle = self.handle(id)?;
        self.quiesce(&handle).await;
        self.inner.sessions.logout(id).await;
        handle.reset();
        info!(controller = %id, "disconnected");
        Ok(())
    }

    /// Force a fresh password prompt and login.
    pub async fn reauthenticate(&self, id: ControllerId) -> Result<(), CoreError> {
        let handle = self.handle(id)?;
        self.inner
            .sessions
            .login(&handle.identity(), true)
            .await
            .map(|_| ())
    }

    pub fn session_state(&self, id: ControllerId) -> SessionState {
        self.inner.sessions.state(id)
    }

    pub fn subscribe(
        &self,
        id: ControllerId,
    ) -> Result<broadcast::Receiver<Arc<ConsoleEvent>>, CoreError> {
        Ok(self.handle(id)?.subscribe())
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Refresh every category of one controller.
    pub async fn refresh(&self, id: ControllerId) -> Result<Arc<RefreshReport>, CoreError> {
        self.refresh_categories(id, Category::ALL).await
    }

    pub async fn refresh_categories(
        &self,
        id: ControllerId,
        categories: impl IntoIterator<Item = Category>,
    ) -> Result<Arc<RefreshReport>, CoreError> {
        let handle = self.handle(id)?;
        self.inner
            .coordinator
            .refresh(handle.target(), categories)
            .await
    }

    /// Refresh every known controller concurrently.
    pub async fn refresh_all(
        &self,
    ) -> Vec<(ControllerId, Result<Arc<RefreshReport>, CoreError>)> {
        let ids: Vec<ControllerId> = self.controllers().iter().map(|c| c.id).collect();
        let runs = ids.into_iter().map(|id| async move { (id, self.refresh(id).await) });
        join_all(runs).await
    }

    /// Refresh every controller each `interval` until `cancel` fires.
    /// Returns `None` for a zero interval.
    pub fn spawn_auto_refresh(
        &self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            return None;
        }
        let console = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        for (id, result) in console.refresh_all().await {
                            match result {
                                Ok(_) => {}
                                Err(e) if e.is_cancelled() => {
                                    debug!(controller = %id, "periodic refresh cancelled");
                                }
                                Err(e) => warn!(controller = %id, error = %e, "periodic refresh failed"),
                            }
                        }
                    }
                }
            }
            debug!("auto refresh stopped");
        }))
    }
}

// ── Validation ──────────────────────────────────────────────────────

fn validate_url(url: &Url) -> Result<(), CoreError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CoreError::Validation {
            field: "url".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(CoreError::Validation {
            field: "url".into(),
            reason: "missing host".into(),
        });
    }
    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use arcdeck_api::ResourceType;
    use secrecy::SecretString;

    use crate::credential::MemoryCredentialStore;
    use crate::credential::tests::ScriptedPrompt;
    use crate::persist::MemoryStateStore;
    use crate::testing::FakeBackend;

    struct Harness {
        backend: Arc<FakeBackend>,
        credentials: Arc<MemoryCredentialStore>,
        state: Arc<MemoryStateStore>,
        console: Console,
    }

    fn harness(answers: Vec<Option<&'static str>>, initial: Vec<ControllerIdentity>) -> Harness {
        let backend = Arc::new(FakeBackend::new("correct"));
        let credentials = Arc::new(MemoryCredentialStore::new());
        let state = Arc::new(MemoryStateStore::new(initial));
        let prompt: Arc<dyn PasswordPrompt> = Arc::new(ScriptedPrompt::new(answers));
        let console = Console::new(
            backend.clone(),
            credentials.clone(),
            Some(prompt),
            state.clone(),
            ConsoleSettings::default(),
        );
        Harness {
            backend,
            credentials,
            state,
            console,
        }
    }

    fn request(name: &str) -> NewController {
        NewController {
            url: Url::parse("https://dc.local:30080").unwrap(),
            namespace: "arc".into(),
            username: "admin".into(),
            remember_password: true,
            name: Some(name.into()),
        }
    }

    #[tokio::test]
    async fn add_persists_after_successful_login() {
        let h = harness(vec![Some("correct")], vec![]);

        let identity = h.console.add_controller(request("east")).await.unwrap();

        assert_eq!(h.state.snapshot(), vec![identity.clone()]);
        assert!(h.credentials.contains(&CredentialKey::controller(identity.id)));
        assert_eq!(h.console.session_state(identity.id), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn failed_add_is_not_persisted() {
        let h = harness(vec![Some("wrong"), Some("still-wrong")], vec![]);

        let err = h.console.add_controller(request("east")).await.unwrap_err();

        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(h.state.snapshot().is_empty());
        assert!(h.console.controllers().is_empty());
    }

    #[tokio::test]
    async fn duplicate_endpoint_is_rejected() {
        let h = harness(vec![Some("correct")], vec![]);
        h.console.add_controller(request("east")).await.unwrap();
        let err = h.console.add_controller(request("again")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_login() {
        let h = harness(vec![Some("correct")], vec![]);
        let mut req = request("east");
        req.url = Url::parse("ftp://dc.local").unwrap();
        assert!(h.console.add_controller(req).await.is_err());
        assert_eq!(h.backend.logins(), 0);
    }

    #[tokio::test]
    async fn load_and_find_by_name() {
        let saved = ControllerIdentity::new(
            Url::parse("https://west.local").unwrap(),
            "arc",
            "admin",
            false,
            Some("West".into()),
        );
        let h = harness(vec![], vec![saved.clone()]);

        assert_eq!(h.console.load().await.unwrap(), 1);
        assert_eq!(h.console.find("west").unwrap().id(), saved.id);
        assert_eq!(h.console.find(&saved.id.to_string()).unwrap().id(), saved.id);
        assert!(matches!(
            h.console.find("nope"),
            Err(CoreError::ControllerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn refresh_populates_tree() {
        let h = harness(vec![Some("correct")], vec![]);
        h.backend
            .set_registrations(ResourceType::PostgresInstances, &[("pg-1", "Ready")]);
        let identity = h.console.add_controller(request("east")).await.unwrap();

        let report = h.console.refresh(identity.id).await.unwrap();

        assert!(report.is_success());
        let handle = h.console.get(identity.id).unwrap();
        assert_eq!(handle.nodes().len(), 1);
        assert_eq!(handle.registry().config().unwrap().name.as_deref(), Some("arc-dc"));
        // The add already logged in; refresh reuses that session.
        assert_eq!(h.backend.logins(), 1);
    }

    #[tokio::test]
    async fn endpoint_change_invalidates_session_and_snapshots() {
        let h = harness(vec![Some("correct"), Some("correct")], vec![]);
        let identity = h.console.add_controller(request("east")).await.unwrap();
        h.console.refresh(identity.id).await.unwrap();

        let update = ControllerUpdate {
            url: Some(Url::parse("https://dc2.local:30080").unwrap()),
            ..ControllerUpdate::default()
        };
        let updated = h.console.update_controller(identity.id, update).await.unwrap();

        assert_eq!(updated.id, identity.id);
        assert_eq!(h.console.session_state(identity.id), SessionState::NoSession);
        let handle = h.console.get(identity.id).unwrap();
        assert!(!handle.registry().get(Category::Config).is_fetched());
        assert_eq!(h.state.snapshot()[0].url.host_str(), Some("dc2.local"));

        h.console.refresh(identity.id).await.unwrap();
        assert_eq!(h.backend.logins(), 2);
    }

    #[tokio::test]
    async fn rename_keeps_session() {
        let h = harness(vec![Some("correct")], vec![]);
        let identity = h.console.add_controller(request("east")).await.unwrap();
        let update = ControllerUpdate {
            name: Some("East DC".into()),
            ..ControllerUpdate::default()
        };
        h.console.update_controller(identity.id, update).await.unwrap();
        assert_eq!(h.console.session_state(identity.id), SessionState::Authenticated);
        assert_eq!(h.console.find("east dc").unwrap().id(), identity.id);
    }

    #[tokio::test]
    async fn remove_forgets_credentials_and_persists() {
        let h = harness(vec![Some("correct")], vec![]);
        h.backend
            .set_registrations(ResourceType::SqlManagedInstances, &[("sql-1", "Ready")]);
        let identity = h.console.add_controller(request("east")).await.unwrap();
        h.console.refresh(identity.id).await.unwrap();
        let node_key = h.console.get(identity.id).unwrap().nodes()[0].credential_key();
        h.credentials
            .write(&node_key, &SecretString::from("db-pw"))
            .await
            .unwrap();

        h.console.remove_controller(identity.id).await.unwrap();

        assert!(h.console.controllers().is_empty());
        assert!(h.state.snapshot().is_empty());
        assert!(!h.credentials.contains(&CredentialKey::controller(identity.id)));
        assert!(!h.credentials.contains(&node_key));
    }

    #[tokio::test]
    async fn disconnect_keeps_identity() {
        let h = harness(vec![Some("correct")], vec![]);
        let identity = h.console.add_controller(request("east")).await.unwrap();
        h.console.refresh(identity.id).await.unwrap();

        h.console.disconnect(identity.id).await.unwrap();

        let handle = h.console.get(identity.id).unwrap();
        assert!(handle.nodes().is_empty());
        assert!(handle.registry().registrations().is_none());
        assert_eq!(h.console.controllers(), vec![identity.clone()]);
        assert_eq!(h.state.snapshot().len(), 1);

        // The remembered password lets the next refresh log in silently.
        h.console.refresh(identity.id).await.unwrap();
        assert_eq!(h.backend.logins(), 2);
    }

    /// Adds a controller, drops its session and starts a slow refresh
    /// that has to log in again.
    async fn slow_refresh_in_flight(
        h: &Harness,
    ) -> (ControllerId, JoinHandle<Result<Arc<RefreshReport>, CoreError>>) {
        h.backend
            .set_registrations(ResourceType::PostgresInstances, &[("pg-1", "Ready")]);
        let identity = h.console.add_controller(request("east")).await.unwrap();
        h.console.disconnect(identity.id).await.unwrap();
        h.backend.set_latency(Duration::from_millis(50));

        let console = h.console.clone();
        let running = tokio::spawn(async move { console.refresh(identity.id).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.console.inner.coordinator.is_refreshing(identity.id));
        (identity.id, running)
    }

    #[tokio::test(start_paused = true)]
    async fn endpoint_change_during_refresh_discards_old_endpoint() {
        let h = harness(vec![Some("correct"), Some("correct")], vec![]);
        let (id, running) = slow_refresh_in_flight(&h).await;

        let update = ControllerUpdate {
            url: Some(Url::parse("https://new.local/").unwrap()),
            ..ControllerUpdate::default()
        };
        h.console.update_controller(id, update).await.unwrap();
        running.await.unwrap().unwrap();

        let handle = h.console.get(id).unwrap();
        for category in Category::ALL {
            assert!(!handle.registry().get(category).is_fetched());
        }
        assert!(handle.nodes().is_empty());
        assert!(h.console.inner.sessions.session(id).is_none());

        h.console.refresh(id).await.unwrap();
        let session = h.console.inner.sessions.session(id).unwrap();
        assert_eq!(session.endpoint().as_str(), "https://new.local/");
        assert_eq!(handle.nodes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_refresh_leaves_nothing_behind() {
        let h = harness(vec![Some("correct")], vec![]);
        let (id, running) = slow_refresh_in_flight(&h).await;

        h.console.disconnect(id).await.unwrap();
        running.await.unwrap().unwrap();

        let handle = h.console.get(id).unwrap();
        assert!(handle.registry().config().is_none());
        assert!(handle.nodes().is_empty());
        assert!(h.console.inner.sessions.session(id).is_none());
        assert_eq!(h.console.session_state(id), SessionState::NoSession);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_ticks_until_cancelled() {
        let h = harness(vec![Some("correct")], vec![]);
        let identity = h.console.add_controller(request("east")).await.unwrap();
        let cancel = CancellationToken::new();

        let task = h
            .console
            .spawn_auto_refresh(Duration::from_secs(30), cancel.clone())
            .unwrap();
        tokio::time::sleep(Duration::from_secs(95)).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(h.backend.config_calls.load(Ordering::SeqCst), 3);
        assert!(h.console.get(identity.id).unwrap().registry().config().is_some());
        assert!(h.console.spawn_auto_refresh(Duration::ZERO, cancel).is_none());
    }
}
