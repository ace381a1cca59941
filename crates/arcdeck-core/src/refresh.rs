// ── Refresh coordination ──
//
// A refresh logs in, then fetches every requested category concurrently.
// Categories settle independently: each one updates the registry and
// announces itself as soon as it resolves, whether it succeeded or not.
//
// Single-flight: the first caller for a controller spawns the work and
// publishes a shared handle in `in_flight`; later callers await that
// handle instead of starting their own. The entry is removed once the
// work has settled, including when it panicked.
//
// A target carries the controller's epoch at the time it was taken.
// Once the controller is reset (endpoint change, disconnect) results of
// older refreshes are dropped instead of written back.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::{BoxFuture, FutureExt, Shared, join_all};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use arcdeck_api::{ResourceType, Session};

use crate::convert;
use crate::error::CoreError;
use crate::model::{
    Category, ConfigSnapshot, ControllerId, ControllerIdentity, Endpoint, Registration, Snapshot,
};
use crate::notify::ChangeNotifier;
use crate::session::SessionManager;
use crate::store::ResourceRegistry;
use crate::tree::TreeReconciler;

type RefreshOutcome = Result<Arc<RefreshReport>, CoreError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

// ── Report ──────────────────────────────────────────────────────────

/// Outcome of one requested category.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: Category,
    pub outcome: Result<Snapshot, CoreError>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one registration sub-fetch: instance count or error.
#[derive(Debug, Clone)]
pub struct TypeReport {
    pub resource_type: ResourceType,
    pub outcome: Result<usize, CoreError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Everything one refresh did.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub controller: ControllerId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
    pub registration_types: Vec<TypeReport>,
    /// Present when registrations were fetched successfully.
    pub tree: Option<TreeSummary>,
}

impl RefreshReport {
    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories.iter().filter(|c| c.outcome.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

// ── Target ──────────────────────────────────────────────────────────

/// The per-controller state a refresh writes into.
#[derive(Clone)]
pub struct RefreshTarget {
    pub identity: ControllerIdentity,
    pub registry: Arc<ResourceRegistry>,
    pub tree: Arc<TreeReconciler>,
    pub notifier: Arc<ChangeNotifier>,
    /// Epoch this target was taken at.
    pub epoch: u64,
    /// The controller's current epoch.
    pub current_epoch: Arc<AtomicU64>,
}

impl RefreshTarget {
    /// `false` once the controller has been reset since this target was taken.
    pub fn is_current(&self) -> bool {
        self.current_epoch.load(Ordering::Acquire) == self.epoch
    }
}

// ── Coordinator ─────────────────────────────────────────────────────

struct InFlight {
    generation: u64,
    outcome: SharedRefresh,
}

pub struct RefreshCoordinator {
    sessions: Arc<SessionManager>,
    in_flight: DashMap<ControllerId, InFlight>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// `true` while a refresh for `id` is running.
    pub fn is_refreshing(&self, id: ControllerId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Wait until the refresh running for `id`, if any, has settled.
    pub async fn settled(&self, id: ControllerId) {
        let pending = self.in_flight.get(&id).map(|f| f.outcome.clone());
        if let Some(outcome) = pending {
            let _ = outcome.await;
        }
    }

    /// Refresh `categories` for the target controller, or join the
    /// refresh already running for it.
    ///
    /// Login failures and cancellation are returned as errors. Category
    /// failures are not: they are reported per category in the report
    /// and on the event stream.
    pub async fn refresh(
        self: &Arc<Self>,
        target: RefreshTarget,
        categories: impl IntoIterator<Item = Category>,
    ) -> RefreshOutcome {
        let id = target.identity.id;
        let categories: BTreeSet<Category> = categories.into_iter().collect();

        let (outcome, start) = match self.in_flight.entry(id) {
            Entry::Occupied(entry) => {
                debug!(controller = %id, "joining in-flight refresh");
                (entry.get().outcome.clone(), None)
            }
            Entry::Vacant(entry) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = oneshot::channel::<RefreshOutcome>();
                let outcome = async move {
                    rx.await.unwrap_or_else(|_| {
                        Err(CoreError::Internal("refresh task ended without a result".into()))
                    })
                }
                .boxed()
                .shared();
                entry.insert(InFlight {
                    generation,
                    outcome: outcome.clone(),
                });
                (outcome, Some((generation, tx)))
            }
        };

        // Spawned so the work completes even if every caller goes away.
        // A panic in the work surfaces as a `JoinError`; the entry is
        // cleared either way.
        if let Some((generation, tx)) = start {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let work = {
                    let this = Arc::clone(&this);
                    tokio::spawn(async move { this.run(target, categories).await })
                };
                let result = work.await.unwrap_or_else(|e| {
                    error!(controller = %id, error = %e, "refresh task failed");
                    Err(CoreError::Internal(format!("refresh task failed: {e}")))
                });
                this.in_flight
                    .remove_if(&id, |_, f| f.generation == generation);
                let _ = tx.send(result);
            });
        }

        outcome.await
    }

    async fn run(&self, target: RefreshTarget, categories: BTreeSet<Category>) -> RefreshOutcome {
        let id = target.identity.id;
        let started_at = Utc::now();
        info!(controller = %id, categories = ?categories, "refresh started");

        let session = match self.sessions.login(&target.identity, false).await {
            Ok(session) => session,
            Err(e) if e.is_cancelled() => {
                debug!(controller = %id, "refresh cancelled at login");
                return Err(e);
            }
            Err(e) => {
                warn!(controller = %id, error = %e, "refresh aborted: login failed");
                return Err(e);
            }
        };

        let run = Run {
            target: &target,
            session: &session,
            sessions: &self.sessions,
        };

        let (config, endpoints, registrations) = tokio::join!(
            run.config(categories.contains(&Category::Config)),
            run.endpoints(categories.contains(&Category::Endpoints)),
            run.registrations(categories.contains(&Category::Registrations)),
        );

        let mut report = RefreshReport {
            controller: id,
            started_at,
            finished_at: Utc::now(),
            categories: Vec::with_capacity(3),
            registration_types: Vec::new(),
            tree: None,
        };
        report.categories.extend(config);
        report.categories.extend(endpoints);
        if let Some(reg) = registrations {
            report.categories.push(reg.category);
            report.registration_types = reg.types;
            report.tree = reg.tree;
        }

        info!(
            controller = %id,
            failed = report.failures().count(),
            elapsed_ms = (report.finished_at - started_at).num_milliseconds(),
            "refresh finished"
        );
        Ok(Arc::new(report))
    }
}

// ── Per-refresh work ────────────────────────────────────────────────

struct RegistrationsOutcome {
    category: CategoryReport,
    types: Vec<TypeReport>,
    tree: Option<TreeSummary>,
}

struct Run<'a> {
    target: &'a RefreshTarget,
    session: &'a Session,
    sessions: &'a SessionManager,
}

impl Run<'_> {
    fn id(&self) -> ControllerId {
        self.target.identity.id
    }

    /// Map a backend error, dropping the session if it was rejected.
    fn backend_error(&self, err: arcdeck_api::Error) -> CoreError {
        if err.is_auth_rejected() {
            self.sessions.invalidate(self.id());
        }
        CoreError::from(err)
    }

    /// Store the outcome, stamp it and announce it. A superseded refresh
    /// only reports.
    fn settle(&self, category: Category, outcome: Result<Snapshot, CoreError>) -> CategoryReport {
        if !self.target.is_current() {
            debug!(controller = %self.id(), category = %category, "controller was reset; dropping result");
            return CategoryReport {
                category,
                outcome,
                updated_at: Utc::now(),
            };
        }
        let registry = &self.target.registry;
        let updated_at = match &outcome {
            Ok(snapshot) => registry.update(snapshot.clone()),
            Err(e) => {
                warn!(controller = %self.id(), category = %category, error = %e, "category fetch failed");
                registry.fail(category, e.clone())
            }
        };
        self.target
            .notifier
            .category_updated(category, outcome.clone(), updated_at);
        CategoryReport {
            category,
            outcome,
            updated_at,
        }
    }

    async fn config(&self, requested: bool) -> Option<CategoryReport> {
        if !requested {
            return None;
        }
        let outcome = match self.sessions.backend().show_config(self.session).await {
            Ok(record) => Ok(Snapshot::Config(Arc::new(ConfigSnapshot::from(record)))),
            Err(e) => Err(CoreError::category(Category::Config, &self.backend_error(e))),
        };
        Some(self.settle(Category::Config, outcome))
    }

    async fn endpoints(&self, requested: bool) -> Option<CategoryReport> {
        if !requested {
            return None;
        }
        let outcome = match self.sessions.backend().list_endpoints(self.session).await {
            Ok(records) => {
                let list: Vec<Endpoint> = records.into_iter().map(Endpoint::from).collect();
                Ok(Snapshot::Endpoints(Arc::new(list)))
            }
            Err(e) => Err(CoreError::category(Category::Endpoints, &self.backend_error(e))),
        };
        Some(self.settle(Category::Endpoints, outcome))
    }

    /// Fetch every resource type, then merge. The registry and the tree
    /// only ever see a complete list.
    async fn registrations(&self, requested: bool) -> Option<RegistrationsOutcome> {
        if !requested {
            return None;
        }
        let backend = self.sessions.backend();
        let fetches = ResourceType::ALL.map(|ty| async move {
            let result = backend.list_registrations(self.session, ty).await;
            (ty, result)
        });

        let mut merged: Vec<Registration> = Vec::new();
        let mut types = Vec::with_capacity(ResourceType::ALL.len());
        let mut first_error: Option<CoreError> = None;

        for (ty, result) in join_all(fetches).await {
            match result {
                Ok(records) => {
                    types.push(TypeReport {
                        resource_type: ty,
                        outcome: Ok(records.len()),
                    });
                    merged.extend(records.into_iter().map(|r| convert::registration(r, ty)));
                }
                Err(e) => {
                    let err = CoreError::category(ty, &self.backend_error(e));
                    warn!(controller = %self.id(), resource_type = %ty, error = %err, "registration sub-fetch failed");
                    first_error.get_or_insert_with(|| err.clone());
                    types.push(TypeReport {
                        resource_type: ty,
                        outcome: Err(err),
                    });
                }
            }
        }

        // A partial list would make the reconciler drop every node of the
        // failed type, so the previous tree is kept instead.
        let (category, tree) = match first_error {
            Some(err) => (self.settle(Category::Registrations, Err(err)), None),
            None if !self.target.is_current() => {
                let list = Snapshot::Registrations(Arc::new(merged));
                (self.settle(Category::Registrations, Ok(list)), None)
            }
            None => {
                let list = Arc::new(merged);
                let category =
                    self.settle(Category::Registrations, Ok(Snapshot::Registrations(Arc::clone(&list))));
                let reconciliation = self.target.tree.apply(&list);
                self.target.notifier.tree_changed(&reconciliation);
                let summary = TreeSummary {
                    total: reconciliation.nodes.len(),
                    added: reconciliation.added.len(),
                    removed: reconciliation.removed.len(),
                    updated: reconciliation.updated.len(),
                    skipped: reconciliation.skipped,
                };
                (category, Some(summary))
            }
        };

        Some(RegistrationsOutcome {
            category,
            types,
            tree,
        })
    }
}
