use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use url::Url;

/// An authenticated handle to one controller.
///
/// Opaque to everything except the backend that issued it: the core only
/// clones it into concurrent fetches and drops it on invalidation.
/// Cheap to clone (shared `Arc`), never serialized.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    endpoint: Url,
    namespace: String,
    username: String,
    token: SecretString,
    established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        endpoint: Url,
        namespace: impl Into<String>,
        username: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                endpoint,
                namespace: namespace.into(),
                username: username.into(),
                token,
                established_at: Utc::now(),
            }),
        }
    }

    /// The controller endpoint this session was issued by.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    /// Bearer token presented on every backend call.
    pub fn token(&self) -> &SecretString {
        &self.inner.token
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.inner.established_at
    }

    /// `true` if both handles refer to the same login.
    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
