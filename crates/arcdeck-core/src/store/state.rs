// ── Category state ──

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::Snapshot;

/// What is known about one category of a controller.
///
/// Distinguishes "not fetched yet" from "fetched (possibly empty)" from
/// "fetch failed", so a UI never spins forever on a failed load.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CategoryState {
    #[default]
    NotFetched,
    Loaded {
        snapshot: Snapshot,
        updated_at: DateTime<Utc>,
    },
    Failed {
        error: CoreError,
        updated_at: DateTime<Utc>,
        /// The last good value, if there was one.
        stale: Option<Snapshot>,
    },
}

impl CategoryState {
    /// When the last fetch completed, successfully or not.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::NotFetched => None,
            Self::Loaded { updated_at, .. } | Self::Failed { updated_at, .. } => Some(*updated_at),
        }
    }

    /// The freshest snapshot available, stale or not.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::NotFetched => None,
            Self::Loaded { snapshot, .. } => Some(snapshot),
            Self::Failed { stale, .. } => stale.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_fetched(&self) -> bool {
        !matches!(self, Self::NotFetched)
    }
}
