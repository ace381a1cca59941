// ── Saved controller list ──
//
// A single TOML file with one `[[controllers]]` table per identity.
// Writes go to a sibling temp file first and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use arcdeck_core::{ControllerIdentity, CoreError, StateStore};

use crate::ConfigError;

#[derive(Debug, Default, Deserialize, Serialize)]
struct StateFile {
    #[serde(default)]
    controllers: Vec<ControllerIdentity>,
}

/// [`StateStore`] persisting known controllers to a TOML file.
#[derive(Debug, Clone)]
pub struct TomlStateStore {
    path: PathBuf,
}

impl TomlStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<Vec<ControllerIdentity>, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let file: StateFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(file.controllers)
    }

    fn write_file(path: &Path, controllers: Vec<ControllerIdentity>) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(&StateFile { controllers })?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn state_error(err: impl std::fmt::Display) -> CoreError {
    CoreError::StateStore {
        message: err.to_string(),
    }
}

#[async_trait]
impl StateStore for TomlStateStore {
    async fn load(&self) -> Result<Vec<ControllerIdentity>, CoreError> {
        let path = self.path.clone();
        let controllers = tokio::task::spawn_blocking(move || Self::read_file(&path))
            .await
            .map_err(state_error)?
            .map_err(state_error)?;
        tracing::debug!(path = %self.path.display(), count = controllers.len(), "loaded controllers");
        Ok(controllers)
    }

    async fn save(&self, controllers: &[ControllerIdentity]) -> Result<(), CoreError> {
        let path = self.path.clone();
        let controllers = controllers.to_vec();
        tokio::task::spawn_blocking(move || Self::write_file(&path, controllers))
            .await
            .map_err(state_error)?
            .map_err(state_error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use url::Url;

    fn identity(name: &str) -> ControllerIdentity {
        ControllerIdentity::new(
            Url::parse("https://arc.example.com:30080").unwrap(),
            "arc",
            "admin",
            true,
            Some(name.to_owned()),
        )
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlStateStore::new(dir.path().join("controllers.toml"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_identities_load_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlStateStore::new(dir.path().join("state").join("controllers.toml"));
        let saved = vec![identity("east"), identity("west")];

        store.save(&saved).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, saved);
        assert!(!dir.path().join("state").join("controllers.toml.tmp").exists());
    }

    #[tokio::test]
    async fn file_never_contains_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controllers.toml");
        let store = TomlStateStore::new(&path);

        store.save(&[identity("east")]).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();

        assert!(raw.contains("[[controllers]]"));
        assert!(
            raw.lines()
                .all(|line| !line.trim_start().starts_with("password"))
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_a_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controllers.toml");
        std::fs::write(&path, "controllers = 7").unwrap();

        let err = TomlStateStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CoreError::StateStore { .. }));
    }
}
