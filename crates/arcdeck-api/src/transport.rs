// ── HTTP transport ──
//
// How `HttpBackend` reaches a controller: certificate trust and timeouts.
// Data controllers usually sit behind a self-signed management proxy, so
// besides the system roots a PEM bundle exported from the cluster can be
// trusted, or verification switched off entirely.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Certificate, Client};
use tracing::{debug, warn};

use crate::error::Error;

const USER_AGENT: &str = concat!("arcdeck/", env!("CARGO_PKG_VERSION"));

/// Which certificates a controller may present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Platform trust roots.
    System,
    /// Platform roots plus every certificate in this PEM bundle.
    CustomCa(PathBuf),
    /// No verification.
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request limit, login included.
    pub timeout: Duration,
    /// TCP + TLS handshake limit. Clamped to `timeout`.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<Client, Error> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout.min(self.timeout));

        builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => load_ca_bundle(path)?
                .into_iter()
                .fold(builder, reqwest::ClientBuilder::add_root_certificate),
            TlsMode::DangerAcceptInvalid => {
                warn!("certificate verification disabled for controller connections");
                builder.danger_accept_invalid_certs(true)
            }
        };

        builder.build().map_err(Error::Transport)
    }
}

/// Every certificate in a PEM file. An empty bundle is an error rather
/// than silently falling back to the system roots.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA bundle {}: {e}", path.display())))?;
    let certs = Certificate::from_pem_bundle(&pem)
        .map_err(|e| Error::Tls(format!("invalid CA bundle {}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(Error::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    debug!(path = %path.display(), certificates = certs.len(), "loaded CA bundle");
    Ok(certs)
}
