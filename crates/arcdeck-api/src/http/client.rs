// HTTP backend client
//
// Wraps `reqwest::Client` with controller URL construction, bearer-token
// auth, and `CommandOutput` envelope unwrapping. Endpoint methods live in
// sibling files to keep this module focused on transport mechanics.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::CommandOutput;
use crate::session::Session;
use crate::transport::TransportConfig;

const PREVIEW_CHARS: usize = 200;

/// Error body shape: `{"error":{"code":"...","message":"..."}}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    error: Option<ErrorBodyInner>,
}

#[derive(serde::Deserialize)]
struct ErrorBodyInner {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// JSON-over-HTTP implementation of [`CommandBackend`](crate::CommandBackend).
///
/// Stateless apart from the connection pool: the controller endpoint,
/// namespace and token all travel in the [`Session`], so one backend
/// serves every controller the console knows about.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
}

impl HttpBackend {
    /// Build a backend from transport settings (TLS mode, timeout).
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Create a backend around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{endpoint}/api/v1/{path}`.
    pub(crate) fn api_url(endpoint: &Url, path: &str) -> Result<Url, Error> {
        let base = endpoint.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/v1/{path}"))?)
    }

    /// Build a namespace-scoped URL for the session's controller:
    /// `{endpoint}/api/v1/namespaces/{namespace}/{path}`.
    pub(crate) fn namespace_url(session: &Session, path: &str) -> Result<Url, Error> {
        Self::api_url(
            session.endpoint(),
            &format!("namespaces/{}/{path}", session.namespace()),
        )
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and unwrap the command output envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        url: Url,
        resource: &str,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(session.token().expose_secret())
            .send()
            .await?;

        Self::parse_output(resp, resource).await
    }

    /// Map the response status, then decode the `{ result, logs, ... }`
    /// envelope and return `result`.
    pub(crate) async fn parse_output<T: DeserializeOwned>(
        resp: reqwest::Response,
        resource: &str,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                resource: resource.to_owned(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(backend_error(status, &body));
        }

        let body = resp.text().await?;

        let output: CommandOutput<T> = serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        for line in &output.stderr {
            trace!(resource, "backend stderr: {line}");
        }

        Ok(output.result)
    }
}

/// First 200 characters of a response body, cut on a char boundary.
fn preview(body: &str) -> &str {
    body.char_indices()
        .nth(PREVIEW_CHARS)
        .map_or(body, |(end, _)| &body[..end])
}

/// Build an [`Error::Backend`] from a non-success status and its body,
/// preferring the structured `{"error": {...}}` message when present.
pub(crate) fn backend_error(status: StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error);

    match parsed {
        Some(inner) => Error::Backend {
            message: inner
                .message
                .unwrap_or_else(|| format!("HTTP {status}")),
            code: inner.code,
            status: status.as_u16(),
        },
        None => Error::Backend {
            message: format!("HTTP {status}: {}", preview(body)),
            code: None,
            status: status.as_u16(),
        },
    }
}
