// HTTP backend authentication
//
// Username/password login returns a bearer token; the token and the
// controller coordinates are bundled into a `Session` for later calls.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::client::{HttpBackend, backend_error};
use crate::error::Error;
use crate::models::CommandOutput;
use crate::session::Session;

#[derive(Deserialize)]
struct LoginResult {
    token: String,
}

impl HttpBackend {
    /// Authenticate with username/password at `POST /api/v1/login`.
    ///
    /// A 401 or 403 is reported as [`Error::Authentication`] so callers can
    /// tell a rejected password from a transport failure.
    pub(crate) async fn login_inner(
        &self,
        endpoint: &Url,
        namespace: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, Error> {
        let url = Self::api_url(endpoint, "login")?;

        debug!("logging in at {}", url);

        let body = json!({
            "namespace": namespace,
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self.http().post(url).json(&body).send().await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", body.trim()),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(backend_error(status, &body));
        }

        let text = resp.text().await?;
        let output: CommandOutput<LoginResult> =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: format!("login response: {e}"),
                body: text.clone(),
            })?;

        debug!("login successful");
        Ok(Session::new(
            endpoint.clone(),
            namespace,
            username,
            SecretString::from(output.result.token),
        ))
    }

    /// End the session at `POST /api/v1/logout`.
    pub(crate) async fn logout_inner(&self, session: &Session) -> Result<(), Error> {
        let url = Self::api_url(session.endpoint(), "logout")?;

        debug!("logging out at {}", url);

        let resp = self
            .http()
            .post(url)
            .bearer_auth(session.token().expose_secret())
            .send()
            .await?;

        // An already-expired session is as good as logged out.
        let status = resp.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            return Err(backend_error(status, &body));
        }

        debug!("logout complete");
        Ok(())
    }
}
