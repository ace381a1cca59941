// ── Controller identity ──
//
// The minimal record needed to reconnect to a controller. It is the only
// thing persisted across restarts and never carries a secret.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

// ── ControllerId ────────────────────────────────────────────────────

/// Stable identifier generated once when a controller is first added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(Uuid);

impl ControllerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ControllerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for ControllerId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── ControllerIdentity ──────────────────────────────────────────────

/// A known controller: where it lives, who logs in, and what to call it.
///
/// `id` never changes. `url`, `namespace` and `name` change only through
/// an explicit edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerIdentity {
    pub id: ControllerId,
    pub url: Url,
    pub namespace: String,
    pub username: String,
    #[serde(default)]
    pub remember_password: bool,
    /// Display name. Defaults to the host portion of `url`.
    #[serde(default)]
    pub name: String,
}

impl ControllerIdentity {
    /// A fresh identity with a newly generated id.
    pub fn new(
        url: Url,
        namespace: impl Into<String>,
        username: impl Into<String>,
        remember_password: bool,
        name: Option<String>,
    ) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_name(&url));
        Self {
            id: ControllerId::generate(),
            url,
            namespace: namespace.into(),
            username: username.into(),
            remember_password,
            name,
        }
    }

    /// The name shown to users; falls back to the URL host if unset.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            default_name(&self.url)
        } else {
            self.name.clone()
        }
    }

    /// `true` if `other` points at a different controller endpoint.
    pub fn endpoint_differs(&self, other: &ControllerIdentity) -> bool {
        self.url != other.url || self.namespace != other.namespace || self.username != other.username
    }
}

fn default_name(url: &Url) -> String {
    url.host_str().map_or_else(|| url.to_string(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid url")
    }

    #[test]
    fn name_defaults_to_host() {
        let identity = ControllerIdentity::new(
            url("https://dc.contoso.local:30080"),
            "arc",
            "admin",
            false,
            Some("   ".into()),
        );
        assert_eq!(identity.name, "dc.contoso.local");
    }

    #[test]
    fn endpoint_change_detection_ignores_rename() {
        let a = ControllerIdentity::new(url("https://a:1"), "arc", "admin", true, None);
        let mut b = a.clone();
        b.name = "renamed".into();
        assert!(!a.endpoint_differs(&b));
        b.namespace = "other".into();
        assert!(a.endpoint_differs(&b));
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = ControllerId::generate();
        let parsed: ControllerId = id.to_string().parse().expect("parse id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn serialized_form_has_no_secret_fields() {
        let identity = ControllerIdentity::new(url("https://a:1"), "arc", "admin", true, None);
        let json = serde_json::to_value(&identity).expect("serialize");
        let keys: Vec<&str> = json
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        assert!(!keys.iter().any(|k| k.contains("password") && *k != "rememberPassword"));
    }
}
