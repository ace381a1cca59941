// Shared fakes for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use arcdeck_api::{
    CommandBackend, ControllerConfigRecord, EndpointRecord, Error, RegistrationRecord,
    ResourceType, Session,
};

/// In-memory controller with call counters and scriptable failures.
pub(crate) struct FakeBackend {
    password: Mutex<String>,
    registrations: Mutex<HashMap<ResourceType, Result<Vec<RegistrationRecord>, String>>>,
    fail_endpoints: AtomicBool,
    fail_login_transport: AtomicBool,
    panic_endpoints: AtomicBool,
    latency: Mutex<Duration>,
    pub(crate) logins: AtomicUsize,
    pub(crate) config_calls: AtomicUsize,
    pub(crate) endpoint_calls: AtomicUsize,
    pub(crate) registration_calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new(password: &str) -> Self {
        Self {
            password: Mutex::new(password.to_owned()),
            registrations: Mutex::new(HashMap::new()),
            fail_endpoints: AtomicBool::new(false),
            fail_login_transport: AtomicBool::new(false),
            panic_endpoints: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
            logins: AtomicUsize::new(0),
            config_calls: AtomicUsize::new(0),
            endpoint_calls: AtomicUsize::new(0),
            registration_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_password(&self, password: &str) {
        *self.password.lock().unwrap() = password.to_owned();
    }

    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub(crate) fn set_registrations(&self, ty: ResourceType, entries: &[(&str, &str)]) {
        let records = entries
            .iter()
            .map(|(name, state)| record(ty, name, state))
            .collect();
        self.registrations.lock().unwrap().insert(ty, Ok(records));
    }

    pub(crate) fn set_registration_records(&self, ty: ResourceType, records: Vec<RegistrationRecord>) {
        self.registrations.lock().unwrap().insert(ty, Ok(records));
    }

    pub(crate) fn fail_registrations(&self, ty: ResourceType, message: &str) {
        self.registrations
            .lock()
            .unwrap()
            .insert(ty, Err(message.to_owned()));
    }

    pub(crate) fn fail_endpoints(&self, fail: bool) {
        self.fail_endpoints.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_login_transport(&self, fail: bool) {
        self.fail_login_transport.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn panic_endpoints(&self, panic: bool) {
        self.panic_endpoints.store(panic, Ordering::SeqCst);
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
            + self.endpoint_calls.load(Ordering::SeqCst)
            + self.registration_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

pub(crate) fn record(ty: ResourceType, name: &str, state: &str) -> RegistrationRecord {
    RegistrationRecord {
        instance_name: Some(name.to_owned()),
        instance_type: Some(ty.to_string()),
        state: Some(state.to_owned()),
        ..RegistrationRecord::default()
    }
}

#[async_trait]
impl CommandBackend for FakeBackend {
    async fn login(
        &self,
        endpoint: &Url,
        namespace: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, Error> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_login_transport.load(Ordering::SeqCst) {
            return Err(Error::Backend {
                message: "controller unavailable".into(),
                code: None,
                status: 503,
            });
        }
        if password.expose_secret() != self.password.lock().unwrap().as_str() {
            return Err(Error::Authentication {
                message: "bad password".into(),
            });
        }
        Ok(Session::new(
            endpoint.clone(),
            namespace,
            username,
            SecretString::from("token"),
        ))
    }

    async fn show_config(&self, _session: &Session) -> Result<ControllerConfigRecord, Error> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let mut config = ControllerConfigRecord::default();
        config.metadata.name = Some("arc-dc".into());
        Ok(config)
    }

    async fn list_endpoints(&self, _session: &Session) -> Result<Vec<EndpointRecord>, Error> {
        self.endpoint_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        assert!(
            !self.panic_endpoints.load(Ordering::SeqCst),
            "endpoint listing blew up"
        );
        if self.fail_endpoints.load(Ordering::SeqCst) {
            return Err(Error::Backend {
                message: "endpoints unavailable".into(),
                code: None,
                status: 500,
            });
        }
        Ok(vec![EndpointRecord {
            name: "mgmtproxy".into(),
            description: None,
            endpoint: "https://10.0.0.4:30777".into(),
            protocol: Some("https".into()),
        }])
    }

    async fn list_registrations(
        &self,
        _session: &Session,
        resource_type: ResourceType,
    ) -> Result<Vec<RegistrationRecord>, Error> {
        self.registration_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let scripted = self.registrations.lock().unwrap().get(&resource_type).cloned();
        match scripted {
            None => Ok(Vec::new()),
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(Error::Backend {
                message,
                code: None,
                status: 500,
            }),
        }
    }
}
