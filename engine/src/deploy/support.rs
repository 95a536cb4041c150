//! Test doubles for the remote collaborator seams

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::errors::EngineError;
use crate::manifest::PackageSpec;
use crate::models::options::DeployOptions;
use crate::remote::{ConnectionFactory, CredentialStore, RemoteConnection, Retrieval};

/// Remote connection double that records calls and replays a canned response
pub struct RecordingConnection {
    username: String,
    response: Value,
    fail_deploy: bool,
    retrieval: Option<Vec<u8>>,
    pub deployed: Mutex<Vec<Vec<u8>>>,
    pub polling_timeout: AtomicU64,
}

impl RecordingConnection {
    pub fn new(username: &str, response: Value) -> Arc<Self> {
        Arc::new(Self {
            username: username.to_string(),
            response,
            fail_deploy: false,
            retrieval: None,
            deployed: Mutex::new(Vec::new()),
            polling_timeout: AtomicU64::new(0),
        })
    }

    pub fn failing(username: &str) -> Arc<Self> {
        Arc::new(Self {
            username: username.to_string(),
            response: Value::Null,
            fail_deploy: true,
            retrieval: None,
            deployed: Mutex::new(Vec::new()),
            polling_timeout: AtomicU64::new(0),
        })
    }

    pub fn with_retrieval(username: &str, response: Value, archive: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            username: username.to_string(),
            response,
            fail_deploy: false,
            retrieval: Some(archive),
            deployed: Mutex::new(Vec::new()),
            polling_timeout: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl RemoteConnection for RecordingConnection {
    fn username(&self) -> &str {
        &self.username
    }

    async fn deploy(
        &self,
        archive: &[u8],
        _options: &DeployOptions,
        _base_dir: &Path,
    ) -> Result<Value, EngineError> {
        if self.fail_deploy {
            return Err(EngineError::TransportError("connection reset".to_string()));
        }
        self.deployed.lock().unwrap().push(archive.to_vec());
        Ok(self.response.clone())
    }

    async fn retrieve_unpackaged(&self, _spec: &PackageSpec) -> Result<Retrieval, EngineError> {
        match &self.retrieval {
            Some(archive) => Ok(Retrieval {
                archive: archive.clone(),
                file_properties: json!([]),
            }),
            None => Err(EngineError::TransportError(
                "no retrieval configured".to_string(),
            )),
        }
    }

    fn set_polling_timeout(&self, ms: u64) {
        self.polling_timeout.store(ms, Ordering::SeqCst);
    }
}

/// Connection factory double keyed by username
#[derive(Default)]
pub struct StubFactory {
    connections: HashMap<String, Arc<RecordingConnection>>,
    pub seen_passwords: Mutex<Vec<(String, String)>>,
}

impl StubFactory {
    pub fn with(mut self, connection: Arc<RecordingConnection>) -> Self {
        self.connections
            .insert(connection.username().to_string(), connection);
        self
    }
}

#[async_trait]
impl ConnectionFactory for StubFactory {
    async fn connect(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<dyn RemoteConnection>, EngineError> {
        self.seen_passwords
            .lock()
            .unwrap()
            .push((username.to_string(), password.expose_secret().to_string()));
        self.connections
            .get(username)
            .cloned()
            .map(|c| c as Arc<dyn RemoteConnection>)
            .ok_or_else(|| {
                EngineError::TransportError(format!("unknown environment for {}", username))
            })
    }
}

/// Credential store double
#[derive(Default)]
pub struct StubStore {
    passwords: HashMap<String, String>,
    pub lookups: Mutex<Vec<String>>,
}

impl StubStore {
    pub fn with(mut self, id: &str, password: &str) -> Self {
        self.passwords.insert(id.to_string(), password.to_string());
        self
    }
}

#[async_trait]
impl CredentialStore for StubStore {
    async fn get_password(&self, target_id: &str) -> Result<SecretString, EngineError> {
        self.lookups.lock().unwrap().push(target_id.to_string());
        self.passwords
            .get(target_id)
            .map(|p| SecretString::from(p.clone()))
            .ok_or_else(|| EngineError::NotFound(format!("no stored password for {}", target_id)))
    }
}
