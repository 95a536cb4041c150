//! Remote connection interfaces
//!
//! Authentication, the wire protocol and long-poll status checking live in
//! the remote client collaborator; the engine consumes it through these
//! traits only.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

use crate::errors::EngineError;
use crate::manifest::PackageSpec;
use crate::models::options::DeployOptions;

/// Result of retrieving an unpackaged snapshot
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Zip archive of the unpackaged tree, entries rooted at `unpackaged/`
    pub archive: Vec<u8>,

    /// Per-file properties reported by the remote service
    pub file_properties: Value,
}

/// An initialized connection to one remote environment
#[async_trait]
pub trait RemoteConnection: Send + Sync {
    /// Username this connection is authenticated as
    fn username(&self) -> &str;

    /// Deploy an archive with the given options.
    ///
    /// `base_dir` is the project root the client may use to resolve relative
    /// artifacts; it is passed explicitly rather than read from the process
    /// working directory.
    async fn deploy(
        &self,
        archive: &[u8],
        options: &DeployOptions,
        base_dir: &Path,
    ) -> Result<Value, EngineError>;

    /// Retrieve an unpackaged snapshot for a package spec
    async fn retrieve_unpackaged(&self, spec: &PackageSpec) -> Result<Retrieval, EngineError>;

    /// Set the long-poll timeout for subsequent calls, in milliseconds
    fn set_polling_timeout(&self, ms: u64);
}

/// Opens connections scoped to a target's credentials
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<dyn RemoteConnection>, EngineError>;
}
