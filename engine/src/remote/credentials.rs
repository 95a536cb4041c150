//! Credential store collaborator interface

use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::EngineError;

/// Looks up stored passwords by target connection id.
///
/// Whether the backing store is a keyring or a plaintext file is the
/// collaborator's concern.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_password(&self, target_id: &str) -> Result<SecretString, EngineError>;
}
