//! Target connection models

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::result::DeployResult;

/// One remote environment a deployment may be sent to.
///
/// Carries either an inline credential or an id to look one up in the
/// credential store; resolution happens lazily at dispatch time.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    /// Connection id, used as the credential-store lookup key
    pub id: String,

    /// Username, used as the target's identity in deployment results
    pub username: String,

    /// Environment kind, e.g. "production", "sandbox", "developer"
    #[serde(default)]
    pub environment: Option<String>,

    /// Inline credential; absent when the password lives in the store
    #[serde(default, deserialize_with = "deserialize_opt_secret")]
    pub password: Option<SecretString>,
}

impl Target {
    /// Create a target without an inline credential
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            environment: None,
            password: None,
        }
    }

    /// Attach an inline credential
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }
}

fn deserialize_opt_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(SecretString::from))
}

/// Per-target outcome record of a multi-target deployment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOutcome {
    /// Whether the target's deploy call completed and reported success
    pub success: bool,

    /// Normalized deploy result, when the call completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DeployResult>,

    /// Wrapped error message, when the dispatch failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When this target's dispatch settled
    pub finished_at: DateTime<Utc>,
}

impl TargetOutcome {
    /// Record a completed deploy call
    pub fn deployed(result: DeployResult) -> Self {
        Self {
            success: result.success,
            result: Some(result),
            error: None,
            finished_at: Utc::now(),
        }
    }

    /// Record a failed dispatch
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
            finished_at: Utc::now(),
        }
    }
}
