//! Engine settings

use serde::{Deserialize, Serialize};

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API version stamped into generated manifests
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// XML namespace of the manifest document root
    #[serde(default = "default_manifest_namespace")]
    pub manifest_namespace: String,

    /// Long-poll timeout applied to per-target deploy connections, in
    /// milliseconds. Distinct from any global client default.
    #[serde(default = "default_polling_timeout_ms")]
    pub polling_timeout_ms: u64,

    /// Prefix for uniquely named staging directories
    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,
}

fn default_api_version() -> String {
    "34.0".to_string()
}

fn default_manifest_namespace() -> String {
    "http://soap.sforce.com/2006/04/metadata".to_string()
}

fn default_polling_timeout_ms() -> u64 {
    300_000
}

fn default_staging_prefix() -> String {
    "ms".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            manifest_namespace: default_manifest_namespace(),
            polling_timeout_ms: default_polling_timeout_ms(),
            staging_prefix: default_staging_prefix(),
        }
    }
}
