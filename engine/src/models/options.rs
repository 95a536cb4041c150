//! Deployment request options

use serde::{Deserialize, Serialize};

/// Options attached to a deploy call.
///
/// Serialized camelCase and passed through opaquely to the remote client; the
/// engine does not interpret their runtime effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    /// Abort the whole unit if any component fails
    #[serde(default = "default_true")]
    pub rollback_on_error: bool,

    /// Validate-only deployment
    #[serde(default)]
    pub check_only: bool,

    /// Run tests during the deployment
    #[serde(default)]
    pub run_tests: bool,

    /// Retrieve the deployed payload after a successful deploy
    #[serde(default)]
    pub perform_retrieve: bool,

    /// Ordered debug category identifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debug_categories: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            rollback_on_error: true,
            check_only: false,
            run_tests: false,
            perform_retrieve: false,
            debug_categories: Vec::new(),
        }
    }
}
