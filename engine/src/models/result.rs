//! Deploy result models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EngineError;
use crate::normalize;

/// Outcome of one deploy call against one remote environment.
///
/// `success == false` is not an error: the remote call completed and reported
/// a validation/deployment failure as data. Only staging and transport
/// failures surface as [`EngineError`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DeployDetails>,

    /// Remaining response fields, preserved as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DeployResult {
    /// Decode a raw remote response, normalizing list-shaped fields first.
    ///
    /// This is the single boundary where response-shape fixups happen; by the
    /// time a `DeployResult` exists, every enumerated list field is a list.
    pub fn from_raw(raw: Value) -> Result<Self, EngineError> {
        let result = serde_json::from_value(normalize::normalize(raw))?;
        Ok(result)
    }
}

/// Per-component detail block of a deploy response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_failures: Option<Vec<ComponentMessage>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_successes: Option<Vec<ComponentMessage>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_test_result: Option<RunTestResult>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One component-level success or failure message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Test-run summary of a deploy response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_coverage_warnings: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
