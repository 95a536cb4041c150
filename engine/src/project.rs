//! Local project context

use std::path::PathBuf;

use crate::errors::EngineError;
use crate::filesys::file::File;
use crate::models::target::Target;

/// File holding the project's saved target connections, relative to the
/// project root
const CONNECTIONS_FILE: &str = "config/.connections.json";

/// A local project inside a workspace directory.
///
/// The source tree layout contract is `<workspace>/<name>/src`.
#[derive(Debug, Clone)]
pub struct Project {
    workspace: PathBuf,
    name: String,
}

impl Project {
    pub fn new(workspace: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            name: name.into(),
        }
    }

    /// Project name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project root, `<workspace>/<name>`
    pub fn path(&self) -> PathBuf {
        self.workspace.join(&self.name)
    }

    /// Source tree root, `<workspace>/<name>/src`
    pub fn source_root(&self) -> PathBuf {
        self.path().join("src")
    }

    /// Load the project's saved target connections.
    ///
    /// A missing connections file is an empty list, not an error.
    pub async fn load_targets(&self) -> Result<Vec<Target>, EngineError> {
        let file = File::new(self.path().join(CONNECTIONS_FILE));
        if !file.exists().await {
            return Ok(Vec::new());
        }
        file.read_json().await.map_err(|e| {
            EngineError::ConfigError(format!("could not load target connections: {}", e))
        })
    }
}
