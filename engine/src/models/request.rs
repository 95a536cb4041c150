//! Deployment request aggregate

use crate::models::component::Component;
use crate::models::options::DeployOptions;
use crate::models::target::Target;

/// A caller-supplied deployment request.
///
/// For additive deployments `components` is the set to create or update; for
/// destructive deployments it is the set to remove.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRequest {
    /// Component set
    pub components: Vec<Component>,

    /// Target connections; empty means the project's default connection
    pub targets: Vec<Target>,

    /// Options bag, passed through opaquely to the remote client
    pub options: DeployOptions,
}
