//! Deployment execution and orchestration

pub mod executor;
pub mod orchestrator;

pub use executor::DeployExecutor;
pub use orchestrator::Orchestrator;

#[cfg(test)]
pub(crate) mod support;
