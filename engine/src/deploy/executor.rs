//! Single-target deploy execution

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Settings;
use crate::errors::EngineError;
use crate::filesys::archive::Archive;
use crate::models::component::Component;
use crate::models::options::DeployOptions;
use crate::models::result::DeployResult;
use crate::project::Project;
use crate::remote::RemoteConnection;
use crate::staging::{self, Stager, StagingArea};

/// Stages and deploys components over the project's primary connection
pub struct DeployExecutor {
    project: Arc<Project>,
    primary: Arc<dyn RemoteConnection>,
    stager: Stager,
}

impl DeployExecutor {
    pub fn new(
        project: Arc<Project>,
        primary: Arc<dyn RemoteConnection>,
        settings: Settings,
    ) -> Self {
        Self {
            project,
            primary,
            stager: Stager::new(settings),
        }
    }

    /// Stage components into a deployable archive
    pub async fn stage(&self, components: &[Component]) -> Result<Archive, EngineError> {
        let (_area, archive) = self.stager.stage(&self.project, components).await?;
        Ok(archive)
    }

    /// Stage a destructive deployment into a deployable archive
    pub async fn stage_delete(&self, components: &[Component]) -> Result<Archive, EngineError> {
        let (_area, archive) = self.stager.stage_delete(components).await?;
        Ok(archive)
    }

    /// Deploy a single new component and, on success, mirror the created
    /// artifacts back into the project source tree using the inverse path
    /// rewrite of staging.
    ///
    /// A completed call reporting `success == false` still returns `Ok`;
    /// callers check the result's `success` flag. Only staging and transport
    /// failures are errors.
    pub async fn execute(
        &self,
        component: &Component,
        options: &DeployOptions,
    ) -> Result<DeployResult, EngineError> {
        info!(component = %component.name, "deploying component");

        let (area, archive) = self
            .stager
            .stage(&self.project, std::slice::from_ref(component))
            .await?;
        let result = self.send(&archive, options).await?;

        if result.success {
            self.copy_back(&area, component).await?;
        }

        debug!(component = %component.name, success = result.success, "deploy settled");
        Ok(result)
    }

    /// Stage-and-deploy components that already exist remotely; no copy-back
    pub async fn compile(&self, components: &[Component]) -> Result<DeployResult, EngineError> {
        debug!(components = components.len(), "compiling components");
        let (_area, archive) = self.stager.stage(&self.project, components).await?;
        let options = DeployOptions {
            rollback_on_error: true,
            ..DeployOptions::default()
        };
        self.send(&archive, &options).await
    }

    /// Deploy a pre-staged archive as-is
    pub async fn execute_archive(
        &self,
        archive: &Archive,
        options: &DeployOptions,
    ) -> Result<DeployResult, EngineError> {
        self.send(archive, options).await
    }

    async fn send(
        &self,
        archive: &Archive,
        options: &DeployOptions,
    ) -> Result<DeployResult, EngineError> {
        let bytes = archive.bytes().await?;
        let raw = self
            .primary
            .deploy(&bytes, options, &self.project.path())
            .await?;
        DeployResult::from_raw(raw)
    }

    async fn copy_back(
        &self,
        area: &StagingArea,
        component: &Component,
    ) -> Result<(), EngineError> {
        let staged = area.staged_path(&self.project, &component.path)?;
        let dest = area.project_path(&self.project, &staged)?;
        staging::copy_component_files(component, &staged, &dest).await
    }
}
