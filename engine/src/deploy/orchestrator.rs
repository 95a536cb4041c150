//! Multi-target deploy orchestration
//!
//! Retrieves one baseline snapshot of the requested package, materializes it
//! into a staging tree shared read-only by every target, and fans the deploy
//! out concurrently. Dispatches settle independently: each target gets its
//! own outcome record and one target's failure never discards the results of
//! the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use secrecy::SecretString;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::errors::EngineError;
use crate::manifest::{self, PackageSpec};
use crate::models::options::DeployOptions;
use crate::models::request::DeploymentRequest;
use crate::models::result::DeployResult;
use crate::models::target::{Target, TargetOutcome};
use crate::project::Project;
use crate::remote::{ConnectionFactory, CredentialStore, RemoteConnection};
use crate::staging::StagingArea;

/// Fans one deployment out to multiple target environments
pub struct Orchestrator {
    project: Arc<Project>,
    primary: Arc<dyn RemoteConnection>,
    connections: Arc<dyn ConnectionFactory>,
    credentials: Arc<dyn CredentialStore>,
    settings: Settings,
}

impl Orchestrator {
    pub fn new(
        project: Arc<Project>,
        primary: Arc<dyn RemoteConnection>,
        connections: Arc<dyn ConnectionFactory>,
        credentials: Arc<dyn CredentialStore>,
        settings: Settings,
    ) -> Self {
        Self {
            project,
            primary,
            connections,
            credentials,
            settings,
        }
    }

    /// Execute a full deployment request: the package spec is derived from
    /// the request's components and shipped to its targets.
    pub async fn execute_request(
        &self,
        request: &DeploymentRequest,
    ) -> Result<BTreeMap<String, TargetOutcome>, EngineError> {
        let spec = manifest::group_by_type(&request.components);
        self.execute_remote(&spec, &request.targets, &request.options)
            .await
    }

    /// Deploy one retrieved package snapshot to every target concurrently.
    ///
    /// The snapshot is retrieved once from the primary connection; each
    /// dispatch cuts its own archive from the shared tree, resolves its
    /// target's credential and opens its own scoped connection. An empty
    /// target list deploys over the primary connection instead.
    pub async fn execute_remote(
        &self,
        spec: &PackageSpec,
        targets: &[Target],
        options: &DeployOptions,
    ) -> Result<BTreeMap<String, TargetOutcome>, EngineError> {
        info!(targets = targets.len(), "starting multi-target deployment");

        let retrieval = self.primary.retrieve_unpackaged(spec).await.map_err(|e| {
            EngineError::TransportError(format!("could not retrieve deployment package: {}", e))
        })?;

        let area = StagingArea::create(&self.settings).await?;
        area.materialize(&retrieval.archive)?;

        if targets.is_empty() {
            let username = self.primary.username().to_string();
            let outcome = match self.deploy_over(self.primary.clone(), &area, options).await {
                Ok(result) => TargetOutcome::deployed(result),
                Err(err) => {
                    error!(target = %username, error = %err, "deploy failed");
                    TargetOutcome::failed(format!(
                        "could not deploy to target: {}: {}",
                        username, err
                    ))
                }
            };
            return Ok(BTreeMap::from([(username, outcome)]));
        }

        let dispatches = targets.iter().map(|target| {
            let area = &area;
            async move {
                let outcome = match self.deploy_to_target(target, area, options).await {
                    Ok(result) => {
                        debug!(
                            target = %target.username,
                            success = result.success,
                            "target deploy settled"
                        );
                        TargetOutcome::deployed(result)
                    }
                    Err(err) => {
                        error!(target = %target.username, error = %err, "target deploy failed");
                        TargetOutcome::failed(format!(
                            "could not deploy to target: {}: {}",
                            target.username, err
                        ))
                    }
                };
                (target.username.clone(), outcome)
            }
        });

        Ok(join_all(dispatches).await.into_iter().collect())
    }

    async fn deploy_to_target(
        &self,
        target: &Target,
        area: &StagingArea,
        options: &DeployOptions,
    ) -> Result<DeployResult, EngineError> {
        let password = self.resolve_password(target).await?;
        let connection = self.connections.connect(&target.username, &password).await?;
        self.deploy_over(connection, area, options).await
    }

    async fn deploy_over(
        &self,
        connection: Arc<dyn RemoteConnection>,
        area: &StagingArea,
        options: &DeployOptions,
    ) -> Result<DeployResult, EngineError> {
        // fresh archive per dispatch; the shared tree stays read-only
        let archive = area.archive_snapshot()?;
        connection.set_polling_timeout(self.settings.polling_timeout_ms);
        let bytes = archive.bytes().await?;
        let raw = connection
            .deploy(&bytes, options, &self.project.path())
            .await?;
        DeployResult::from_raw(raw)
    }

    async fn resolve_password(&self, target: &Target) -> Result<SecretString, EngineError> {
        if let Some(password) = &target.password {
            return Ok(password.clone());
        }
        self.credentials
            .get_password(&target.id)
            .await
            .map_err(|e| {
                EngineError::CredentialError(format!(
                    "could not resolve credential for target: {}: {}",
                    target.username, e
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::support::{RecordingConnection, StubFactory, StubStore};
    use crate::filesys::archive;
    use serde_json::json;

    /// Build a retrieval snapshot zip holding one widget plus a manifest
    fn snapshot_archive() -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("unpackaged");
        std::fs::create_dir_all(root.join("widgets")).unwrap();
        std::fs::write(root.join("manifest.xml"), "<Package/>").unwrap();
        std::fs::write(root.join("widgets/Foo.widget"), "widget body").unwrap();
        let built = archive::zip_directory(&root, &dir.path().join("unpackaged.zip")).unwrap();
        std::fs::read(built.path()).unwrap()
    }

    fn fixture() -> (tempfile::TempDir, Arc<Project>) {
        let dir = tempfile::tempdir().unwrap();
        let project = Arc::new(Project::new(dir.path(), "myproj"));
        (dir, project)
    }

    fn primary() -> Arc<RecordingConnection> {
        RecordingConnection::with_retrieval(
            "primary@example.org",
            json!({ "success": true }),
            snapshot_archive(),
        )
    }

    #[tokio::test]
    async fn test_one_target_failure_does_not_discard_others() {
        let (_dir, project) = fixture();
        let good = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let bad = RecordingConnection::failing("b@example.org");
        let factory = Arc::new(StubFactory::default().with(good.clone()).with(bad));
        let store = Arc::new(StubStore::default().with("ta", "pw-a").with("tb", "pw-b"));

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory,
            store,
            Settings::default(),
        );
        let targets = vec![
            Target::new("ta", "a@example.org"),
            Target::new("tb", "b@example.org"),
        ];
        let results = orchestrator
            .execute_remote(&PackageSpec::new(), &targets, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results["a@example.org"].success);
        assert!(results["a@example.org"].result.is_some());

        let failed = &results["b@example.org"];
        assert!(!failed.success);
        assert!(failed
            .error
            .as_deref()
            .unwrap()
            .contains("could not deploy to target: b@example.org"));
    }

    #[tokio::test]
    async fn test_credentials_resolved_from_store_when_not_inline() {
        let (_dir, project) = fixture();
        let conn = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default().with(conn));
        let store = Arc::new(StubStore::default().with("ta", "stored-secret"));

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory.clone(),
            store.clone(),
            Settings::default(),
        );
        let targets = vec![Target::new("ta", "a@example.org")];
        orchestrator
            .execute_remote(&PackageSpec::new(), &targets, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(*store.lookups.lock().unwrap(), vec!["ta".to_string()]);
        let seen = factory.seen_passwords.lock().unwrap();
        assert_eq!(seen[0], ("a@example.org".to_string(), "stored-secret".to_string()));
    }

    #[tokio::test]
    async fn test_inline_credentials_skip_the_store() {
        let (_dir, project) = fixture();
        let conn = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default().with(conn));
        let store = Arc::new(StubStore::default());

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory.clone(),
            store.clone(),
            Settings::default(),
        );
        let targets = vec![Target::new("ta", "a@example.org").with_password("inline-secret")];
        orchestrator
            .execute_remote(&PackageSpec::new(), &targets, &DeployOptions::default())
            .await
            .unwrap();

        assert!(store.lookups.lock().unwrap().is_empty());
        let seen = factory.seen_passwords.lock().unwrap();
        assert_eq!(seen[0].1, "inline-secret");
    }

    #[tokio::test]
    async fn test_missing_credential_is_a_per_target_failure() {
        let (_dir, project) = fixture();
        let conn = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default().with(conn));
        let store = Arc::new(StubStore::default());

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory,
            store,
            Settings::default(),
        );
        let targets = vec![Target::new("ta", "a@example.org")];
        let results = orchestrator
            .execute_remote(&PackageSpec::new(), &targets, &DeployOptions::default())
            .await
            .unwrap();

        let outcome = &results["a@example.org"];
        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("could not resolve credential"));
    }

    #[tokio::test]
    async fn test_every_target_receives_the_shared_snapshot() {
        let (_dir, project) = fixture();
        let a = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let b = RecordingConnection::new("b@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default().with(a.clone()).with(b.clone()));
        let store = Arc::new(StubStore::default().with("ta", "pw").with("tb", "pw"));

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory,
            store,
            Settings::default(),
        );
        let targets = vec![
            Target::new("ta", "a@example.org"),
            Target::new("tb", "b@example.org"),
        ];
        orchestrator
            .execute_remote(&PackageSpec::new(), &targets, &DeployOptions::default())
            .await
            .unwrap();

        for conn in [a, b] {
            let deployed = conn.deployed.lock().unwrap();
            assert_eq!(deployed.len(), 1);
            let mut zip =
                zip::ZipArchive::new(std::io::Cursor::new(deployed[0].clone())).unwrap();
            assert!(zip.by_name("unpackaged/widgets/Foo.widget").is_ok());
        }
    }

    #[tokio::test]
    async fn test_polling_timeout_applied_to_target_connections() {
        let (_dir, project) = fixture();
        let conn = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default().with(conn.clone()));
        let store = Arc::new(StubStore::default().with("ta", "pw"));

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory,
            store,
            Settings::default(),
        );
        let targets = vec![Target::new("ta", "a@example.org")];
        orchestrator
            .execute_remote(&PackageSpec::new(), &targets, &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(
            conn.polling_timeout
                .load(std::sync::atomic::Ordering::SeqCst),
            300_000
        );
    }

    #[tokio::test]
    async fn test_empty_target_list_uses_primary_connection() {
        let (_dir, project) = fixture();
        let primary = primary();
        let factory = Arc::new(StubFactory::default());
        let store = Arc::new(StubStore::default());

        let orchestrator = Orchestrator::new(
            project,
            primary.clone(),
            factory,
            store,
            Settings::default(),
        );
        let results = orchestrator
            .execute_remote(&PackageSpec::new(), &[], &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results["primary@example.org"].success);
        assert_eq!(primary.deployed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_failure_fails_the_whole_operation() {
        let (_dir, project) = fixture();
        // primary without a configured retrieval snapshot
        let primary = RecordingConnection::new("primary@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default());
        let store = Arc::new(StubStore::default());

        let orchestrator = Orchestrator::new(
            project,
            primary,
            factory,
            store,
            Settings::default(),
        );
        let err = orchestrator
            .execute_remote(&PackageSpec::new(), &[], &DeployOptions::default())
            .await
            .unwrap_err();

        assert!(err
            .to_string()
            .contains("could not retrieve deployment package"));
    }

    #[tokio::test]
    async fn test_execute_request_derives_spec_from_components() {
        let (_dir, project) = fixture();
        let conn = RecordingConnection::new("a@example.org", json!({ "success": true }));
        let factory = Arc::new(StubFactory::default().with(conn));
        let store = Arc::new(StubStore::default().with("ta", "pw"));

        let orchestrator = Orchestrator::new(
            project,
            primary(),
            factory,
            store,
            Settings::default(),
        );
        let request = DeploymentRequest {
            components: Vec::new(),
            targets: vec![Target::new("ta", "a@example.org")],
            options: DeployOptions::default(),
        };
        let results = orchestrator.execute_request(&request).await.unwrap();
        assert!(results["a@example.org"].success);
    }
}
