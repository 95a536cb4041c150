//! Staging area assembly
//!
//! Lays out an ephemeral directory tree mirroring the archive layout
//! contract: a canonical `unpackaged/` root holding the manifest document(s)
//! and each component file under its project-relative sub-folder, then cuts a
//! single deployable zip from that tree.
//!
//! Within one staging operation the order is fixed: manifest write, then
//! component copies, then archiving — the archiver snapshots the tree at
//! invocation time. A staging area is never shared between concurrent
//! operations; every operation allocates its own uniquely named root.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Settings;
use crate::errors::EngineError;
use crate::filesys::archive::{self, Archive};
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::manifest::{self, ManifestBuilder, ADDITIVE_MANIFEST, DESTRUCTIVE_MANIFEST};
use crate::models::component::{self, Component};
use crate::project::Project;

/// Canonical root directory inside a staging area
pub const UNPACKAGED: &str = "unpackaged";

/// Archive file name, collocated with the staged root
pub const ARCHIVE_NAME: &str = "unpackaged.zip";

/// Substitute the `from` prefix with `to` in `path`.
///
/// A pure path rewrite preserving the nested sub-folder layout exactly;
/// returns `None` when `path` does not start with `from`. Rewriting
/// `from -> to` then `to -> from` yields the original path.
pub fn rewrite_prefix(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(from).ok()?;
    Some(to.join(relative))
}

/// An ephemeral directory tree assembled for one deployment operation
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: Dir,
}

impl StagingArea {
    /// Allocate a fresh, uniquely named staging root with its `unpackaged`
    /// directory
    pub async fn create(settings: &Settings) -> Result<Self, EngineError> {
        let root = Dir::create_temp_dir(&settings.staging_prefix).await?;
        root.subdir(UNPACKAGED).create().await?;
        debug!(root = %root.path().display(), "staging area created");
        Ok(Self { root })
    }

    /// Staging root directory
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// The `unpackaged` directory inside the root
    pub fn unpackaged(&self) -> PathBuf {
        self.root.path().join(UNPACKAGED)
    }

    /// Rewrite a project source path into this staging tree
    pub fn staged_path(&self, project: &Project, path: &Path) -> Result<PathBuf, EngineError> {
        rewrite_prefix(path, &project.source_root(), &self.unpackaged()).ok_or_else(|| {
            EngineError::StagingError(format!(
                "component path {} is outside the project source tree",
                path.display()
            ))
        })
    }

    /// Inverse rewrite, from this staging tree back into the project source
    /// tree
    pub fn project_path(&self, project: &Project, staged: &Path) -> Result<PathBuf, EngineError> {
        rewrite_prefix(staged, &self.unpackaged(), &project.source_root()).ok_or_else(|| {
            EngineError::StagingError(format!(
                "path {} is outside the staging tree",
                staged.display()
            ))
        })
    }

    /// Write a manifest document at the `unpackaged` root
    pub async fn write_manifest(&self, file_name: &str, document: &str) -> Result<(), EngineError> {
        self.root
            .subdir(UNPACKAGED)
            .file(file_name)
            .write_string(document)
            .await
    }

    /// Extract a retrieved snapshot archive into this staging area.
    ///
    /// Snapshot entries are rooted at `unpackaged/`, so the extracted tree
    /// lands under the canonical root.
    pub fn materialize(&self, data: &[u8]) -> Result<(), EngineError> {
        archive::extract_archive(data, self.root.path())
    }

    /// Archive the `unpackaged` tree into `unpackaged.zip` at the root
    pub fn archive(&self) -> Result<Archive, EngineError> {
        archive::zip_directory(&self.unpackaged(), &self.root.path().join(ARCHIVE_NAME))
    }

    /// Archive the `unpackaged` tree into a uniquely named zip.
    ///
    /// Used by concurrent per-target dispatches so each snapshot gets its own
    /// file and the shared tree stays read-only.
    pub fn archive_snapshot(&self) -> Result<Archive, EngineError> {
        let name = format!("unpackaged-{}.zip", uuid::Uuid::new_v4());
        archive::zip_directory(&self.unpackaged(), &self.root.path().join(name))
    }

    /// Remove the staging root and everything inside it
    pub async fn cleanup(self) -> Result<(), EngineError> {
        self.root.delete().await
    }
}

/// Assembles staging areas and deployment archives
#[derive(Debug, Clone)]
pub struct Stager {
    settings: Settings,
    builder: ManifestBuilder,
}

impl Stager {
    pub fn new(settings: Settings) -> Self {
        let builder = ManifestBuilder::new(&settings);
        Self { settings, builder }
    }

    /// Stage components for an additive deployment and archive them
    pub async fn stage(
        &self,
        project: &Project,
        components: &[Component],
    ) -> Result<(StagingArea, Archive), EngineError> {
        self.stage_inner(project, components).await.map_err(|e| {
            EngineError::StagingError(format!("could not prepare metadata for deployment: {}", e))
        })
    }

    /// Stage a destructive deployment: a non-empty destructive manifest plus
    /// an empty additive one — the remote service requires both files even
    /// when one is empty.
    pub async fn stage_delete(
        &self,
        components: &[Component],
    ) -> Result<(StagingArea, Archive), EngineError> {
        self.stage_delete_inner(components)
            .await
            .map_err(|e| {
                EngineError::StagingError(format!(
                    "could not prepare metadata for deletion: {}",
                    e
                ))
            })
    }

    async fn stage_inner(
        &self,
        project: &Project,
        components: &[Component],
    ) -> Result<(StagingArea, Archive), EngineError> {
        let area = StagingArea::create(&self.settings).await?;

        let spec = manifest::group_by_type(components);
        area.write_manifest(ADDITIVE_MANIFEST, &self.builder.build(&spec))
            .await?;

        for component in components {
            let staged = area.staged_path(project, &component.path)?;
            copy_component_files(component, &component.path, &staged).await?;
        }

        let archive = area.archive()?;
        debug!(
            components = components.len(),
            digest = %archive.digest(),
            "deployment staged"
        );
        Ok((area, archive))
    }

    async fn stage_delete_inner(
        &self,
        components: &[Component],
    ) -> Result<(StagingArea, Archive), EngineError> {
        let area = StagingArea::create(&self.settings).await?;

        let spec = manifest::group_by_type(components);
        area.write_manifest(DESTRUCTIVE_MANIFEST, &self.builder.build(&spec))
            .await?;
        area.write_manifest(ADDITIVE_MANIFEST, &self.builder.build_empty())
            .await?;

        let archive = area.archive()?;
        debug!(
            components = components.len(),
            digest = %archive.digest(),
            "deletion staged"
        );
        Ok((area, archive))
    }
}

/// Copy a component's primary file from `src` to `dst`, plus its companion
/// descriptor when one is declared, applying the suffix convention in both
/// directions (content to descriptor and back).
pub async fn copy_component_files(
    component: &Component,
    src: &Path,
    dst: &Path,
) -> Result<(), EngineError> {
    File::new(src).copy_to(dst).await?;

    if component.has_companion {
        if component.is_companion {
            // the primary path is the descriptor; bring the content file along
            let content_src = component::content_path(src);
            let content_dst = component::content_path(dst);
            if let (Some(content_src), Some(content_dst)) = (content_src, content_dst) {
                File::new(content_src).copy_to(content_dst).await?;
            }
        } else {
            File::new(component::companion_path(src))
                .copy_to(component::companion_path(dst))
                .await?;
        }
    }

    Ok(())
}
