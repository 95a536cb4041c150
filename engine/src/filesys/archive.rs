//! Zip archive assembly and extraction
//!
//! Builds the deployable `unpackaged.zip` from a populated staging tree and
//! extracts retrieved snapshots back into one. Archives are assembled in
//! memory so the content digest can be computed before anything hits disk.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::EngineError;

/// A built deployment archive on disk
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    digest: String,
}

impl Archive {
    /// Path of the zip file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 hex digest of the zip content
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Read the archive content
    pub async fn bytes(&self) -> Result<Vec<u8>, EngineError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(bytes)
    }
}

/// Zip the contents of `dir` into the file `dest`.
///
/// Entries are rooted at the directory's own name, so archiving
/// `<staging>/unpackaged` produces entries like `unpackaged/manifest.xml`.
/// Entry order is sorted by relative path, making output deterministic for a
/// given tree.
pub fn zip_directory(dir: &Path, dest: &Path) -> Result<Archive, EngineError> {
    let root = dir
        .file_name()
        .ok_or_else(|| EngineError::StagingError(format!("not a directory: {}", dir.display())))?
        .to_string_lossy()
        .into_owned();

    let mut entries = Vec::new();
    collect_files(dir, dir, &mut entries)?;
    entries.sort();

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for relative in &entries {
            let name = zip_entry_name(&root, relative);
            zip.start_file(name, options)?;
            let data = std::fs::read(dir.join(relative))?;
            zip.write_all(&data)?;
        }
        zip.finish()?;
    }

    let bytes = buf.into_inner();
    let digest = hex::encode(Sha256::digest(&bytes));
    std::fs::write(dest, &bytes)?;

    debug!(
        archive = %dest.display(),
        entries = entries.len(),
        digest = %digest,
        "archive assembled"
    );

    Ok(Archive {
        path: dest.to_path_buf(),
        digest,
    })
}

/// Extract a zip archive into `dest`.
///
/// Entry names are sanitized before joining, so archives cannot write outside
/// the destination directory.
pub fn extract_archive(data: &[u8], dest: &Path) -> Result<(), EngineError> {
    std::fs::create_dir_all(dest)?;

    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        // Skip entries with unsafe paths
        let outpath = match file.enclosed_name() {
            Some(path) => dest.join(path),
            None => continue,
        };

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer)?;
            std::fs::write(&outpath, &buffer)?;
        }
    }

    Ok(())
}

fn collect_files(root: &Path, dir: &Path, entries: &mut Vec<PathBuf>) -> Result<(), EngineError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, entries)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| EngineError::StagingError(e.to_string()))?;
            entries.push(relative.to_path_buf());
        }
    }
    Ok(())
}

fn zip_entry_name(root: &str, relative: &Path) -> String {
    let mut name = root.to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

/// Hex encoding utilities
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(data: impl AsRef<[u8]>) -> String {
        let data = data.as_ref();
        let mut result = String::with_capacity(data.len() * 2);
        for byte in data {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
