//! CBZ packaging
//!
//! Packs staged page files, in the exact order given, into a CBZ (stored-only
//! zip). The archive is written to a temporary sibling path and renamed to the
//! target only on full success, so a failed attempt never leaves a corrupt or
//! partial artifact visible to callers.

use crate::error::ArchiveError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::FileOptions;

/// Writer for CBZ chapter archives
pub struct CbzWriter;

impl CbzWriter {
    /// Package `ordered_files` into a CBZ at `target`
    ///
    /// Entry order in the archive is the slice order; entry names are the
    /// staged filenames (zero-padded sequence numbers). Fails with
    /// [`ArchiveError::EmptyInput`] when there is nothing to pack.
    pub async fn pack(ordered_files: Vec<PathBuf>, target: PathBuf) -> Result<(), ArchiveError> {
        if ordered_files.is_empty() {
            return Err(ArchiveError::EmptyInput);
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Temp path in the same directory so the final rename stays on one
        // filesystem.
        let temp_path = {
            let mut os = target.clone().into_os_string();
            os.push(".partial");
            PathBuf::from(os)
        };

        let blocking_temp = temp_path.clone();
        let blocking_target = target.clone();
        let result = tokio::task::spawn_blocking(move || {
            write_cbz(&ordered_files, &blocking_temp, &blocking_target)
        })
        .await
        .map_err(|e| ArchiveError::Write {
            path: target.clone(),
            reason: format!("archive task panicked: {e}"),
        })?;

        if let Err(e) = result {
            if let Err(cleanup_err) = tokio::fs::remove_file(&temp_path).await {
                if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup_err, "failed to remove partial archive");
                }
            }
            return Err(e);
        }

        tokio::fs::rename(&temp_path, &target).await?;
        info!(path = %target.display(), "chapter archive written");
        Ok(())
    }
}

fn write_cbz(files: &[PathBuf], temp_path: &Path, target: &Path) -> Result<(), ArchiveError> {
    let file = std::fs::File::create(temp_path)?;
    let mut zip = zip::ZipWriter::new(file);

    // Page images are already compressed; store them as-is
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArchiveError::Write {
                path: target.to_path_buf(),
                reason: format!("staged file has no filename: {}", path.display()),
            })?;

        zip.start_file(name, options).map_err(|e| ArchiveError::Write {
            path: target.to_path_buf(),
            reason: format!("failed to start entry: {e}"),
        })?;

        let data = std::fs::read(path)?;
        zip.write_all(&data)?;
    }

    zip.finish().map_err(|e| ArchiveError::Write {
        path: target.to_path_buf(),
        reason: format!("failed to finish archive: {e}"),
    })?;

    Ok(())
}
