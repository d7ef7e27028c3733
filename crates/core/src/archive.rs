//! Zip artifact extraction.
//!
//! Recreates the archive's directory tree under a target directory, restores
//! unix modes recorded in the archive, and overwrites files already present.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Counts gathered while extracting an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Regular files written
    pub files: usize,
    /// Directory entries created
    pub directories: usize,
    /// Uncompressed bytes written
    pub bytes: u64,
}

/// Extract the zip archive at `archive` into `target`.
///
/// Entries whose names would land outside `target` fail the whole
/// extraction. Directory modes are applied once every file is written so a
/// read-only directory entry cannot block its own children.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the archive is corrupt or holds an unsafe
/// entry, and an IO error if writing to `target` fails.
pub fn extract_zip(archive: &Path, target: &Path) -> Result<ExtractionSummary> {
    let file = File::open(archive)
        .map_err(|e| Error::archive(archive, format!("cannot open archive: {e}")))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::archive(archive, format!("failed to open zip: {e}")))?;

    fs::create_dir_all(target)?;

    let mut summary = ExtractionSummary::default();
    let mut directory_modes: Vec<(PathBuf, u32)> = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| Error::archive(archive, format!("failed to read zip entry: {e}")))?;

        let relative = entry.enclosed_name().ok_or_else(|| {
            Error::archive(
                archive,
                format!("entry '{}' escapes the extraction directory", entry.name()),
            )
        })?;
        let outpath = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            if let Some(mode) = entry.unix_mode() {
                directory_modes.push((outpath, mode));
            }
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        // Removing first lets a read-only leftover be replaced.
        if outpath.is_file() {
            fs::remove_file(&outpath)?;
        }

        let mut out = File::create(&outpath)?;
        let written = io::copy(&mut entry, &mut out).map_err(|e| {
            Error::archive(archive, format!("failed to read '{}': {e}", entry.name()))
        })?;
        drop(out);

        if let Some(mode) = entry.unix_mode() {
            set_mode(&outpath, mode)?;
        }

        debug!(path = %outpath.display(), bytes = written, "Extracted file");
        summary.files += 1;
        summary.bytes += written;
    }

    // Deepest first, so parents are still writable while children change.
    directory_modes.sort_by(|a, b| b.0.components().count().cmp(&a.0.components().count()));
    for (path, mode) in directory_modes {
        set_mode(&path, mode)?;
    }

    Ok(summary)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
