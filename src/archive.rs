//! Archive packaging.
//!
//! Packages a resolved file set into a single zip archive. Member names are
//! relative to the file set's root so the archive never records absolute
//! local paths.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::fileset::FileSet;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// Writes every file of `fileset` into a zip archive at `dest`, replacing
/// any previous archive there.
///
/// The archive is first written to a `.partial` sibling and renamed over
/// `dest` once complete, so a failed run leaves any previous archive at
/// `dest` untouched. Parent directories of `dest` are created if missing.
pub fn write(fileset: &FileSet, dest: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let staging = staging_path(dest)?;

    let result = write_entries(fileset, &staging);
    if result.is_err() {
        let _ = fs::remove_file(&staging);
        return result;
    }
    fs::rename(&staging, dest)?;
    Ok(())
}

fn write_entries(fileset: &FileSet, staging: &Path) -> Result<(), ArchiveError> {
    let file = File::create(staging)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::<()>::default();

    for path in fileset.files() {
        let name = path
            .strip_prefix(fileset.root())
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        zip.start_file(name, options)?;
        let mut f = File::open(path)?;
        io::copy(&mut f, &mut zip)?;
    }
    zip.finish()?;
    Ok(())
}

fn staging_path(dest: &Path) -> Result<PathBuf, ArchiveError> {
    let Some(name) = dest.file_name() else {
        return Err(ArchiveError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "archive destination has no file name",
        )));
    };
    let mut staging = name.to_os_string();
    staging.push(".partial");
    Ok(dest.with_file_name(staging))
}
