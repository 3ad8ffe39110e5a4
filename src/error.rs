//! Failure taxonomy for the plan pipeline.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::{fmt, io};

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::fileset::FilesetError;
use crate::store::UploadError;

/// The pipeline stage a [`StageError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Command,
    Archive,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Command => "command",
            Stage::Archive => "archive",
            Stage::Upload => "upload",
        };
        f.write_str(name)
    }
}

/// A failure of a single stage of one plan run.
///
/// Stage errors never cross the plan boundary as errors; the plan run
/// captures them into its outcome and the orchestrator handles them as data.
#[derive(Debug, Error)]
pub enum StageError {
    /// The preparation command ran but exited unsuccessfully.
    #[error("command failed with {status}")]
    Command { status: ExitStatus },
    /// The preparation command could not be started at all.
    #[error("failed to start command: {source}")]
    CommandSpawn {
        #[source]
        source: io::Error,
    },
    /// Source pattern resolution failed, including the zero-match case.
    #[error(transparent)]
    Fileset(#[from] FilesetError),
    /// The archive could not be written.
    #[error("failed to write archive `{path}`: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },
    /// The upload to the blob store failed.
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl StageError {
    /// Maps the failure back to the pipeline stage it belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Command { .. } | StageError::CommandSpawn { .. } => Stage::Command,
            StageError::Fileset(_) | StageError::Archive { .. } => Stage::Archive,
            StageError::Upload(_) => Stage::Upload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_maps_to_archive_stage() {
        let err = StageError::Fileset(FilesetError::NoMatch {
            pattern: "/empty/*.sql".to_string(),
        });
        assert_eq!(err.stage(), Stage::Archive);
        assert!(err.to_string().contains("/empty/*.sql"));
    }

    #[test]
    fn upload_maps_to_upload_stage() {
        let err = StageError::Upload(UploadError::new("backups", "db.zip", "connection reset"));
        assert_eq!(err.stage(), Stage::Upload);
    }
}
