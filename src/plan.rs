//! Backup plans.
//!
//! A plan is one named unit of backup work: an optional preparation
//! command, a source pattern, an archive destination, and an upload. The
//! stages run strictly in that order and the first failure skips everything
//! after it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::config::{ConfigError, RawPlan};
use crate::error::StageError;
use crate::store::BlobStore;
use crate::{archive, command, fileset};

/// A validated, immutable backup plan.
#[derive(Debug, Clone)]
pub struct Plan {
    name: String,
    source: String,
    output: PathBuf,
    command: Option<String>,
}

impl Plan {
    /// Validates a raw definition into a runnable plan.
    ///
    /// Rejects empty names, empty or malformed source patterns, and output
    /// paths without a file name. The output file name doubles as the
    /// upload key.
    pub fn new(raw: RawPlan) -> Result<Self, ConfigError> {
        let RawPlan {
            name,
            source,
            output,
            command,
        } = raw;
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidPlan {
                name,
                reason: "`name` must not be empty".to_string(),
            });
        }
        if source.trim().is_empty() {
            return Err(ConfigError::InvalidPlan {
                name,
                reason: "`source` must not be empty".to_string(),
            });
        }
        if let Err(e) = fileset::matcher(&source) {
            return Err(ConfigError::InvalidPlan {
                name,
                reason: e.to_string(),
            });
        }
        if output.as_os_str().is_empty() || output.file_name().is_none() {
            return Err(ConfigError::InvalidPlan {
                name,
                reason: "`output` must name an archive file".to_string(),
            });
        }
        Ok(Self {
            name,
            source,
            output,
            command,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Key the archive is stored under: its file name.
    pub fn upload_key(&self) -> String {
        self.output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Runs the plan's pipeline: preparation command (if configured),
    /// source resolution, archiving, upload.
    ///
    /// Every stage error is captured into the returned outcome; `run`
    /// itself never fails, so the orchestrator always receives the result
    /// as data.
    pub fn run(&self, store: &dyn BlobStore) -> Outcome {
        info!("running plan \"{}\"", self.name);
        match self.execute(store) {
            Ok(()) => {
                info!("plan \"{}\" completed", self.name);
                Outcome::Completed {
                    finished_at: Utc::now(),
                }
            }
            Err(detail) => {
                error!(
                    "plan \"{}\" failed in {} stage: {detail}",
                    self.name,
                    detail.stage()
                );
                Outcome::Failed {
                    detail,
                    finished_at: Utc::now(),
                }
            }
        }
    }

    fn execute(&self, store: &dyn BlobStore) -> Result<(), StageError> {
        if let Some(cmd) = &self.command {
            command::run(cmd)?;
        }
        let fileset = fileset::resolve(&self.source)?;
        debug!(
            "archiving {} files into {}",
            fileset.len(),
            self.output.display()
        );
        archive::write(&fileset, &self.output).map_err(|source| StageError::Archive {
            path: self.output.clone(),
            source,
        })?;
        store.put(&self.output, &self.upload_key())?;
        Ok(())
    }
}

/// Result of one plan run, consumed by the notification step.
#[derive(Debug)]
pub enum Outcome {
    Completed {
        finished_at: DateTime<Utc>,
    },
    Failed {
        detail: StageError,
        finished_at: DateTime<Utc>,
    },
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    /// Completion time, rendered verbatim into the notification body.
    pub fn finished_at(&self) -> DateTime<Utc> {
        match self {
            Outcome::Completed { finished_at } | Outcome::Failed { finished_at, .. } => {
                *finished_at
            }
        }
    }

    pub fn failure_detail(&self) -> Option<&StageError> {
        match self {
            Outcome::Completed { .. } => None,
            Outcome::Failed { detail, .. } => Some(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, source: &str, output: &str) -> RawPlan {
        RawPlan {
            name: name.to_string(),
            source: source.to_string(),
            output: PathBuf::from(output),
            command: None,
        }
    }

    #[test]
    fn accepts_a_complete_definition() {
        let plan = Plan::new(raw("db", "/data/*.sql", "/tmp/db.zip")).unwrap();
        assert_eq!(plan.name(), "db");
        assert_eq!(plan.upload_key(), "db.zip");
        assert!(plan.command().is_none());
    }

    #[test]
    fn rejects_an_empty_name() {
        let err = Plan::new(raw("  ", "/data/*.sql", "/tmp/db.zip")).unwrap_err();
        assert!(err.to_string().contains("`name`"));
    }

    #[test]
    fn rejects_an_empty_source() {
        let err = Plan::new(raw("db", "", "/tmp/db.zip")).unwrap_err();
        assert!(err.to_string().contains("`source`"));
    }

    #[test]
    fn rejects_a_malformed_source_pattern() {
        let err = Plan::new(raw("db", "/data/[", "/tmp/db.zip")).unwrap_err();
        assert!(err.to_string().contains("invalid source pattern"));
    }

    #[test]
    fn rejects_an_output_without_a_file_name() {
        let err = Plan::new(raw("db", "/data/*.sql", "/")).unwrap_err();
        assert!(err.to_string().contains("`output`"));
    }

    #[test]
    fn rejects_an_empty_output() {
        let err = Plan::new(raw("db", "/data/*.sql", "")).unwrap_err();
        assert!(err.to_string().contains("`output`"));
    }
}
