use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, JobResult};
use crate::submit::kind::SchedulerKind;
use crate::submit::scheduler::CommandScheduler;

/// How jobs are submitted on one cluster
///
/// ```json
/// {
///   "name": "speedy",
///   "scheduler": "pbs",
///   "submit": { "program": "qsub", "delimiter": ".", "job_id_index": 0 },
///   "template": "speedy.sub"
/// }
/// ```
///
/// Every field is optional. An explicit `submit` command wins over the stock command of
/// `scheduler`. A relative `template` is resolved against the description's own directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scheduler: Option<SchedulerKind>,
    #[serde(default)]
    pub submit: Option<CommandScheduler>,
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl ClusterConfig {
    pub fn load(path: &Path) -> JobResult<ClusterConfig> {
        info!("Reading cluster description {}", path.display());
        let error = |reason: String| JobError::Config {
            origin: format!("cluster description {}", path.display()),
            reason,
        };

        let json = fs::read_to_string(path).map_err(|err| {
            warn!("Can't read cluster description at path {}: {}", path.display(), err);
            error(err.to_string())
        })?;
        let mut config: ClusterConfig =
            serde_json::from_str(&json).map_err(|err| error(err.to_string()))?;

        if let Some(template) = config.template.take() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.template = Some(base.join(template));
        }
        Ok(config)
    }

    /// Submission command for this cluster, falling back to the stock command of `default`
    pub fn scheduler(&self, default: SchedulerKind) -> CommandScheduler {
        match (&self.submit, self.scheduler) {
            (Some(command), _) => command.clone(),
            (None, Some(kind)) => kind.command(),
            (None, None) => default.command(),
        }
    }
}
