use std::path::Path;
use std::process::Command;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, JobResult};

/// The batch scheduler's submission interface
///
/// Implementations make exactly one submission attempt per call and return the raw job id the
/// scheduler assigned. Timeouts, if any, are the caller's business.
pub trait Scheduler {
    fn submit(&self, script: &Path, work_dir: &Path) -> JobResult<String>;
}

/// A command line submission interface, such as `sbatch` or `qsub`
///
/// Runs `program args... <script>` from the job's working directory. The job id is read from the
/// last non-empty line of standard output: a `Submitted batch job ` prefix is dropped, the rest is
/// split on `delimiter` and field `job_id_index` is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandScheduler {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub job_id_index: usize,
}

impl CommandScheduler {
    /// `sbatch --parsable`, which prints `jobid[;cluster]`
    pub fn slurm() -> CommandScheduler {
        CommandScheduler {
            program: "sbatch".to_string(),
            args: vec!["--parsable".to_string()],
            delimiter: Some(";".to_string()),
            job_id_index: 0,
        }
    }

    /// `qsub`, which prints `jobid.server`
    pub fn pbs() -> CommandScheduler {
        CommandScheduler {
            program: "qsub".to_string(),
            args: Vec::new(),
            delimiter: Some(".".to_string()),
            job_id_index: 0,
        }
    }

    pub fn parse_job_id(&self, stdout: &str) -> JobResult<String> {
        let line = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| self.error("no job id in scheduler output".to_string()))?;
        let line = line.strip_prefix("Submitted batch job ").unwrap_or(line).trim();

        let field = match &self.delimiter {
            Some(delimiter) if !delimiter.is_empty() => {
                line.split(delimiter.as_str()).nth(self.job_id_index)
            }
            _ => line.split_whitespace().nth(self.job_id_index),
        };
        match field.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(self.error(format!("unexpected output format: {line}"))),
        }
    }

    fn error(&self, diagnostic: String) -> JobError {
        JobError::Submission { command: self.program.clone(), diagnostic }
    }
}

impl Scheduler for CommandScheduler {
    fn submit(&self, script: &Path, work_dir: &Path) -> JobResult<String> {
        let mut command = Command::new(&self.program);
        let cmd = command.args(&self.args).arg(script).current_dir(work_dir);
        info!("Running {} process", self.program);
        info!("{:?}", &cmd);

        let output = cmd.output().map_err(|err| {
            warn!("Can't run {}: {}", self.program, err);
            self.error(format!("can't run {}: {}", self.program, err))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} exited with {}", self.program, output.status);
            let diagnostic = match stderr.is_empty() {
                true => format!("exited with {}", output.status),
                false => stderr,
            };
            return Err(self.error(diagnostic));
        }

        self.parse_job_id(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parsable_output() {
        let slurm = CommandScheduler::slurm();
        assert_eq!(slurm.parse_job_id("12345\n").unwrap(), "12345");
        assert_eq!(slurm.parse_job_id("12345;puhti\n").unwrap(), "12345");
        assert_eq!(slurm.parse_job_id("Submitted batch job 9999999").unwrap(), "9999999");
        assert_eq!(slurm.parse_job_id("sbatch: note\n4242\n\n").unwrap(), "4242");
    }

    #[test]
    fn test_parse_pbs_output() {
        let pbs = CommandScheduler::pbs();
        assert_eq!(pbs.parse_job_id("8812.speedy.math.ucdenver.edu\n").unwrap(), "8812");
    }

    #[test]
    fn test_parse_other_fields() {
        let scheduler = CommandScheduler {
            program: "submit".to_string(),
            args: Vec::new(),
            delimiter: None,
            job_id_index: 2,
        };
        assert_eq!(scheduler.parse_job_id("job accepted 77 queued").unwrap(), "77");
        assert!(scheduler.parse_job_id("job accepted").is_err());
    }

    #[test]
    fn test_parse_empty_output() {
        let err = CommandScheduler::slurm().parse_job_id("\n  \n").unwrap_err();
        assert!(matches!(err, JobError::Submission { ref command, .. } if command == "sbatch"));
    }

    #[test]
    fn test_unreachable_scheduler() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = CommandScheduler {
            program: "/nonexistent/bin/sbatch".to_string(),
            ..CommandScheduler::slurm()
        };
        let err = scheduler.submit(&dir.path().join("job.sh"), dir.path()).unwrap_err();
        assert!(matches!(err, JobError::Submission { .. }));
        assert!(err.to_string().contains("can't run"));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> CommandScheduler {
        CommandScheduler {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            delimiter: Some(";".to_string()),
            job_id_index: 0,
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_submit_passes_script_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("job.sh");
        std::fs::write(&script, "#!/bin/bash\n").unwrap();
        // prints the job id only when handed an existing script from its own working directory
        let scheduler = shell("test -f \"$1\" && test -f job.sh && echo 'Submitted batch job 77'");
        assert_eq!(scheduler.submit(&script, dir.path()).unwrap(), "77");
    }

    #[cfg(unix)]
    #[test]
    fn test_rejected_submission_keeps_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = shell("echo 'sbatch: error: invalid partition specified' >&2; exit 1");
        let err = scheduler.submit(&dir.path().join("job.sh"), dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "sh submission failed: sbatch: error: invalid partition specified"
        );
    }
}
