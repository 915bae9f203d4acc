use std::env;
use std::fmt;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use tempfile::NamedTempFile;

use crate::error::{JobError, JobResult};
use crate::submit::scheduler::Scheduler;
use crate::template::render::RenderedScript;

/// File name of the job script inside the working directory
pub const SCRIPT_NAME: &str = "job.sh";

/// A JobPath is the path to a published job script that the scheduler can read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPath {
    pub path: PathBuf,
}

/// What the scheduler handed back for a submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Scheduler-assigned job id
    pub id: String,
    pub script: PathBuf,
    pub submitted_at: DateTime<Utc>,
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl RenderedScript {
    /// Publish the script at `path` in one step
    ///
    /// The text goes to a temporary file in the same directory which is renamed over `path` once
    /// it is completely written, so the scheduler never sees a partial script.
    pub fn write(&self, path: &Path) -> JobResult<JobPath> {
        let io_error = |source| JobError::Io { path: path.to_path_buf(), source };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(self.as_str().as_bytes()).map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        set_executable(&file).map_err(io_error)?;
        file.persist(path).map_err(|err| io_error(err.error))?;

        info!("Wrote job script to {}", path.display());
        Ok(JobPath { path: path.to_path_buf() })
    }
}

#[cfg(unix)]
fn set_executable(file: &NamedTempFile) -> std::io::Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    file.as_file().set_permissions(Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_file: &NamedTempFile) -> std::io::Result<()> {
    Ok(())
}

/// Write `script` to `job.sh` in `work_dir` and submit it
pub fn submit(
    script: &RenderedScript,
    work_dir: &Path,
    scheduler: &dyn Scheduler,
) -> JobResult<JobHandle> {
    submit_as(script, work_dir, SCRIPT_NAME, scheduler)
}

/// Write `script` to `work_dir/script_name` and submit it
///
/// `script_name` must be a plain file name. A relative `work_dir` is resolved against the current
/// directory, and the scheduler is always handed absolute paths. Nothing is submitted unless the
/// script was published completely.
pub fn submit_as(
    script: &RenderedScript,
    work_dir: &Path,
    script_name: &str,
    scheduler: &dyn Scheduler,
) -> JobResult<JobHandle> {
    check_script_name(script_name)?;
    if script.is_empty() {
        warn!("Rendered job script is empty");
        return Err(JobError::EmptyScript);
    }
    let work_dir = absolute_work_dir(work_dir)?;
    info!("Submitting job from working directory {}", work_dir.display());

    let job_path = script.write(&work_dir.join(script_name))?;
    let id = scheduler.submit(&job_path.path, &work_dir)?;
    let handle = JobHandle { id, script: job_path.path, submitted_at: Utc::now() };
    info!("Scheduler job id: {} (submitted {})", handle.id, handle.submitted_at.to_rfc3339());
    Ok(handle)
}

/// Accept only a single normal path component, so the script stays inside the work dir
pub fn check_script_name(name: &str) -> JobResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(JobError::InvalidParameter {
            name: "script_name".to_string(),
            reason: format!("'{name}' is not a plain file name"),
        }),
    }
}

fn absolute_work_dir(work_dir: &Path) -> JobResult<PathBuf> {
    if work_dir.is_absolute() {
        return Ok(work_dir.to_path_buf());
    }
    let cwd = env::current_dir()
        .map_err(|source| JobError::Io { path: work_dir.to_path_buf(), source })?;
    Ok(cwd.join(work_dir))
}
