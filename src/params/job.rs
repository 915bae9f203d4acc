use std::path::{Path, PathBuf};

use crate::error::{JobError, JobResult};
use crate::params::set::{ParamValue, ParameterSet};

/// Parameters of the bundled job template
///
/// - `wall_time_hrs`: wall-clock limit in whole hours
/// - `nodes`: number of nodes, at least one
/// - `np`: total parallel tasks across all nodes, at least one
/// - `cwd`: absolute working directory of the job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    pub wall_time_hrs: u32,
    pub nodes: u32,
    pub np: u32,
    pub cwd: PathBuf,
}

impl JobParams {
    pub fn validate(&self) -> JobResult<()> {
        positive("nodes", self.nodes.into())?;
        positive("np", self.np.into())?;
        absolute(&self.cwd)
    }

    pub fn to_parameter_set(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("wall_time_hrs", self.wall_time_hrs);
        params.insert("nodes", self.nodes);
        params.insert("np", self.np);
        params.insert("cwd", self.cwd.display().to_string());
        params
    }
}

impl From<&JobParams> for ParameterSet {
    fn from(job: &JobParams) -> Self {
        job.to_parameter_set()
    }
}

/// Check the bundled-template keys that are present in `params`
///
/// Keys that are absent, or whose values don't parse as the expected type, are left alone: the
/// renderer reports those as missing parameters or type mismatches.
pub fn check_constraints(params: &ParameterSet) -> JobResult<()> {
    for name in ["nodes", "np"] {
        if let Some(n) = params.get(name).and_then(ParamValue::as_count) {
            positive(name, n)?;
        }
    }
    if let Some(ParamValue::Text(cwd)) = params.get("cwd") {
        absolute(Path::new(cwd))?;
    }
    Ok(())
}

fn positive(name: &str, n: u64) -> JobResult<()> {
    match n {
        0 => Err(JobError::InvalidParameter {
            name: name.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        _ => Ok(()),
    }
}

fn absolute(cwd: &Path) -> JobResult<()> {
    let reason = if cwd.as_os_str().is_empty() {
        "must not be empty"
    } else if !cwd.is_absolute() {
        "must be an absolute path"
    } else {
        return Ok(());
    };
    Err(JobError::InvalidParameter { name: "cwd".to_string(), reason: reason.to_string() })
}
