//! Render batch job scripts from typed templates and submit them to a scheduler
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use submit_job::{bundled_template, submit, CommandScheduler, JobParams, ParameterSet};
//! # fn main() -> submit_job::JobResult<()> {
//! let job = JobParams { wall_time_hrs: 4, nodes: 2, np: 32, cwd: PathBuf::from("/scratch/job1") };
//! job.validate()?;
//!
//! let script = bundled_template()?.render(&ParameterSet::from(&job))?;
//! let handle = submit(&script, Path::new("/scratch/job1"), &CommandScheduler::slurm())?;
//! println!("{handle}");
//! # Ok(())
//! # }
//! ```

/// Scheduler directive lines read back from scripts
pub mod directives;
pub mod error;
/// Template parameters and parameter files
pub mod params;
/// Script publication and scheduler submission
pub mod submit;
/// Job script templates
pub mod template;

pub use directives::{Directives, WallTime};
pub use error::{JobError, JobResult};
pub use params::job::JobParams;
pub use params::set::{ParamValue, ParameterSet};
pub use submit::job::{submit, submit_as, JobHandle};
pub use submit::kind::SchedulerKind;
pub use submit::scheduler::{CommandScheduler, Scheduler};
pub use template::bundled_template;
pub use template::parse::Template;
pub use template::render::{render, RenderedScript};
