//! Load job script templates and render them

use crate::error::JobResult;
use crate::template::parse::Template;

/// Split template text into literal runs and typed `%(name)d` / `%(name)s` placeholders
pub mod parse;

/// Substitute a parameter set into a parsed template
pub mod render;

/// included SLURM job script, parameterised by wall_time_hrs, nodes, np and cwd
static BUNDLED: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/job.sh"));

/// Parse the job script template shipped with the binary
pub fn bundled_template() -> JobResult<Template> {
    Template::parse(BUNDLED)
}
