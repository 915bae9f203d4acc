//! Write rendered job scripts to disk and hand them to the batch scheduler

/// Scheduler families selectable on the command line
pub mod kind;

/// Run a scheduler's submission command and read back the job id
pub mod scheduler;

/// Cluster descriptions: submission command and template for a site
pub mod cluster;

/// Publish a rendered script atomically and submit it
pub mod job;
