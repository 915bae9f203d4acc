use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::submit::scheduler::CommandScheduler;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Slurm,
    Pbs,
}

impl SchedulerKind {
    /// The stock submission command for this scheduler
    pub fn command(&self) -> CommandScheduler {
        match self {
            SchedulerKind::Slurm => CommandScheduler::slurm(),
            SchedulerKind::Pbs => CommandScheduler::pbs(),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchedulerKind::Slurm => write!(f, "slurm"),
            SchedulerKind::Pbs => write!(f, "pbs"),
        }
    }
}
