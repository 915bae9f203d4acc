//! Read scheduler directives (`#SBATCH`, `#PBS`) back out of a job script
//!
//! Used to log what a rendered script asks the scheduler for, and to check that rendering carried
//! node, task and wall time parameters through to the directive lines.

use std::fmt;

use crate::submit::kind::SchedulerKind;

/// One option from a directive line, e.g. `--nodes=2` or `-l walltime=04:00:00`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub scheduler: SchedulerKind,
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    entries: Vec<Directive>,
}

impl Directives {
    pub fn parse(script: &str) -> Directives {
        let mut directives = Directives::default();
        for line in script.lines() {
            let line = line.trim_start();
            let (scheduler, rest) = if let Some(rest) = line.strip_prefix("#SBATCH") {
                (SchedulerKind::Slurm, rest)
            } else if let Some(rest) = line.strip_prefix("#PBS") {
                (SchedulerKind::Pbs, rest)
            } else {
                continue;
            };
            if !rest.starts_with(char::is_whitespace) {
                continue;
            }
            directives.parse_options(scheduler, rest);
        }
        directives
    }

    fn parse_options(&mut self, scheduler: SchedulerKind, options: &str) {
        let mut tokens = options.split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            // the rest of the line is a comment
            if token.starts_with('#') {
                break;
            }
            let (key, inline) = if let Some(long) = token.strip_prefix("--") {
                match long.split_once('=') {
                    Some((key, value)) => (key, Some(value)),
                    None => (long, None),
                }
            } else if let Some(short) = token.strip_prefix('-') {
                (short, None)
            } else {
                continue;
            };
            let value = inline.map(str::to_string).or_else(|| {
                tokens
                    .next_if(|next| !next.starts_with('-') && !next.starts_with('#'))
                    .map(str::to_string)
            });

            if scheduler == SchedulerKind::Pbs && key == "l" {
                for resource in value.iter().flat_map(|list| list.split(',')) {
                    let (key, value) = match resource.split_once('=') {
                        Some((key, value)) => (key, Some(value.to_string())),
                        None => (resource, None),
                    };
                    self.push(scheduler, key, value);
                }
            } else {
                self.push(scheduler, key, value);
            }
        }
    }

    fn push(&mut self, scheduler: SchedulerKind, key: &str, value: Option<String>) {
        self.entries.push(Directive { scheduler, key: key.to_string(), value });
    }

    pub fn entries(&self) -> &[Directive] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the last directive matching any of `keys`; later directives override earlier ones
    pub fn get(&self, scheduler: SchedulerKind, keys: &[&str]) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|d| d.scheduler == scheduler && keys.contains(&d.key.as_str()))
            .and_then(|d| d.value.as_deref())
    }

    pub fn nodes(&self) -> Option<u32> {
        if let Some(nodes) = self.get(SchedulerKind::Slurm, &["nodes", "N"]) {
            return nodes.parse().ok();
        }
        let (nodes, _) = self.pbs_nodes()?;
        Some(nodes)
    }

    /// Total parallel tasks: SLURM `--ntasks`, or PBS `nodes * ppn`
    pub fn ntasks(&self) -> Option<u32> {
        if let Some(ntasks) = self.get(SchedulerKind::Slurm, &["ntasks", "n"]) {
            return ntasks.parse().ok();
        }
        let (nodes, ppn) = self.pbs_nodes()?;
        nodes.checked_mul(ppn?)
    }

    pub fn wall_time(&self) -> Option<WallTime> {
        if let Some(time) = self.get(SchedulerKind::Slurm, &["time", "t"]) {
            return WallTime::parse_slurm(time);
        }
        self.get(SchedulerKind::Pbs, &["walltime"]).and_then(WallTime::parse_slurm)
    }

    /// PBS `nodes=2:ppn=16` resource, as (nodes, ppn)
    fn pbs_nodes(&self) -> Option<(u32, Option<u32>)> {
        let spec = self.get(SchedulerKind::Pbs, &["nodes"])?;
        let mut parts = spec.split(':');
        let nodes = parts.next()?.parse().ok()?;
        let ppn = parts
            .filter_map(|part| part.strip_prefix("ppn="))
            .find_map(|ppn| ppn.parse().ok());
        Some((nodes, ppn))
    }
}

/// A scheduler wall-clock limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallTime {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl WallTime {
    /// Parse a SLURM time limit
    ///
    /// Accepted forms: `M`, `M:S`, `H:M:S`, `D-H`, `D-H:M`, `D-H:M:S`. PBS `walltime` values use
    /// the `H:M:S` form.
    pub fn parse_slurm(text: &str) -> Option<WallTime> {
        fn number(field: &str) -> Option<u32> {
            field.parse().ok()
        }
        let mut time = WallTime::default();
        match text.split_once('-') {
            Some((days, rest)) => {
                time.days = number(days)?;
                let fields: Vec<&str> = rest.split(':').collect();
                match fields.as_slice() {
                    [h] => time.hours = number(h)?,
                    [h, m] => (time.hours, time.minutes) = (number(h)?, number(m)?),
                    [h, m, s] => {
                        time.hours = number(h)?;
                        time.minutes = number(m)?;
                        time.seconds = number(s)?;
                    }
                    _ => return None,
                }
            }
            None => {
                let fields: Vec<&str> = text.split(':').collect();
                match fields.as_slice() {
                    [m] => time.minutes = number(m)?,
                    [m, s] => (time.minutes, time.seconds) = (number(m)?, number(s)?),
                    [h, m, s] => {
                        time.hours = number(h)?;
                        time.minutes = number(m)?;
                        time.seconds = number(s)?;
                    }
                    _ => return None,
                }
            }
        }
        Some(time)
    }

    pub fn total_seconds(&self) -> u64 {
        let days = u64::from(self.days);
        let hours = days * 24 + u64::from(self.hours);
        let minutes = hours * 60 + u64::from(self.minutes);
        minutes * 60 + u64::from(self.seconds)
    }

    /// The limit in hours, if it is a whole number of hours
    pub fn whole_hours(&self) -> Option<u64> {
        let seconds = self.total_seconds();
        (seconds % 3600 == 0).then_some(seconds / 3600)
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}-", self.days)?;
        }
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}
