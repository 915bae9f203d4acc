use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use submit_job::params::job::check_constraints;
use submit_job::params::read::ParamsFile;
use submit_job::params::set::parse_assignment;
use submit_job::submit::cluster::ClusterConfig;
use submit_job::submit::job::{check_script_name, SCRIPT_NAME};
use submit_job::{
    bundled_template, submit_as, JobError, ParamValue, ParameterSet, SchedulerKind, Template,
};

/// Render a batch job script from a template and submit it to the scheduler
#[derive(Parser, Debug)]
#[command(name = "submit-job", version)]
struct Args {
    /// Job script template with %(name)d / %(name)s placeholders [default: bundled SLURM template]
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Template parameter, repeatable (e.g. --param np=32)
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    params: Vec<(String, ParamValue)>,

    /// JSON file of template parameters, overridden by --param
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// Directory the job script is written to and submitted from
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// File name of the job script inside the working directory
    #[arg(long, default_value = SCRIPT_NAME, value_parser = parse_script_name)]
    script_name: String,

    /// Scheduler used to submit the job
    #[arg(long, value_enum, default_value_t = SchedulerKind::Slurm)]
    scheduler: SchedulerKind,

    /// JSON cluster description (submission command and template)
    #[arg(long)]
    cluster: Option<PathBuf>,

    /// Print the rendered script to stdout instead of writing and submitting it
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    info!("terve! rendering a job script :)");

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("submit-job: {err:#}");
            let code = err.downcast_ref::<JobError>().map_or(1, JobError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let cluster = match &args.cluster {
        Some(path) => ClusterConfig::load(path)?,
        None => ClusterConfig::default(),
    };
    let template = load_template(args.template.as_deref().or(cluster.template.as_deref()))?;

    let mut params = match &args.params_file {
        Some(path) => ParamsFile::new(path)?.read()?,
        None => ParameterSet::new(),
    };
    params.extend(args.params);
    if template.references("cwd") && !params.contains("cwd") {
        let cwd = absolute(&args.work_dir).context("can't resolve working directory")?;
        info!("cwd not given, using {}", cwd.display());
        params.insert("cwd", cwd.display().to_string());
    }
    check_constraints(&params)?;

    let script = template.render(&params)?;
    for directive in script.directives().entries() {
        let value = directive.value.as_deref().unwrap_or("(flag)");
        info!("{} directive {} = {}", directive.scheduler, directive.key, value);
    }

    if args.dry_run {
        info!("--dry-run set, printing job script instead of submitting");
        print!("{script}");
        return Ok(());
    }

    let scheduler = cluster.scheduler(args.scheduler);
    let handle = submit_as(&script, &args.work_dir, &args.script_name, &scheduler)?;
    println!("{handle}");
    Ok(())
}

fn load_template(path: Option<&Path>) -> Result<Template> {
    let template = match path {
        Some(path) => Template::from_file(path)?,
        None => {
            info!("No template given, using bundled job script");
            bundled_template()?
        }
    };
    if template.placeholders().next().is_none() {
        warn!("Template has no placeholders, it will be submitted as-is");
    }
    Ok(template)
}

fn parse_script_name(name: &str) -> Result<String, String> {
    check_script_name(name).map_err(|err| err.to_string())?;
    Ok(name.to_string())
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    match path.is_absolute() {
        true => Ok(path.to_path_buf()),
        false => Ok(env::current_dir()?.join(path)),
    }
}
