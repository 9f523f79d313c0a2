use crate::errors::CliError;
use crate::logger;
use crate::GlobalOpts;
use clap::Parser;
use pyrunner_config::{Config, RunnerSettings, SettingsOverrides};
use pyrunner_python::{InterpreterContext, LoaderTask, RunnerService};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
pub struct RunCommand {
    /// Directory scanned for Python modules on every tick
    #[arg(long, value_name = "DIR")]
    pub module_path: Option<String>,

    /// Seconds between ticks (default: 10)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Read bootstrap resources from this directory instead of the embedded set
    #[arg(long, value_name = "DIR")]
    pub resources_dir: Option<PathBuf>,

    /// Run a single tick and exit
    #[arg(long)]
    pub once: bool,
}

impl RunCommand {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            module_path: self.module_path.clone(),
            interval_secs: self.interval,
            resources_dir: self.resources_dir.clone(),
        }
    }
}

/// Resolve settings against the config file, environment and flags.
///
/// Failures here are fatal and happen before the interpreter is touched.
pub fn resolve_settings(cmd: &RunCommand) -> Result<RunnerSettings, CliError> {
    let config = Config::load()?;
    let settings = RunnerSettings::resolve(&config, &cmd.overrides())?;
    logger::info(&format!(
        "Using Python module path from {}: {}",
        settings.module_path_source, settings.module_path
    ));
    Ok(settings)
}

pub fn handle_run(cmd: RunCommand, opts: &GlobalOpts) -> Result<(), CliError> {
    let settings = resolve_settings(&cmd)?;
    logger::debug(&format!(
        "Runner settings: interval={:?}, resources_dir={:?}, cleanup_bindings={}, verbosity={}",
        settings.interval,
        settings.resources_dir,
        settings.cleanup_bindings,
        opts.verbosity_level()
    ));

    let context = InterpreterContext::global(settings.context.clone())?;

    if cmd.once {
        logger::step("Running a single loader tick");
        let mut task = LoaderTask::from_settings(context, &settings);
        task.run_once()?;
        logger::success("Loader tick completed");
        return Ok(());
    }

    let service = RunnerService::get_instance(context, &settings);
    service.start()?;
    logger::info(&format!("Scheduler running every {:?}", service.period()));
    service.wait();
    Ok(())
}
