use crate::errors::CliError;
use crate::logger;
use crate::GlobalOpts;
use colored::*;
use pyrunner_config::Config;
use pyrunner_python::{probe_bridge, InterpreterContext};

/// Call the host bridge from interpreter code and print what came back
pub fn handle_probe(opts: &GlobalOpts) -> Result<(), CliError> {
    let config = Config::load()?;
    let context = InterpreterContext::global(config.context)?;

    let (data, other, func) = probe_bridge(&context)?;
    logger::debug(&format!("Bridge probe completed at verbosity {}", opts.verbosity_level()));

    println!("{}", "Bridge probe:".bold().green());
    println!("  {}: {}", "process_data".cyan(), data);
    println!("  {}: {}", "process_other".cyan(), other);
    println!("  {}: {}", "process_data_func".cyan(), func);
    Ok(())
}
