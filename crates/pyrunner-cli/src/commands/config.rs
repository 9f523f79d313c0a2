use crate::errors::CliError;
use crate::logger;
use crate::GlobalOpts;
use clap::Subcommand;
use colored::*;
use pyrunner_config::{Config, CONFIG_KEYS};

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print every configured value
    Show,
    /// Print a single value
    Get { key: String },
    /// Set a value and save the config file
    Set { key: String, value: String },
    /// Print the path of the config file
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> Result<(), CliError> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
                return Ok(());
            }
            for (key, value) in config.values_iter() {
                println!("  {}: {}", key.cyan(), value);
            }
            println!("{}", "Context:".bold().green());
            for (key, value) in config.context.published_options() {
                println!("  {}: {}", key.cyan(), value);
            }
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => logger::warn(&format!("'{}' is not set", key)),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            if let Err(e) = config.set(&key, value.clone()) {
                logger::error(&format!("Supported keys: {}", CONFIG_KEYS.join(", ")));
                return Err(e.into());
            }
            config.save()?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path => {
            let path = Config::path()?;
            logger::debug(&format!("Reading config from: {}", path.display()));
            println!("{}", path.display());
        }
    }
    Ok(())
}

