use clap::{Parser, Subcommand};
use pyrunner::{
    commands::{
        config::{self, ConfigAction},
        probe, run,
    },
    logger, GlobalOpts,
};

#[derive(Parser)]
#[command(name = "pyrunner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Periodic embedded Python runner",
    long_about = "pyrunner runs the Python modules of a directory on a fixed schedule inside one embedded interpreter context."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduler and run the Python loader on every tick
    Run(run::RunCommand),
    /// Call the host bridge from Python and print the results
    Probe,
    /// Show or edit the pyrunner configuration
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.log_python) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let args: Vec<std::ffi::OsString> = std::env::args_os().collect();
    logger::info(&format!("Launched with arguments: {:?}", args));

    let result = match cli.command {
        Commands::Run(cmd) => run::handle_run(cmd, &cli.global),
        Commands::Probe => probe::handle_probe(&cli.global),
        Commands::Config { action } => config::handle_config(action, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&e.to_string());
        logger::show_log_path();
        std::process::exit(1);
    }
}
