//! Common types shared across commands

use clap::Parser;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Only show warnings and errors")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for info, -vv for debug)")]
    pub verbose: u8,

    #[arg(
        long,
        global = true,
        help = "Show Python logs on console (always logged to file)"
    )]
    pub log_python: bool,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: info (-v)
    /// - 2: debug (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
