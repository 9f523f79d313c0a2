//! pyrunner library - expose command modules for the binary and tests

pub mod commands;
pub mod common;
pub mod errors;

pub use common::GlobalOpts;
pub use pyrunner_logger as logger;
