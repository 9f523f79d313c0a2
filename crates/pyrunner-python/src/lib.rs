//! Embedded Python runner
//!
//! This crate hosts a single CPython interpreter context and drives it on a
//! fixed schedule:
//! 1. The context exposes host objects to interpreter code through the
//!    `pyrunner_host` module and its transfer namespace
//! 2. A loader task bootstraps the packaged runner script once, then calls
//!    its `load_all_py_files(path)` on every tick
//! 3. The runner service owns the scheduler thread that performs the ticks

pub mod context;
pub mod errors;
mod logging;
pub mod receiver;
pub mod resources;
pub mod service;
pub mod task;
pub mod transfer;
mod utils;

pub use context::InterpreterContext;
pub use errors::{BridgeError, RunInterrupted};
pub use logging::configure_python_logging;
pub use receiver::{DataProcessor, DataReceiver, ProcessDataFunction};
pub use resources::Resources;
pub use service::{Interrupter, RunnerService, ScheduledTask};
pub use task::{probe_bridge, LoaderTask, PythonInterrupter, TaskState};
pub use transfer::TransferNamespace;
pub use utils::{
    format_python_error, DATA_RECEIVER_KEY, ENGINE_OPTIONS_KEY, HOST_MODULE, LOADER_FUNCTION,
    MODULE_PATH_KEY, RUNNER_SCRIPT,
};
