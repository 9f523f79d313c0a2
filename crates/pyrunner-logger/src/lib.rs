use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Environment variable that overrides the log file location
pub const LOG_FILE_ENV: &str = "PYRUNNER_LOG_FILE";

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static LOG_PYTHON: Mutex<bool> = Mutex::new(false);

/// Get the current verbosity level for use by other modules (e.g., Python bridge)
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Get whether Python logging to console is enabled
pub fn get_log_python() -> bool {
    LOG_PYTHON.lock().ok().map(|v| *v).unwrap_or(false)
}

/// Set whether Python logging to console is enabled
pub fn set_log_python(enabled: bool) {
    if let Ok(mut v) = LOG_PYTHON.lock() {
        *v = enabled;
    }
}

/// Python `logging` level matching the current verbosity
/// 0 = WARNING, 1 = INFO (-v), 2 = DEBUG (-vv)
pub fn verbosity_to_python_level() -> i32 {
    match get_verbosity() {
        0 => 30,
        1 => 20,
        _ => 10,
    }
}

/// Name of a Python `logging` level number
pub fn python_level_name(level: i32) -> &'static str {
    match level {
        l if l >= 50 => "CRITICAL",
        l if l >= 40 => "ERROR",
        l if l >= 30 => "WARNING",
        l if l >= 20 => "INFO",
        l if l >= 10 => "DEBUG",
        _ => "NOTSET",
    }
}

/// Initialize the logger with verbosity level and Python console flag
pub fn init_with_verbosity(verbosity: u8, log_python: bool) -> Result<(), String> {
    let log_file = match std::env::var(LOG_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => get_config_dir()?.join("pyrunner.log"),
    };
    init_with_file(&log_file, verbosity, log_python)
}

/// Initialize the logger writing to an explicit file
pub fn init_with_file(log_file: &Path, verbosity: u8, log_python: bool) -> Result<(), String> {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }
    set_log_python(log_python);

    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }

    // Truncate log file on each run (overwrite instead of append)
    if log_file.exists() {
        let _ = fs::remove_file(log_file);
    }

    let mut log_file_guard = LOG_FILE
        .lock()
        .map_err(|_| "Log file lock poisoned".to_string())?;
    *log_file_guard = Some(log_file.to_path_buf());

    Ok(())
}

/// Get the config directory path
fn get_config_dir() -> Result<PathBuf, String> {
    let config_dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("pyrunner");
    Ok(config_dir)
}

fn write_to_log(message: &str) {
    write_to_log_with_source(message, "RUST")
}

fn write_to_log_with_source(message: &str, source: &str) {
    if let Ok(log_file_guard) = LOG_FILE.lock() {
        if let Some(ref log_path) = *log_file_guard {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "[{}] [{}] {}", timestamp, source, message);
            }
        }
    }
}

/// Log an informational message (to console if verbose >= 1, always to file)
pub fn info(message: &str) {
    write_to_log(&format!("INFO {}", message));
    if get_verbosity() >= 1 {
        eprintln!("{}", message);
    }
}

/// Log a debug message (to console if verbose >= 2, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if get_verbosity() >= 2 {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

/// Log a warning message (to both file and console)
pub fn warn(message: &str) {
    write_to_log(&format!("WARN {}", message));
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Log an error message (to both file and console)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Log a success message (to console only for user feedback)
pub fn success(message: &str) {
    write_to_log(&format!("SUCCESS {}", message));
    let check = "\u{2714}".green().bold();
    eprintln!("{} {}", check, message);
}

/// Log a step message (important user-facing step)
pub fn step(message: &str) {
    if get_verbosity() >= 2 {
        eprintln!("TRACE: {}", message);
    }
    write_to_log(&format!("STEP: {}", message));
}

/// Log a record forwarded from Python `logging`
///
/// Always written to the file; echoed to the console only with `--log-python`.
pub fn python(level: i32, message: &str) {
    let level_name = python_level_name(level);
    write_to_log_with_source(&format!("{} {}", level_name, message), "PYTHON");
    if get_log_python() {
        eprintln!("{} {:<8} {}", "[PYTHON]".cyan(), level_name, message);
    }
}

/// Get the log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

/// Print the log file path to the user
pub fn show_log_path() {
    if let Some(path) = get_log_path() {
        eprintln!("Log file: {}", path.display());
    } else if let Ok(config_dir) = get_config_dir() {
        eprintln!("Log file: {}", config_dir.join("pyrunner.log").display());
    } else {
        eprintln!("Log file location not available");
    }
}
