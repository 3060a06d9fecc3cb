// logging.rs
// Simple logging utility for the reaction game client.
//
// The game screen owns stdout, so every log line goes to stderr.

use chrono::Local;

/// Log level enum
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Info,
    Error,
    Warning,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
        }
    }
}

/// Build a log line with timestamp
pub fn format_log_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("{} - {} - {}", timestamp, level.as_str(), message)
}

/// Format and print a log message with timestamp
pub fn log_message(level: LogLevel, message: &str) {
    // \r keeps lines aligned while the terminal is in raw mode
    eprint!("{}\r\n", format_log_line(level, message));
}

/// Log an info message
pub fn log_info(message: &str) {
    log_message(LogLevel::Info, message);
}

/// Log an error message
pub fn log_error(message: &str) {
    log_message(LogLevel::Error, message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    log_message(LogLevel::Warning, message);
}
