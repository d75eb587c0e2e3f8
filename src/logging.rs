use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

/// Topics understood by `--debug-filter`, one per simulation component.
pub const TOPICS: [&str; 5] = ["physics", "collision", "ai", "timer", "nav"];

#[derive(Debug)]
struct ArenaLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl log::Log for ArenaLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() > self.level {
            return false;
        }
        // Filters only narrow debug/trace output; warnings and errors always pass
        match &self.debug_filters {
            Some(filters) if metadata.level() >= log::Level::Debug => {
                filters.contains(metadata.target())
                    || filters.iter().any(|f| metadata.target().starts_with(f.as_str()))
            }
            _ => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m",
            log::Level::Warn => "\x1B[33m",
            log::Level::Info => "\x1B[32m",
            log::Level::Debug => "\x1B[36m",
            log::Level::Trace => "\x1B[35m",
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {target}: {message}",
            level = record.level(),
            target = record.target(),
            message = record.args()
        );
        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        // Nowhere to report a failing stdout
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

static LOGGER: OnceLock<ArenaLogger> = OnceLock::new();

/// Entries of a `--debug-filter` list that match none of the known topics
pub fn unknown_topics(debug_filter: &str) -> Vec<&str> {
    debug_filter
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty() && !TOPICS.contains(t))
        .collect()
}

/// Installs the process logger. `debug_filter` is a comma-separated topic list
/// restricting debug/trace output, e.g. "ai,collision".
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let debug_filters = debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    });

    let logger = LOGGER.get_or_init(|| ArenaLogger {
        level,
        debug_filters,
    });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

// Topic macros. The `actor = id` form prefixes the message with the actor id.

#[macro_export]
macro_rules! debug_physics {
    (actor = $id:expr, $($arg:tt)+) => {
        log::debug!(target: "physics", "[A{:02}] {}", $id, format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        log::debug!(target: "physics", $($arg)+)
    };
}

#[macro_export]
macro_rules! debug_collision {
    (actor = $id:expr, $($arg:tt)+) => {
        log::debug!(target: "collision", "[A{:02}] {}", $id, format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        log::debug!(target: "collision", $($arg)+)
    };
}

#[macro_export]
macro_rules! debug_ai {
    (actor = $id:expr, $($arg:tt)+) => {
        log::debug!(target: "ai", "[A{:02}] {}", $id, format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        log::debug!(target: "ai", $($arg)+)
    };
}

#[macro_export]
macro_rules! debug_timer {
    ($($arg:tt)+) => {
        log::debug!(target: "timer", $($arg)+)
    };
}

#[macro_export]
macro_rules! debug_nav {
    ($($arg:tt)+) => {
        log::debug!(target: "nav", $($arg)+)
    };
}
