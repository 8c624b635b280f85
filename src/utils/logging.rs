// Mon Oct 19 2026 - Alex

use colored::*;
use indicatif::ProgressBar;
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::sync::Mutex;

static ACTIVE_PROGRESS: Lazy<Mutex<Option<ProgressBar>>> = Lazy::new(|| Mutex::new(None));

/// Log lines printed while `bar` is attached are drawn with the bar suspended.
pub fn attach_progress(bar: &ProgressBar) {
    if let Ok(mut active) = ACTIVE_PROGRESS.lock() {
        *active = Some(bar.clone());
    }
}

pub fn detach_progress() {
    if let Ok(mut active) = ACTIVE_PROGRESS.lock() {
        *active = None;
    }
}

fn active_progress() -> Option<ProgressBar> {
    ACTIVE_PROGRESS.lock().ok().and_then(|active| active.clone())
}

pub struct LoggingUtils;

impl LoggingUtils {
    pub fn init_logger(level: LevelFilter, use_color: bool) {
        let logger = Box::new(ColoredLogger::new(level, use_color));
        log::set_boxed_logger(logger).ok();
        log::set_max_level(level);
    }

    pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn stderr_is_terminal() -> bool {
        atty::is(atty::Stream::Stderr)
    }
}

pub struct ColoredLogger {
    level: LevelFilter,
    use_color: bool,
}

impl ColoredLogger {
    pub fn new(level: LevelFilter, use_color: bool) -> Self {
        Self { level, use_color }
    }

    fn format_level(&self, level: Level) -> String {
        if !self.use_color {
            return format!("{:5}", level);
        }

        match level {
            Level::Error => "ERROR".red().bold().to_string(),
            Level::Warn => "WARN ".yellow().bold().to_string(),
            Level::Info => "INFO ".green().bold().to_string(),
            Level::Debug => "DEBUG".blue().bold().to_string(),
            Level::Trace => "TRACE".magenta().bold().to_string(),
        }
    }
}

impl ColoredLogger {
    /// Rendered records span several lines; only the first one gets the level prefix.
    fn format_lines(&self, record: &Record) -> Vec<String> {
        let level_str = self.format_level(record.level());
        let message = record.args().to_string();

        message
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{} {}", level_str, line)
                } else {
                    line.to_string()
                }
            })
            .collect()
    }
}

impl Log for ColoredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let lines = self.format_lines(record);
        let write = || {
            for line in &lines {
                eprintln!("{}", line);
            }
        };

        match active_progress() {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }

    fn flush(&self) {}
}

/// Honors `RUST_LOG` through env_logger when it is set, otherwise installs the colored logger.
pub fn init(verbosity: u8, use_color: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
        return;
    }

    let use_color = use_color && LoggingUtils::stderr_is_terminal();
    if !use_color {
        colored::control::set_override(false);
    }
    LoggingUtils::init_logger(LoggingUtils::level_from_verbosity(verbosity), use_color);
}
