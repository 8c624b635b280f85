// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ROOT_ELEMENT: &str = "valgrindoutput";
pub const POSSIBLY_LOST_KIND: &str = "Leak_PossiblyLost";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemanglerKind {
    CxxFilt,
    Builtin,
    None,
}

impl DemanglerKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cxxfilt" | "c++filt" => Some(DemanglerKind::CxxFilt),
            "builtin" => Some(DemanglerKind::Builtin),
            "none" | "off" => Some(DemanglerKind::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub source_dir: Option<String>,
    pub show_all_leaks: bool,
    pub use_symbolizer: bool,
    pub wait_budget_ms: u64,
    pub poll_interval_ms: u64,
    pub root_element: String,
    pub top_of_stack: Vec<String>,
    pub demangler: DemanglerKind,
    pub demangler_command: Vec<String>,
    pub symbolizer_command: Vec<String>,
    pub bad_file_tail_lines: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            show_all_leaks: false,
            use_symbolizer: false,
            wait_budget_ms: 180_000,
            poll_interval_ms: 1000,
            root_element: DEFAULT_ROOT_ELEMENT.to_string(),
            top_of_stack: vec![
                // gtest harness
                "testing::Test::Run()".to_string(),
                // libc/pthread internals
                "start_thread".to_string(),
            ],
            demangler: DemanglerKind::CxxFilt,
            demangler_command: vec!["c++filt".to_string(), "-n".to_string()],
            symbolizer_command: vec![
                "gdb".to_string(),
                "-batch".to_string(),
                "-nx".to_string(),
                "-x".to_string(),
                "/dev/stdin".to_string(),
            ],
            bad_file_tail_lines: 20,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_over(path, Self::default())
    }

    /// Keys present in the file replace the ones in `base`; the rest of `base` is kept.
    pub fn load_over(path: &Path, base: AnalyzerConfig) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let overrides: serde_json::Value = serde_json::from_str(&content)?;
        let overrides = match overrides {
            serde_json::Value::Object(map) => map,
            _ => return Err(ConfigError::Invalid("config file must hold a JSON object".to_string())),
        };

        let mut merged = serde_json::to_value(&base)?;
        if let Some(fields) = merged.as_object_mut() {
            fields.extend(overrides);
        }

        let config: AnalyzerConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_source_dir(mut self, dir: impl Into<String>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn with_show_all_leaks(mut self, show: bool) -> Self {
        self.show_all_leaks = show;
        self
    }

    pub fn with_symbolizer(mut self, enabled: bool) -> Self {
        self.use_symbolizer = enabled;
        self
    }

    pub fn with_wait_budget(mut self, budget: Duration) -> Self {
        self.wait_budget_ms = saturating_millis(budget);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = saturating_millis(interval);
        self
    }

    pub fn with_root_element(mut self, name: impl Into<String>) -> Self {
        self.root_element = name.into();
        self
    }

    pub fn with_demangler(mut self, kind: DemanglerKind) -> Self {
        self.demangler = kind;
        self
    }

    pub fn wait_budget(&self) -> Duration {
        Duration::from_millis(self.wait_budget_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn closing_marker(&self) -> String {
        format!("</{}>", self.root_element)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_element.is_empty() {
            return Err(ConfigError::Invalid("root_element must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be greater than 0".to_string()));
        }
        if self.demangler == DemanglerKind::CxxFilt && self.demangler_command.is_empty() {
            return Err(ConfigError::Invalid("demangler_command must not be empty".to_string()));
        }
        if self.use_symbolizer && self.symbolizer_command.is_empty() {
            return Err(ConfigError::Invalid("symbolizer_command must not be empty".to_string()));
        }
        Ok(())
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
