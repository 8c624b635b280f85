// Mon Oct 19 2026 - Alex

use crate::symbol::{FileLine, SymbolError};
use crate::utils::ProcessUtils;
use once_cell::sync::Lazy;
use regex::Regex;

static GDB_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^Line ([0-9]*) of "([^"]*)".*"#).expect("valid gdb line regex"));

/// Batch address-to-line lookup for a single binary.
///
/// The result is positional: entry `i` answers `addresses[i]`. It may be shorter
/// than `addresses` when the tool gave up early; missing entries are unknown.
pub trait Symbolizer {
    fn symbolize(&self, binary: &str, addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError>;
}

pub struct GdbSymbolizer {
    command: Vec<String>,
}

impl GdbSymbolizer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn script(binary: &str, addresses: &[String]) -> String {
        let mut script = format!("file {}\n", binary);
        for addr in addresses {
            script.push_str(&format!("info line *{}\n", addr));
        }
        script.push_str("quit\n");
        script
    }
}

impl Default for GdbSymbolizer {
    fn default() -> Self {
        Self::new(
            ["gdb", "-batch", "-nx", "-x", "/dev/stdin"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl Symbolizer for GdbSymbolizer {
    fn symbolize(&self, binary: &str, addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError> {
        let output = ProcessUtils::run_batch(&self.command, &GdbSymbolizer::script(binary, addresses))?;
        Ok(parse_gdb_output(&output, addresses.len()))
    }
}

/// Maps `info line` answers to lookups in order. Lines that are neither an
/// answer nor a "no line info" notice are skipped.
pub fn parse_gdb_output(lines: &[String], expected: usize) -> Vec<Option<FileLine>> {
    let mut results = Vec::with_capacity(expected);

    for line in lines {
        if results.len() == expected {
            break;
        }

        if line.starts_with("Line") {
            results.push(
                GDB_LINE_RE
                    .captures(line)
                    .map(|caps| FileLine::new(&caps[2], &caps[1])),
            );
        } else if line.starts_with("No line") {
            results.push(None);
        }
    }

    results
}
