// Mon Oct 19 2026 - Alex

use crate::config::AnalyzerConfig;
use crate::model::ErrorRecord;
use crate::parser::{ReportParser, XmlError};
use crate::report::{ReportError, ReportReader, WaitBudget};
use crate::symbol::{self, SymbolTable};
use crate::utils::StringUtils;
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

const PARSE_CONTEXT_LINES: usize = 5;

/// Everything collected from one batch of reports.
#[derive(Debug, Default)]
pub struct AnalysisResult {
    errors: IndexSet<ErrorRecord>,
    parse_failed: bool,
    bad_files: Vec<PathBuf>,
    files_read: usize,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an equal record was already present.
    pub fn insert(&mut self, record: ErrorRecord) -> bool {
        self.errors.insert(record)
    }

    pub fn errors(&self) -> &IndexSet<ErrorRecord> {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn parse_failed(&self) -> bool {
        self.parse_failed
    }

    pub fn bad_files(&self) -> &[PathBuf] {
        &self.bad_files
    }

    pub fn files_read(&self) -> usize {
        self.files_read
    }
}

pub struct MemcheckAnalyzer {
    config: AnalyzerConfig,
    reader: ReportReader,
    parser: ReportParser,
    symbols: Option<SymbolTable>,
}

impl MemcheckAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            reader: ReportReader::from_config(&config),
            parser: ReportParser::from_config(&config),
            symbols: symbol::create_symbol_table(&config),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    pub fn symbols_mut(&mut self) -> Option<&mut SymbolTable> {
        self.symbols.as_mut()
    }

    pub fn analyze(&mut self, files: &[PathBuf]) -> AnalysisResult {
        let budget = WaitBudget::start(self.config.wait_budget());
        self.analyze_with(files, &budget, |_| {})
    }

    /// Reads, parses and dedups every file. `on_file` runs after each one.
    pub fn analyze_with<F>(&mut self, files: &[PathBuf], budget: &WaitBudget, mut on_file: F) -> AnalysisResult
    where
        F: FnMut(&Path),
    {
        let mut result = AnalysisResult::new();

        for file in files {
            self.ingest(&mut result, file, budget);
            on_file(file);
        }

        if !result.bad_files.is_empty() {
            self.warn_bad_files(&result.bad_files);
        }

        log::debug!(
            "{} of {} files read, {} unique errors",
            result.files_read,
            files.len(),
            result.errors.len()
        );

        result
    }

    pub fn ingest(&mut self, result: &mut AnalysisResult, path: &Path, budget: &WaitBudget) {
        let contents = match self.reader.read(path, budget) {
            Ok(contents) => contents,
            Err(e) => {
                if let ReportError::Io { .. } = e {
                    log::warn!("{}", e);
                }
                result.bad_files.push(path.to_path_buf());
                return;
            }
        };

        match self.parser.parse(&contents.content, self.symbols.as_mut()) {
            Ok(raw_errors) => {
                result.files_read += 1;
                let mut duplicates = 0usize;
                for raw in raw_errors {
                    if !result.insert(ErrorRecord::from_raw(raw)) {
                        duplicates += 1;
                    }
                }
                if duplicates > 0 {
                    log::debug!("{}: {} duplicate errors", path.display(), duplicates);
                }
            }
            Err(e) => {
                result.parse_failed = true;
                log_parse_failure(path, &contents.content, &e);
            }
        }
    }

    fn warn_bad_files(&self, bad_files: &[PathBuf]) {
        log::warn!("valgrind didn't finish writing {} files?!", bad_files.len());

        for file in bad_files {
            log::warn!("Last {} lines of {} :", self.config.bad_file_tail_lines, file.display());
            match fs::read(file) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    for line in StringUtils::tail_lines(&text, self.config.bad_file_tail_lines) {
                        log::warn!("{}", line);
                    }
                }
                Err(e) => log::warn!("  (unreadable: {})", e),
            }
        }
    }
}

fn log_parse_failure(path: &Path, content: &str, error: &XmlError) {
    log::warn!("could not parse {}: {}", path.display(), error);

    let line_index = error.line.saturating_sub(1);
    for line in StringUtils::context_window(content, line_index, PARSE_CONTEXT_LINES) {
        log::warn!("{}", line);
    }
}
