// Mon Oct 19 2026 - Alex

use crate::analysis::{AnalysisResult, AnalysisStatus};
use crate::model::Backtrace;
use crate::symbol::{Demangler, SymbolTable, Symbolizer};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Reporter<'a> {
    demangler: &'a dyn Demangler,
    symbolizer: &'a dyn Symbolizer,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub status: AnalysisStatus,
    /// One entry per unique error, in first-seen order. Empty unless errors were found.
    pub rendered: Vec<String>,
}

impl<'a> Reporter<'a> {
    pub fn new(demangler: &'a dyn Demangler, symbolizer: &'a dyn Symbolizer) -> Self {
        Self { demangler, symbolizer }
    }

    pub fn report(&self, result: &AnalysisResult, symbols: Option<&mut SymbolTable>) -> AnalysisStatus {
        self.report_with_output(result, symbols).status
    }

    /// A parse failure wins over any errors found. Symbol lookups only run when
    /// there is something to print.
    pub fn report_with_output(&self, result: &AnalysisResult, symbols: Option<&mut SymbolTable>) -> ReportOutcome {
        if result.parse_failed() {
            let status = AnalysisStatus::ParseFailed;
            log::error!("{}", status);
            return ReportOutcome {
                status,
                rendered: Vec::new(),
            };
        }

        if result.error_count() == 0 {
            let status = AnalysisStatus::Clean;
            log::info!("{}", status);
            return ReportOutcome {
                status,
                rendered: Vec::new(),
            };
        }

        let status = AnalysisStatus::ErrorsFound(result.error_count());
        log::error!("{}: ", status);

        let symbols = match symbols {
            Some(table) => {
                if !table.is_resolved() {
                    match table.resolve_all(self.symbolizer) {
                        Ok(count) => log::debug!("resolved {} of {} addresses", count, table.pending_count()),
                        Err(e) => log::warn!("symbol resolution skipped: {}", e),
                    }
                }
                Some(&*table)
            }
            None => None,
        };

        let rendered: Vec<String> = result
            .errors()
            .iter()
            .map(|record| record.render(self.demangler, symbols))
            .collect();

        for text in &rendered {
            log::error!("{}", text);
        }

        ReportOutcome { status, rendered }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportedError<'a> {
    pub kind: &'a str,
    pub backtraces: &'a [Backtrace],
    pub rendered: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExportedReport<'a> {
    #[serde(flatten)]
    pub status: AnalysisStatus,
    pub code: i32,
    pub parse_failed: bool,
    pub files_read: usize,
    pub bad_files: &'a [PathBuf],
    pub errors: Vec<ExportedError<'a>>,
}

impl<'a> ExportedReport<'a> {
    pub fn new(result: &'a AnalysisResult, outcome: &'a ReportOutcome) -> Self {
        let errors = result
            .errors()
            .iter()
            .zip(outcome.rendered.iter())
            .map(|(record, rendered)| ExportedError {
                kind: record.kind(),
                backtraces: record.backtraces(),
                rendered,
            })
            .collect();

        Self {
            status: outcome.status,
            code: outcome.status.code(),
            parse_failed: result.parse_failed(),
            files_read: result.files_read(),
            bad_files: result.bad_files(),
            errors,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MemcheckAnalyzer;
    use crate::config::AnalyzerConfig;
    use crate::symbol::{FileLine, NoopDemangler, SymbolError};
    use std::cell::Cell;
    use std::fs;
    use std::time::Duration;

    struct NoLineInfo {
        calls: Cell<usize>,
    }

    impl Symbolizer for NoLineInfo {
        fn symbolize(&self, _binary: &str, addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![None; addresses.len()])
        }
    }

    struct FixedLine;

    impl Symbolizer for FixedLine {
        fn symbolize(&self, _binary: &str, addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError> {
            Ok(vec![Some(FileLine::new("base/alloc.cc", "88")); addresses.len()])
        }
    }

    const SYSCALL_ERROR: &str = r#"<error>
  <unique>0x6d</unique>
  <tid>1</tid>
  <kind>SyscallParam</kind>
  <what>Syscall param write(buf) points to uninitialised byte(s)</what>
  <stack>
    <frame><ip>0x5A1F5D0</ip><obj>/lib/libc-2.11.so</obj><fn>write</fn></frame>
    <frame><ip>0x83751BC</ip><obj>/out/base_unittests</obj><fn>Pickle::Write</fn><dir>/src/base</dir><file>pickle.cc</file><line>42</line></frame>
  </stack>
  <origin>
    <what>Uninitialised value was created by a heap allocation</what>
    <stack>
      <frame><ip>0x4C2B0E0</ip><obj>/usr/lib/valgrind/vgpreload_memcheck.so</obj><fn>malloc</fn></frame>
      <frame><ip>0x8375200</ip><obj>/out/base_unittests</obj><fn>Pickle::Resize</fn><dir>/src/base</dir><file>pickle.cc</file><line>90</line></frame>
    </stack>
  </origin>
</error>"#;

    fn write_report(dir: &Path, name: &str, errors: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!("<?xml version=\"1.0\"?>\n<valgrindoutput>\n{}\n</valgrindoutput>\n", errors),
        )
        .unwrap();
        path
    }

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::new()
            .with_source_dir("/src")
            .with_wait_budget(Duration::ZERO)
    }

    #[test]
    fn test_end_to_end_duplicate_reports() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_report(dir.path(), "1.xml", SYSCALL_ERROR);
        let second = write_report(dir.path(), "2.xml", SYSCALL_ERROR);

        let mut analyzer = MemcheckAnalyzer::new(config());
        let result = analyzer.analyze(&[first, second]);
        assert_eq!(result.error_count(), 1);

        let symbolizer = NoLineInfo { calls: Cell::new(0) };
        let reporter = Reporter::new(&NoopDemangler, &symbolizer);
        let outcome = reporter.report_with_output(&result, analyzer.symbols_mut());

        assert_eq!(outcome.status, AnalysisStatus::ErrorsFound(1));
        assert_eq!(outcome.status.code(), -1);
        assert_eq!(
            outcome.rendered[0],
            "SyscallParam\n\
             Syscall param write(buf) points to uninitialised byte(s)\n\
             \x20 write (/lib/libc-2.11.so)\n\
             \x20 Pickle::Write (base/pickle.cc:42)\n\
             Suppression:\n\
             \x20 fun:write\n\
             \x20 fun:Pickle::Write\n\
             Uninitialised value was created by a heap allocation\n\
             \x20 malloc (/usr/lib/valgrind/vgpreload_memcheck.so)\n\
             \x20 Pickle::Resize (base/pickle.cc:90)\n\
             Suppression:\n\
             \x20 fun:malloc\n\
             \x20 fun:Pickle::Resize\n"
        );
    }

    #[test]
    fn test_identity_ignores_instruction_pointers() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_report(dir.path(), "1.xml", SYSCALL_ERROR);
        let shifted = SYSCALL_ERROR.replace("0x83751BC", "0x93751BC").replace("0x8375200", "0x9375200");
        let second = write_report(dir.path(), "2.xml", &shifted);

        let result = MemcheckAnalyzer::new(config()).analyze(&[first, second]);
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_parse_failure_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_report(dir.path(), "good.xml", SYSCALL_ERROR);
        let broken = write_report(dir.path(), "broken.xml", "<error><kind>X</kind>");

        let result = MemcheckAnalyzer::new(config()).analyze(&[good, broken]);
        assert_eq!(result.error_count(), 1);

        let symbolizer = NoLineInfo { calls: Cell::new(0) };
        let status = Reporter::new(&NoopDemangler, &symbolizer).report(&result, None);
        assert_eq!(status, AnalysisStatus::ParseFailed);
        assert_eq!(status.code(), -2);
    }

    #[test]
    fn test_clean_run() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_report(dir.path(), "empty.xml", "");

        let result = MemcheckAnalyzer::new(config()).analyze(&[empty]);
        let symbolizer = NoLineInfo { calls: Cell::new(0) };
        let status = Reporter::new(&NoopDemangler, &symbolizer).report(&result, None);
        assert_eq!(status, AnalysisStatus::Clean);
        assert_eq!(status.code(), 0);
    }

    #[test]
    fn test_missing_debug_info_falls_back_to_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), "r.xml", SYSCALL_ERROR);

        let mut analyzer = MemcheckAnalyzer::new(config().with_symbolizer(true));
        let result = analyzer.analyze(&[path]);

        let symbolizer = NoLineInfo { calls: Cell::new(0) };
        let outcome = Reporter::new(&NoopDemangler, &symbolizer).report_with_output(&result, analyzer.symbols_mut());

        // One session per binary: libc and the memcheck preload.
        assert_eq!(symbolizer.calls.get(), 2);
        assert!(outcome.rendered[0].contains("  write (/lib/libc-2.11.so)\n"));
        assert!(outcome.rendered[0].contains("  malloc (/usr/lib/valgrind/vgpreload_memcheck.so)\n"));
    }

    #[test]
    fn test_resolved_lines_replace_object_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), "r.xml", SYSCALL_ERROR);

        let mut analyzer = MemcheckAnalyzer::new(config().with_symbolizer(true));
        let result = analyzer.analyze(&[path]);

        let outcome = Reporter::new(&NoopDemangler, &FixedLine).report_with_output(&result, analyzer.symbols_mut());
        assert!(outcome.rendered[0].contains("  write (base/alloc.cc:88)\n"));
        assert!(outcome.rendered[0].contains("  Pickle::Write (base/pickle.cc:42)\n"));
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), "r.xml", SYSCALL_ERROR);

        let mut analyzer = MemcheckAnalyzer::new(config());
        let result = analyzer.analyze(&[path]);
        let symbolizer = NoLineInfo { calls: Cell::new(0) };
        let outcome = Reporter::new(&NoopDemangler, &symbolizer).report_with_output(&result, None);

        let out = dir.path().join("summary.json");
        ExportedReport::new(&result, &outcome).write_json(&out).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["status"], "errors_found");
        assert_eq!(json["count"], 1);
        assert_eq!(json["code"], -1);
        assert_eq!(json["errors"][0]["kind"], "SyscallParam");
        assert_eq!(json["errors"][0]["backtraces"][1]["frames"][0]["function"], "malloc");
    }
}
