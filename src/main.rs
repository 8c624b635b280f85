// Mon Oct 19 2026 - Alex

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use memcheck_analyzer::{
    analysis::{ExportedReport, MemcheckAnalyzer, Reporter},
    config::{AnalyzerConfig, DemanglerKind},
    report::WaitBudget,
    symbol,
    utils::{logging, pluralize},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Summarizes and deduplicates Valgrind memcheck XML reports", long_about = None)]
struct Args {
    /// Memcheck XML files, one per valgrind process.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Source root stripped from frame directories.
    #[arg(long)]
    source_dir: Option<String>,

    /// Also report Leak_PossiblyLost errors.
    #[arg(long)]
    show_all_leaks: bool,

    /// Resolve source lines for frames without debug info.
    #[arg(long, overrides_with = "no_gdb")]
    gdb: bool,

    #[arg(long, overrides_with = "gdb")]
    no_gdb: bool,

    /// JSON file with analyzer settings. Command line flags win.
    #[arg(long)]
    config: Option<PathBuf>,

    /// cxxfilt, builtin or none.
    #[arg(long, value_parser = parse_demangler)]
    demangler: Option<DemanglerKind>,

    /// Seconds to wait for valgrind to finish writing, shared by all files.
    #[arg(long)]
    wait: Option<u64>,

    #[arg(long)]
    json_output: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long)]
    no_progress: bool,

    #[arg(long)]
    no_color: bool,
}

fn parse_demangler(value: &str) -> Result<DemanglerKind, String> {
    DemanglerKind::from_str(value).ok_or_else(|| format!("unknown demangler '{}'", value))
}

fn main() {
    let args = Args::parse();

    logging::init(args.verbose, !args.no_color);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    let start_time = Instant::now();
    eprintln!(
        "{} Analyzing {}",
        "[*]".blue(),
        pluralize(args.files.len(), "report", "reports")
    );

    let progress = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new(args.files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }
        logging::attach_progress(&pb);
        Some(pb)
    };

    let mut analyzer = MemcheckAnalyzer::new(config);
    let budget = WaitBudget::start(analyzer.config().wait_budget());
    let result = analyzer.analyze_with(&args.files, &budget, |file| {
        if let Some(ref pb) = progress {
            pb.set_message(file.display().to_string());
            pb.inc(1);
        }
    });

    if let Some(pb) = progress {
        pb.finish_and_clear();
        logging::detach_progress();
    }

    if !result.bad_files().is_empty() {
        eprintln!(
            "{} Skipped: {}",
            "[!]".yellow(),
            result.bad_files().iter().map(|p| p.display()).join(", ")
        );
    }

    let demangler = symbol::create_demangler(analyzer.config());
    let symbolizer = symbol::create_symbolizer(analyzer.config());
    let reporter = Reporter::new(demangler.as_ref(), &symbolizer);
    let outcome = reporter.report_with_output(&result, analyzer.symbols_mut());

    if let Some(path) = &args.json_output {
        match ExportedReport::new(&result, &outcome).write_json(path) {
            Ok(()) => eprintln!("{} Summary saved to: {}", "[+]".green(), path.display()),
            Err(e) => eprintln!("{} Failed to save summary: {}", "[!]".red(), e),
        }
    }

    let marker = if outcome.status.is_clean() { "[+]".green() } else { "[!]".red() };
    eprintln!(
        "{} {} in {:.2}s",
        marker,
        pluralize(result.files_read(), "report read", "reports read"),
        start_time.elapsed().as_secs_f64()
    );

    std::process::exit(outcome.status.code());
}

fn build_config(args: &Args) -> Result<AnalyzerConfig> {
    // gdb lookups are on unless the file or a flag turns them off.
    let defaults = AnalyzerConfig::new().with_symbolizer(true);
    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::load_over(path, defaults)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => defaults,
    };

    if let Some(dir) = &args.source_dir {
        config = config.with_source_dir(dir.clone());
    }
    if args.show_all_leaks {
        config = config.with_show_all_leaks(true);
    }
    if args.gdb {
        config = config.with_symbolizer(true);
    }
    if args.no_gdb {
        config = config.with_symbolizer(false);
    }
    if let Some(kind) = args.demangler {
        config = config.with_demangler(kind);
    }
    if let Some(secs) = args.wait {
        config = config.with_wait_budget(Duration::from_secs(secs));
    }

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_gdb_enabled_by_default() {
        let config = build_config(&Args::parse_from(["memcheck-analyzer", "r.xml"])).unwrap();
        assert!(config.use_symbolizer);

        let config = build_config(&Args::parse_from(["memcheck-analyzer", "--no-gdb", "r.xml"])).unwrap();
        assert!(!config.use_symbolizer);
    }

    #[test]
    fn test_partial_config_file_keeps_gdb_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer.json");
        fs::write(&path, r#"{"source_dir": "/build/src"}"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = build_config(&Args::parse_from(["memcheck-analyzer", "--config", path_arg.as_str(), "r.xml"])).unwrap();
        assert!(config.use_symbolizer);
        assert_eq!(config.source_dir.as_deref(), Some("/build/src"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer.json");
        fs::write(&path, r#"{"use_symbolizer": false, "source_dir": "/build/src"}"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = build_config(&Args::parse_from(["memcheck-analyzer", "--config", path_arg.as_str(), "r.xml"])).unwrap();
        assert!(!config.use_symbolizer);

        let config = build_config(&Args::parse_from([
            "memcheck-analyzer",
            "--config",
            path_arg.as_str(),
            "--gdb",
            "--source-dir",
            "/other",
            "--wait",
            "5",
            "r.xml",
        ]))
        .unwrap();
        assert!(config.use_symbolizer);
        assert_eq!(config.source_dir.as_deref(), Some("/other"));
        assert_eq!(config.wait_budget(), Duration::from_secs(5));
    }
}
