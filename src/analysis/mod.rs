// Mon Oct 19 2026 - Alex

pub mod analyzer;
pub mod reporter;
pub mod status;

pub use analyzer::{AnalysisResult, MemcheckAnalyzer};
pub use reporter::{ExportedError, ExportedReport, ReportOutcome, Reporter};
pub use status::AnalysisStatus;
