// Mon Oct 19 2026 - Alex

pub mod analysis;
pub mod config;
pub mod model;
pub mod parser;
pub mod report;
pub mod symbol;
pub mod utils;

pub use analysis::{AnalysisResult, AnalysisStatus, MemcheckAnalyzer, Reporter};
pub use config::AnalyzerConfig;
pub use model::ErrorRecord;
pub use parser::ReportParser;
pub use report::{ReportReader, WaitBudget};
pub use symbol::{Demangler, SymbolTable, Symbolizer};
