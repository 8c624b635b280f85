// Mon Oct 19 2026 - Alex

pub mod error;
pub mod reader;

pub use error::ReportError;
pub use reader::{ReportContents, ReportReader, WaitBudget};
