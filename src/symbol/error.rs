// Mon Oct 19 2026 - Alex

use crate::utils::ProcessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("External tool failed: {0}")]
    Process(#[from] ProcessError),
    #[error("Symbol table was already resolved")]
    AlreadyResolved,
}
