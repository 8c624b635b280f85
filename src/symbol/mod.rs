// Mon Oct 19 2026 - Alex

pub mod demangle;
pub mod error;
pub mod resolver;
pub mod table;

pub use demangle::{create_demangler, demangle_or_raw, BuiltinDemangler, CxxFiltDemangler, Demangler, NoopDemangler};
pub use error::SymbolError;
pub use resolver::{GdbSymbolizer, Symbolizer};
pub use table::{FileLine, SymbolTable};

use crate::config::AnalyzerConfig;

pub fn create_symbolizer(config: &AnalyzerConfig) -> GdbSymbolizer {
    GdbSymbolizer::new(config.symbolizer_command.clone())
}

/// `None` when symbol resolution is turned off; every lookup is then unknown.
pub fn create_symbol_table(config: &AnalyzerConfig) -> Option<SymbolTable> {
    if config.use_symbolizer {
        Some(SymbolTable::new())
    } else {
        None
    }
}
