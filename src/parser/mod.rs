// Mon Oct 19 2026 - Alex

pub mod node;
pub mod xml;

pub use node::{gather_frames, FrameOptions, RawEntry, RawError};
pub use xml::{parse_document, Element, XmlError, XmlErrorKind};

use crate::config::{AnalyzerConfig, POSSIBLY_LOST_KIND};
use crate::symbol::SymbolTable;

/// Turns the text of a finished report into raw errors.
pub struct ReportParser {
    options: FrameOptions,
    show_all_leaks: bool,
}

impl ReportParser {
    pub fn new(options: FrameOptions) -> Self {
        Self {
            options,
            show_all_leaks: false,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(FrameOptions::from_config(config)).with_show_all_leaks(config.show_all_leaks)
    }

    pub fn with_show_all_leaks(mut self, show: bool) -> Self {
        self.show_all_leaks = show;
        self
    }

    /// Either the whole document parses or nothing is returned; a syntax error
    /// never yields a partial list. Possibly-lost leaks are skipped before their
    /// frames are looked at unless `show_all_leaks` is set.
    pub fn parse(&self, content: &str, mut symbols: Option<&mut SymbolTable>) -> Result<Vec<RawError>, XmlError> {
        let root = parse_document(content)?;
        let mut errors = Vec::new();
        let mut skipped = 0usize;

        for node in root.descendants_named("error") {
            if !self.show_all_leaks && node.text_of("kind") == POSSIBLY_LOST_KIND {
                skipped += 1;
                continue;
            }
            errors.push(RawError::from_element(node, &self.options, symbols.as_deref_mut()));
        }

        if skipped > 0 {
            log::debug!("skipped {} possibly-lost leaks", skipped);
        }

        Ok(errors)
    }
}
