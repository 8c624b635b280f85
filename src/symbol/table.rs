// Mon Oct 19 2026 - Alex

use crate::symbol::{SymbolError, Symbolizer};
use ahash::AHashMap;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLine {
    pub file: String,
    pub line: String,
}

impl FileLine {
    pub fn new(file: &str, line: &str) -> Self {
        Self {
            file: file.to_string(),
            line: line.to_string(),
        }
    }
}

impl fmt::Display for FileLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

type Translation = AHashMap<String, AHashMap<String, Option<FileLine>>>;

enum TableState {
    Collecting,
    Resolved(Translation),
}

/// Batched (binary, address) -> source line lookups.
///
/// Requests are collected while reports are parsed and answered in one
/// `resolve_all` pass, one external query per binary. Until that pass has run
/// every lookup is unknown.
pub struct SymbolTable {
    pending: IndexMap<String, IndexSet<String>>,
    state: TableState,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            pending: IndexMap::new(),
            state: TableState::Collecting,
        }
    }

    pub fn register(&mut self, binary: &str, address: &str) {
        if self.is_resolved() {
            log::debug!("ignoring lookup for {} in {} after resolution", address, binary);
            return;
        }

        self.pending
            .entry(binary.to_string())
            .or_default()
            .insert(address.to_string());
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, TableState::Resolved(_))
    }

    pub fn binary_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(|addrs| addrs.len()).sum()
    }

    /// Runs one symbolizer session per binary. Returns how many addresses got a line.
    pub fn resolve_all(&mut self, symbolizer: &dyn Symbolizer) -> Result<usize, SymbolError> {
        if self.is_resolved() {
            return Err(SymbolError::AlreadyResolved);
        }

        let mut translation: Translation = AHashMap::with_capacity(self.pending.len());
        let mut resolved_count = 0;

        for (binary, addresses) in &self.pending {
            let addresses: Vec<String> = addresses.iter().cloned().collect();
            log::debug!("resolving {} addresses in {}", addresses.len(), binary);

            let results = match symbolizer.symbolize(binary, &addresses) {
                Ok(results) => {
                    if results.len() < addresses.len() {
                        log::warn!(
                            "symbolizer answered {} of {} lookups for {}",
                            results.len(),
                            addresses.len(),
                            binary
                        );
                    }
                    results
                }
                Err(e) => {
                    log::warn!("could not resolve addresses in {}: {}", binary, e);
                    Vec::new()
                }
            };

            let entry = translation.entry(binary.clone()).or_default();
            for (i, address) in addresses.into_iter().enumerate() {
                let file_line = results.get(i).cloned().flatten();
                if file_line.is_some() {
                    resolved_count += 1;
                }
                entry.insert(address, file_line);
            }
        }

        self.state = TableState::Resolved(translation);
        Ok(resolved_count)
    }

    pub fn file_line(&self, binary: &str, address: &str) -> Option<&FileLine> {
        match &self.state {
            TableState::Collecting => None,
            TableState::Resolved(translation) => translation
                .get(binary)
                .and_then(|addrs| addrs.get(address))
                .and_then(|fl| fl.as_ref()),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ProcessError;
    use std::cell::RefCell;

    struct FakeSymbolizer {
        calls: RefCell<Vec<(String, Vec<String>)>>,
        answer: fn(&str) -> Option<FileLine>,
    }

    impl FakeSymbolizer {
        fn new(answer: fn(&str) -> Option<FileLine>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                answer,
            }
        }
    }

    impl Symbolizer for FakeSymbolizer {
        fn symbolize(&self, binary: &str, addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError> {
            self.calls.borrow_mut().push((binary.to_string(), addresses.to_vec()));
            Ok(addresses.iter().map(|a| (self.answer)(a)).collect())
        }
    }

    struct BrokenSymbolizer;

    impl Symbolizer for BrokenSymbolizer {
        fn symbolize(&self, _binary: &str, _addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError> {
            Err(SymbolError::Process(ProcessError::EmptyCommand))
        }
    }

    #[test]
    fn test_lookup_before_resolution_is_unknown() {
        let mut table = SymbolTable::new();
        table.register("/out/unit_tests", "0x1000");
        assert!(table.file_line("/out/unit_tests", "0x1000").is_none());
        assert!(!table.is_resolved());
    }

    #[test]
    fn test_register_batches_per_binary() {
        let mut table = SymbolTable::new();
        table.register("/out/a", "0x1");
        table.register("/out/a", "0x2");
        table.register("/out/a", "0x1");
        table.register("/out/b", "0x3");

        assert_eq!(table.binary_count(), 2);
        assert_eq!(table.pending_count(), 3);

        let symbolizer = FakeSymbolizer::new(|addr| Some(FileLine::new("x.cc", &addr[2..])));
        let resolved = table.resolve_all(&symbolizer).unwrap();
        assert_eq!(resolved, 3);

        let calls = symbolizer.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("/out/a".to_string(), vec!["0x1".to_string(), "0x2".to_string()]));
        assert_eq!(table.file_line("/out/a", "0x2"), Some(&FileLine::new("x.cc", "2")));
    }

    #[test]
    fn test_unregistered_and_unresolved_lookups() {
        let mut table = SymbolTable::new();
        table.register("/out/a", "0x1");
        table.resolve_all(&FakeSymbolizer::new(|_| None)).unwrap();

        assert!(table.file_line("/out/a", "0x1").is_none());
        assert!(table.file_line("/out/a", "0x9").is_none());
        assert!(table.file_line("/out/other", "0x1").is_none());
    }

    #[test]
    fn test_resolve_is_one_shot() {
        let mut table = SymbolTable::new();
        table.register("/out/a", "0x1");
        let symbolizer = FakeSymbolizer::new(|_| Some(FileLine::new("a.cc", "1")));
        table.resolve_all(&symbolizer).unwrap();

        assert!(matches!(table.resolve_all(&symbolizer), Err(SymbolError::AlreadyResolved)));
        assert_eq!(symbolizer.calls.borrow().len(), 1);
        assert_eq!(table.file_line("/out/a", "0x1"), Some(&FileLine::new("a.cc", "1")));
    }

    #[test]
    fn test_failing_symbolizer_leaves_addresses_unknown() {
        let mut table = SymbolTable::new();
        table.register("/out/a", "0x1");
        assert_eq!(table.resolve_all(&BrokenSymbolizer).unwrap(), 0);
        assert!(table.is_resolved());
        assert!(table.file_line("/out/a", "0x1").is_none());
    }
}
