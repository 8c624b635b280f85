// Mon Oct 19 2026 - Alex

use crate::config::POSSIBLY_LOST_KIND;
use crate::model::{Backtrace, Frame};
use crate::parser::{RawEntry, RawError};
use crate::symbol::{demangle_or_raw, Demangler, SymbolTable};
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// Structural identity of an error: its kind plus, per backtrace, each frame's
/// (function-or-ip, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordKey {
    kind: String,
    backtraces: Vec<Vec<(String, String)>>,
}

impl RecordKey {
    pub fn for_error(kind: &str, backtraces: &[Backtrace]) -> Self {
        Self {
            kind: kind.to_string(),
            backtraces: backtraces.iter().map(|bt| bt.identity()).collect(),
        }
    }
}

/// One deduplicated memcheck error. Immutable once built; equality and hashing
/// go through the cached [`RecordKey`], so descriptions and the instruction
/// pointers of named frames do not matter.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    kind: String,
    backtraces: Vec<Backtrace>,
    #[serde(skip)]
    key: RecordKey,
}

impl ErrorRecord {
    pub fn new(kind: &str, backtraces: Vec<Backtrace>) -> Self {
        let key = RecordKey::for_error(kind, &backtraces);
        Self {
            kind: kind.to_string(),
            backtraces,
            key,
        }
    }

    /// Pairs each stack with the description before it, in document order.
    pub fn from_raw(raw: RawError) -> Self {
        let mut backtraces = Vec::new();
        let mut description: Option<String> = None;

        for entry in raw.entries {
            match entry {
                RawEntry::What(text) | RawEntry::AuxWhat(text) => description = Some(text),
                RawEntry::Stack(frames) => {
                    backtraces.push(Backtrace {
                        description: description.take().unwrap_or_default(),
                        frames,
                    });
                }
                RawEntry::Origin { what, frames } => {
                    backtraces.push(Backtrace {
                        description: what,
                        frames,
                    });
                    description = None;
                }
            }
        }

        ErrorRecord::new(&raw.kind, backtraces)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn backtraces(&self) -> &[Backtrace] {
        &self.backtraces
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn is_possibly_lost(&self) -> bool {
        self.kind == POSSIBLY_LOST_KIND
    }

    /// Human-readable form with a suppression stanza per backtrace. Demangles
    /// once per backtrace and fills in source lines from `symbols` for frames
    /// that had no debug info.
    pub fn render(&self, demangler: &dyn Demangler, symbols: Option<&SymbolTable>) -> String {
        let mut output = format!("{}\n", self.kind);

        for backtrace in &self.backtraces {
            output.push_str(&backtrace.description);
            output.push('\n');

            let names = demangle_or_raw(demangler, &backtrace.display_names());
            for (frame, name) in backtrace.frames.iter().zip(names.iter()) {
                output.push_str(&format!("  {} ({})\n", name, render_location(frame, symbols)));
            }

            output.push_str("Suppression:\n");
            for frame in &backtrace.frames {
                output.push_str(&format!("  fun:{}\n", frame.suppression_name()));
            }
        }

        output
    }
}

fn render_location(frame: &Frame, symbols: Option<&SymbolTable>) -> String {
    if frame.has_source() && !frame.line.is_empty() {
        return format!("{}:{}", frame.source_path(), frame.line);
    }

    if let Some(file_line) = symbols.and_then(|table| table.file_line(&frame.obj, &frame.ip)) {
        return file_line.to_string();
    }

    if frame.has_source() {
        frame.source_path()
    } else {
        frame.obj.clone()
    }
}

impl PartialEq for ErrorRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ErrorRecord {}

impl Hash for ErrorRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{FileLine, NoopDemangler, SymbolError, Symbolizer};
    use std::collections::HashSet;

    fn named(ip: &str, function: &str, file: &str, line: &str) -> Frame {
        Frame::new(ip, "/out/unit_tests")
            .with_function(function)
            .with_source("base", file, line)
    }

    struct UpperDemangler;

    impl Demangler for UpperDemangler {
        fn demangle_batch(&self, names: &[String]) -> Result<Vec<String>, SymbolError> {
            Ok(names.iter().map(|n| n.to_uppercase()).collect())
        }
    }

    struct OneLineSymbolizer;

    impl Symbolizer for OneLineSymbolizer {
        fn symbolize(&self, _binary: &str, addresses: &[String]) -> Result<Vec<Option<FileLine>>, SymbolError> {
            Ok(addresses.iter().map(|_| Some(FileLine::new("resolved.cc", "42"))).collect())
        }
    }

    #[test]
    fn test_equality_ignores_ips_and_descriptions() {
        let a = ErrorRecord::new(
            "InvalidRead",
            vec![Backtrace::new("Invalid read of size 4", vec![named("0x1", "Foo", "foo.cc", "10")])],
        );
        let b = ErrorRecord::new(
            "InvalidRead",
            vec![Backtrace::new("Invalid read of size 8", vec![named("0x2", "Foo", "foo.cc", "11")])],
        );
        let c = ErrorRecord::new(
            "InvalidWrite",
            vec![Backtrace::new("Invalid read of size 4", vec![named("0x1", "Foo", "foo.cc", "10")])],
        );

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<ErrorRecord> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_backtrace_boundaries_are_part_of_identity() {
        let f1 = named("0x1", "A", "a.cc", "1");
        let f2 = named("0x2", "B", "b.cc", "2");
        let split = ErrorRecord::new(
            "SyscallParam",
            vec![Backtrace::new("", vec![f1.clone()]), Backtrace::new("", vec![f2.clone()])],
        );
        let joined = ErrorRecord::new("SyscallParam", vec![Backtrace::new("", vec![f1, f2])]);
        assert_ne!(split, joined);
    }

    #[test]
    fn test_unnamed_frames_use_ip() {
        let a = ErrorRecord::new("Leak_DefinitelyLost", vec![Backtrace::new("", vec![Frame::new("0x10", "/lib/libc.so")])]);
        let b = ErrorRecord::new("Leak_DefinitelyLost", vec![Backtrace::new("", vec![Frame::new("0x20", "/lib/libc.so")])]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_render_layout() {
        let record = ErrorRecord::new(
            "UninitCondition",
            vec![Backtrace::new(
                "Conditional jump or move depends on uninitialised value(s)",
                vec![
                    named("0x1", "_ZN3FooD1Ev", "foo.cc", "12"),
                    Frame::new("0x4C2B0E0", "/usr/lib/libc.so"),
                ],
            )],
        );

        let text = record.render(&NoopDemangler, None);
        assert_eq!(
            text,
            "UninitCondition\n\
             Conditional jump or move depends on uninitialised value(s)\n\
             \x20 _ZN3FooD1Ev (base/foo.cc:12)\n\
             \x20 0x4C2B0E0 (/usr/lib/libc.so)\n\
             Suppression:\n\
             \x20 fun:_ZN3FooD1Ev\n\
             \x20 fun:*\n"
        );
    }

    #[test]
    fn test_render_uses_demangler_output() {
        let record = ErrorRecord::new("Leak", vec![Backtrace::new("lost", vec![named("0x1", "foo", "f.cc", "1")])]);
        let text = record.render(&UpperDemangler, None);
        assert!(text.contains("  FOO (base/f.cc:1)\n"));
        assert!(text.contains("  fun:foo\n"));
    }

    #[test]
    fn test_render_consults_resolved_symbols() {
        let frame = Frame::new("0x99", "/out/unit_tests").with_function("Bar");
        let record = ErrorRecord::new("InvalidFree", vec![Backtrace::new("bad free", vec![frame])]);

        let mut table = SymbolTable::new();
        table.register("/out/unit_tests", "0x99");
        assert!(record.render(&NoopDemangler, Some(&table)).contains("  Bar (/out/unit_tests)\n"));

        table.resolve_all(&OneLineSymbolizer).unwrap();
        assert!(record.render(&NoopDemangler, Some(&table)).contains("  Bar (resolved.cc:42)\n"));
    }
}
