// Mon Oct 19 2026 - Alex

use crate::config::AnalyzerConfig;
use crate::model::Frame;
use crate::parser::xml::Element;
use crate::symbol::SymbolTable;
use crate::utils::StringUtils;

const INSTRUCTION_POINTER: &str = "ip";
const OBJECT_FILE: &str = "obj";
const FUNCTION_NAME: &str = "fn";
const SRC_FILE_DIR: &str = "dir";
const SRC_FILE_NAME: &str = "file";
const SRC_LINE: &str = "line";

#[derive(Debug, Clone, PartialEq)]
pub enum RawEntry {
    What(String),
    AuxWhat(String),
    Stack(Vec<Frame>),
    Origin { what: String, frames: Vec<Frame> },
}

/// An `<error>` element reduced to its kind and the children we care about.
///
/// Valgrind writes one `<what>` (or `<xwhat>`) + `<stack>` pair, an optional
/// `<auxwhat>` + `<stack>` pair, and an optional `<origin>` wrapping its own
/// `<what>` and `<stack>`. Only the origin is nested; the other pairs are
/// plain siblings, so entries are kept in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawError {
    pub kind: String,
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameOptions {
    pub source_dir: Option<String>,
    pub top_of_stack: Vec<String>,
}

impl FrameOptions {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            top_of_stack: config.top_of_stack.clone(),
        }
    }

    fn is_top_of_stack(&self, function: &str) -> bool {
        self.top_of_stack.iter().any(|f| f == function)
    }
}

impl RawError {
    pub fn from_element(
        error: &Element,
        options: &FrameOptions,
        mut symbols: Option<&mut SymbolTable>,
    ) -> Self {
        let mut entries = Vec::new();

        for child in error.child_elements() {
            match child.name.as_str() {
                "what" => entries.push(RawEntry::What(child.direct_text())),
                "auxwhat" => entries.push(RawEntry::AuxWhat(child.direct_text())),
                "xwhat" => entries.push(RawEntry::What(child.text_of("text"))),
                "stack" => entries.push(RawEntry::Stack(gather_frames(
                    child,
                    options,
                    symbols.as_deref_mut(),
                ))),
                "origin" => {
                    let frames = child
                        .first_descendant("stack")
                        .map(|stack| gather_frames(stack, options, symbols.as_deref_mut()))
                        .unwrap_or_default();
                    entries.push(RawEntry::Origin {
                        what: child.text_of("what"),
                        frames,
                    });
                }
                _ => {}
            }
        }

        Self {
            kind: error.text_of("kind"),
            entries,
        }
    }
}

/// Frames of one `<stack>`, cut after the first top-of-stack function.
/// Frames without a source line are queued for symbol lookup.
pub fn gather_frames(
    stack: &Element,
    options: &FrameOptions,
    mut symbols: Option<&mut SymbolTable>,
) -> Vec<Frame> {
    let mut frames = Vec::new();

    for node in stack.descendants_named("frame") {
        let frame = Frame {
            ip: node.text_of(INSTRUCTION_POINTER),
            obj: node.text_of(OBJECT_FILE),
            function: node.text_of(FUNCTION_NAME),
            dir: StringUtils::remove_common_root(options.source_dir.as_deref(), &node.text_of(SRC_FILE_DIR)),
            file: node.text_of(SRC_FILE_NAME),
            line: node.text_of(SRC_LINE),
        };

        if frame.needs_symbolization() {
            if let Some(table) = symbols.as_deref_mut() {
                table.register(&frame.obj, &frame.ip);
            }
        }

        let stop = options.is_top_of_stack(&frame.function);
        frames.push(frame);
        if stop {
            break;
        }
    }

    frames
}
