// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};

/// One stack location as valgrind recorded it. `dir`, `file` and `line` are empty
/// when the object had no debug info.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Frame {
    pub ip: String,
    pub obj: String,
    pub function: String,
    pub dir: String,
    pub file: String,
    pub line: String,
}

impl Frame {
    pub fn new(ip: &str, obj: &str) -> Self {
        Self {
            ip: ip.to_string(),
            obj: obj.to_string(),
            ..Default::default()
        }
    }

    pub fn with_function(mut self, function: &str) -> Self {
        self.function = function.to_string();
        self
    }

    pub fn with_source(mut self, dir: &str, file: &str, line: &str) -> Self {
        self.dir = dir.to_string();
        self.file = file.to_string();
        self.line = line.to_string();
        self
    }

    pub fn has_source(&self) -> bool {
        !self.dir.is_empty() || !self.file.is_empty()
    }

    pub fn needs_symbolization(&self) -> bool {
        self.line.is_empty()
    }

    /// Function name, or the instruction pointer when valgrind had no name for it.
    pub fn display_name(&self) -> &str {
        if self.function.is_empty() {
            &self.ip
        } else {
            &self.function
        }
    }

    pub fn source_path(&self) -> String {
        if self.dir.is_empty() {
            self.file.clone()
        } else {
            format!("{}/{}", self.dir, self.file)
        }
    }

    /// Location used for identity: source path if known, else the object file.
    pub fn identity_location(&self) -> String {
        if self.has_source() {
            self.source_path()
        } else {
            self.obj.clone()
        }
    }

    pub fn suppression_name(&self) -> &str {
        if self.function.is_empty() {
            "*"
        } else {
            &self.function
        }
    }
}
