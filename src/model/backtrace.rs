// Mon Oct 19 2026 - Alex

use crate::model::Frame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Backtrace {
    pub description: String,
    pub frames: Vec<Frame>,
}

impl Backtrace {
    pub fn new(description: &str, frames: Vec<Frame>) -> Self {
        Self {
            description: description.to_string(),
            frames,
        }
    }

    /// What gets fed to the demangler, one entry per frame.
    pub fn display_names(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.display_name().to_string()).collect()
    }

    pub fn identity(&self) -> Vec<(String, String)> {
        self.frames
            .iter()
            .map(|f| (f.display_name().to_string(), f.identity_location()))
            .collect()
    }
}
