// Mon Oct 19 2026 - Alex

use crate::config::AnalyzerConfig;
use crate::report::ReportError;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Wall-clock allowance for valgrind to finish writing its reports.
///
/// Anchored once per run and shared by every file, so files read late in a
/// large batch get whatever is left of it.
#[derive(Debug, Clone, Copy)]
pub struct WaitBudget {
    started: Instant,
    budget: Duration,
}

impl WaitBudget {
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_exhausted(&self) -> bool {
        self.elapsed() >= self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }
}

#[derive(Debug, Clone)]
pub struct ReportContents {
    pub path: PathBuf,
    pub content: String,
    /// Bytes dropped after the closing tag.
    pub junk_bytes: u64,
}

pub struct ReportReader {
    closing_marker: String,
    poll_interval: Duration,
}

impl ReportReader {
    pub fn new(closing_marker: &str, poll_interval: Duration) -> Self {
        Self {
            closing_marker: closing_marker.to_string(),
            poll_interval,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(&config.closing_marker(), config.poll_interval())
    }

    /// Waits for the closing tag, cuts everything after it and returns the rest.
    ///
    /// One attempt is always made, even with an exhausted budget. The file is
    /// rewritten in place when there is trailing junk.
    pub fn read(&self, path: &Path, budget: &WaitBudget) -> Result<ReportContents, ReportError> {
        let mut first_run = true;

        loop {
            if !first_run && budget.is_exhausted() {
                return Err(ReportError::Incomplete {
                    path: path.to_path_buf(),
                    waited: budget.elapsed(),
                });
            }
            if !first_run {
                thread::sleep(self.poll_interval.min(budget.remaining()));
            }
            first_run = false;

            if let Some(contents) = self.find_and_truncate(path)? {
                return Ok(contents);
            }
            log::debug!("{} is not finished yet", path.display());
        }
    }

    fn find_and_truncate(&self, path: &Path) -> Result<Option<ReportContents>, ReportError> {
        let io_err = |source: std::io::Error| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(io_err)?;

        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        file.read_to_end(&mut bytes).map_err(io_err)?;

        let end = match find_subslice(&bytes, self.closing_marker.as_bytes()) {
            Some(start) => start + self.closing_marker.len(),
            None => return Ok(None),
        };

        let original_size = bytes.len() as u64;
        let junk_bytes = original_size - end as u64;
        if junk_bytes > 0 {
            file.set_len(end as u64).map_err(io_err)?;
            bytes.truncate(end);
        }

        // A trailing newline is the only thing valgrind writes after the tag on a clean exit.
        if junk_bytes > 1 {
            log::warn!(
                "{} bytes of junk were after {} in {}!",
                junk_bytes,
                self.closing_marker,
                path.display()
            );
        }

        Ok(Some(ReportContents {
            path: path.to_path_buf(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            junk_bytes,
        }))
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
