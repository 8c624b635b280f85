// Mon Oct 19 2026 - Alex

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{} never got its closing tag (waited {:.1}s)", .path.display(), .waited.as_secs_f64())]
    Incomplete { path: PathBuf, waited: Duration },
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
