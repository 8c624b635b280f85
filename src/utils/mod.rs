// Mon Oct 19 2026 - Alex

pub mod logging;
pub mod process;
pub mod string;

pub use logging::LoggingUtils;
pub use process::{ProcessError, ProcessUtils};
pub use string::StringUtils;

pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
