// Mon Oct 19 2026 - Alex

pub mod backtrace;
pub mod frame;
pub mod record;

pub use backtrace::Backtrace;
pub use frame::Frame;
pub use record::{ErrorRecord, RecordKey};
