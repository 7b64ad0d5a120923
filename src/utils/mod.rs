//! Utility modules.

pub mod file;
pub mod retry;
pub mod text;

pub use file::{calculate_checksum, has_extension, read_file_content, relative_path};
pub use retry::{RetryPolicy, Retryable, with_retry};
pub use text::preview;
