//! Document sources.
//!
//! Only the local file system is supported: a directory tree of text files
//! filtered by extension.

mod local;

pub use local::LocalSource;
