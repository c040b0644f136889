//! # brwartool
//!
//! Extract and create RWAR (`.brwar`) wave archives.
//!
//! An RWAR archive holds a table of `.brwav` sub-files and one data blob.
//! This library parses the table and copies each sub-file out, and packs a
//! directory of numbered sub-files back into an archive, recomputing every
//! offset, length and padding on the way.
//!
//! ## Features
//!
//! - Validate magic, byte-order mark, section directory and table ranges
//!   before anything is written
//! - Extract sub-files one at a time from any [`ReadAt`] source
//! - Pack `0.brwav`, `1.brwav`, ... in numeric order with 4-byte alignment
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use brwartool::{LocalFileReader, RwarExtractor};
//!
//! #[tokio::main]
//! async fn main() -> brwartool::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new(Path::new("sound.brwar"))?);
//!     let extractor = RwarExtractor::new(reader);
//!
//!     for entry in extractor.list_entries().await? {
//!         println!("{} ({} bytes)", entry.file_name(), entry.length);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod rwar;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{BinaryCursor, LocalFileReader, MemoryReader, ReadAt};
pub use rwar::{RwarEntry, RwarExtractor, RwarPacker, RwarWriter, build_archive};
