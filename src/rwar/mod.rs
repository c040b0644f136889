//! RWAR archive parsing, extraction and creation.
//!
//! RWAR (`.brwar`) is a Nintendo wave archive: a fixed table of embedded
//! `.brwav` sub-files followed by one contiguous data blob.
//!
//! ## Architecture
//!
//! - [`structures`]: layout constants and the header, directory and table records
//! - [`parser`]: reads and validates archive metadata from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: high-level extraction API
//! - [`packer`]: collects numbered input files and writes new archives
//!
//! ## Format Overview
//!
//! All fields are big-endian.
//!
//! ```text
//! [0x00] Magic "RWAR"            (4)
//! [0x04] BOM 0xFEFF              (2)
//! [0x06] Version major, minor    (1 + 1)
//! [0x08] Total file length       (4)
//! [0x0C] Header length (0x20)    (2)
//! [0x0E] Section count           (2)
//! [0x10] Section directory       (offset 4 + length 4) x count
//!
//! TABL: tag, length, entry count, entries[flags 4, offset 4, length 4]
//! DATA: tag, length, padding to 0x20, sub-files each aligned to 4 bytes
//! ```
//!
//! Entry offsets are relative to the DATA section's tag. Entry lengths are
//! the sub-file's true size; alignment padding is not counted.
//!
//! ## Limitations
//!
//! - No validation beyond magic, BOM, section presence and entry ranges
//! - Only the TABL and DATA sections are understood
//! - Extraction is not transactional: an I/O error partway through leaves
//!   the sub-files already written in place

mod extractor;
mod packer;
mod parser;
mod structures;

pub use extractor::RwarExtractor;
pub use packer::{InputFile, PackSummary, RwarPacker, RwarWriter, build_archive};
pub use parser::RwarParser;
pub use structures::*;
