use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::rwar::SectionKind;

/// Result alias used throughout brwartool.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reading or writing RWAR archives.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid File Magic: {found}")]
    BadMagic { found: String },

    #[error("Invalid Byte Order Mark: 0x{0:04X}")]
    BadByteOrderMark(u16),

    #[error("{0} section not found")]
    MissingSection(SectionKind),

    #[error("{0} section listed more than once")]
    DuplicateSection(SectionKind),

    #[error("Invalid entry count: {0}")]
    InvalidEntryCount(i32),

    #[error(
        "Entry #{index} (offset 0x{offset:X}, length 0x{length:X}) lies outside the DATA section (length 0x{data_length:X})"
    )]
    EntryOutOfRange {
        index: usize,
        offset: i64,
        length: i64,
        data_length: i64,
    },

    #[error("Archive is truncated: need {needed} bytes, file has {size}")]
    Truncated { needed: u64, size: u64 },

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Duplicate file id {id}: {} and {}", first.display(), second.display())]
    DuplicateFileId {
        id: u32,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Archive would be {0} bytes, larger than the format allows")]
    ArchiveTooLarge(u64),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
