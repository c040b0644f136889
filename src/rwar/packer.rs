//! RWAR archive creation.
//!
//! Packing happens in two passes over the input directory:
//!
//! 1. [`RwarPacker::from_dir`] collects every `*.brwav` file, parses the
//!    number in its name and sorts by it. A bad or repeated number aborts
//!    here, before any output exists.
//! 2. [`RwarWriter`] lays the archive out in memory. The header, section
//!    directory and table are written first with placeholder sizes and
//!    offsets, which are backfilled as each sub-file lands in the DATA
//!    section.
//!
//! ## Layout produced
//!
//! ```text
//! [0x00] Header (0x10) + section directory (TABL, DATA)
//! [0x20] TABL: tag, length, count, entries[flags, offset, length]
//!        zero padding to 0x20
//! [....] DATA: tag, length, zero padding to 0x20
//!        sub-files, each padded to 4 bytes
//! ```

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::BinaryCursor;

use super::structures::*;

/// Convert a layout value to the on-disk `i32`, failing if the archive has
/// outgrown the format.
fn to_i32(value: u64) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::ArchiveTooLarge(value))
}

/// Single-pass archive writer with backfilled sizes.
///
/// The number of entries must be known up front because the table sits
/// before the data.
///
/// ```
/// use brwartool::RwarWriter;
///
/// let mut writer = RwarWriter::new(2)?;
/// writer.push(b"first")?;
/// writer.push(b"second")?;
/// let archive = writer.finish()?;
/// assert_eq!(&archive[..4], b"RWAR");
/// # Ok::<(), brwartool::Error>(())
/// ```
pub struct RwarWriter {
    cursor: BinaryCursor<Cursor<Vec<u8>>>,
    entry_count: usize,
    written: usize,
    /// Absolute offset of the DATA tag.
    data_offset: u64,
    /// Where the next sub-file goes.
    next_offset: u64,
}

impl RwarWriter {
    /// Write the header, section directory and table skeleton for
    /// `entry_count` sub-files.
    pub fn new(entry_count: usize) -> Result<Self> {
        let count = to_i32(entry_count as u64)?;
        let mut cursor = BinaryCursor::in_memory();

        Header {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            file_length: 0,
            header_length: HEADER_LENGTH,
            section_count: SECTION_COUNT,
        }
        .write_to(&mut cursor)?;
        cursor.write_i32(i32::from(HEADER_LENGTH))?;

        cursor.set_position(u64::from(HEADER_LENGTH))?;
        cursor.write_tag(SectionKind::Table.tag())?;
        cursor.write_i32(0)?;
        cursor.write_i32(count)?;
        for _ in 0..entry_count {
            cursor.write_u32(CANONICAL_FLAGS)?;
            cursor.write_i32(0)?;
            cursor.write_i32(0)?;
        }

        let data_offset = cursor.pad_to(SECTION_ALIGNMENT)?;
        let table_length = to_i32(data_offset - u64::from(HEADER_LENGTH))?;

        // Directory: TABL length, then DATA offset.
        cursor.set_position(directory_entry_offset(0) + 4)?;
        cursor.write_i32(table_length)?;
        cursor.write_i32(to_i32(data_offset)?)?;
        // TABL's inline copy of its length.
        cursor.set_position(u64::from(HEADER_LENGTH) + 4)?;
        cursor.write_i32(table_length)?;

        cursor.set_position(data_offset)?;
        cursor.write_tag(SectionKind::Data.tag())?;
        cursor.write_i32(0)?;
        let data_start = cursor.pad_to(SECTION_ALIGNMENT)?;

        debug!(
            "Laid out {entry_count} entries: TABL 0x20..0x{data_offset:X}, first sub-file at 0x{data_start:X}"
        );

        Ok(Self {
            cursor,
            entry_count,
            written: 0,
            data_offset,
            next_offset: data_start,
        })
    }

    /// Append the next sub-file and fill in its table entry.
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        if self.written == self.entry_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("archive was laid out for {} entries", self.entry_count),
            )
            .into());
        }

        let start = self.next_offset;
        let end = start + data.len() as u64;
        to_i32(end.next_multiple_of(SUB_FILE_ALIGNMENT))?;

        let slot = table_entry_offset(self.written);
        self.cursor.set_position(slot + 4)?;
        self.cursor.write_i32(to_i32(start - self.data_offset)?)?;
        self.cursor.write_i32(to_i32(data.len() as u64)?)?;

        self.cursor.set_position(start)?;
        self.cursor.write_bytes(data)?;
        self.next_offset = self.cursor.pad_to(SUB_FILE_ALIGNMENT)?;

        self.written += 1;
        Ok(())
    }

    /// Backfill the total and DATA lengths and return the archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.written != self.entry_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "archive was laid out for {} entries, got {}",
                    self.entry_count, self.written
                ),
            )
            .into());
        }

        let data_end = self.next_offset;
        let data_length = to_i32(data_end - self.data_offset)?;

        self.cursor.set_position(FILE_LENGTH_OFFSET)?;
        self.cursor.write_i32(to_i32(data_end)?)?;
        self.cursor.set_position(directory_entry_offset(1) + 4)?;
        self.cursor.write_i32(data_length)?;
        self.cursor.set_position(self.data_offset + 4)?;
        self.cursor.write_i32(data_length)?;

        Ok(self.cursor.into_bytes())
    }
}

/// Pack in-memory sub-files, in order, into an archive.
pub fn build_archive<T: AsRef<[u8]>>(files: &[T]) -> Result<Vec<u8>> {
    let mut writer = RwarWriter::new(files.len())?;
    for file in files {
        writer.push(file.as_ref())?;
    }
    writer.finish()
}

/// An input sub-file and the number parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub id: u32,
    pub path: PathBuf,
}

/// Outcome of a successful pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSummary {
    pub entries: usize,
    pub archive_length: u64,
}

fn has_sub_file_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SUB_FILE_EXTENSION))
}

/// Parse the decimal number making up a file's stem. Only plain digits are
/// accepted, up to `i32::MAX`.
fn parse_file_id(path: &Path) -> Result<u32> {
    let invalid = || {
        Error::InvalidFileName(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    };

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    stem.parse::<i32>()
        .ok()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(invalid)
}

/// Packs a directory of numbered sub-files.
pub struct RwarPacker {
    inputs: Vec<InputFile>,
}

impl RwarPacker {
    /// Collect and validate the `*.brwav` files in `dir`.
    ///
    /// Files are sorted by the number in their name; that order becomes the
    /// table order. Other files and subdirectories are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFileName`] if a name is not a plain number and
    /// [`Error::DuplicateFileId`] if two names carry the same number.
    pub async fn from_dir(dir: &Path) -> Result<Self> {
        let mut read_dir = fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if has_sub_file_extension(&path) {
                paths.push(path);
            }
        }

        let mut inputs = paths
            .into_iter()
            .map(|path| -> Result<InputFile> {
                Ok(InputFile {
                    id: parse_file_id(&path)?,
                    path,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        inputs.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.path.cmp(&b.path)));

        if let Some(pair) = inputs.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(Error::DuplicateFileId {
                id: pair[0].id,
                first: pair[0].path.clone(),
                second: pair[1].path.clone(),
            });
        }

        debug!("Collected {} input files from {}", inputs.len(), dir.display());
        Ok(Self { inputs })
    }

    /// Input files in table order.
    pub fn inputs(&self) -> &[InputFile] {
        &self.inputs
    }

    /// Build the archive in memory, reading one input file at a time.
    /// `on_added` is called after each file is placed.
    pub async fn pack_to_memory(&self, mut on_added: impl FnMut(&InputFile)) -> Result<Vec<u8>> {
        let mut writer = RwarWriter::new(self.inputs.len())?;
        for input in &self.inputs {
            let data = fs::read(&input.path).await?;
            writer.push(&data)?;
            on_added(input);
        }
        writer.finish()
    }

    /// Build the archive and write it to `output`, creating parent
    /// directories as needed.
    pub async fn pack_to_file(
        &self,
        output: &Path,
        on_added: impl FnMut(&InputFile),
    ) -> Result<PackSummary> {
        let archive = self.pack_to_memory(on_added).await?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(output, &archive).await?;

        Ok(PackSummary {
            entries: self.inputs.len(),
            archive_length: archive.len() as u64,
        })
    }
}
