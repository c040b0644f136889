//! Low-level RWAR archive parser.
//!
//! Reads archive metadata from any source that implements [`ReadAt`].
//!
//! ## Parsing Strategy
//!
//! 1. Read the fixed header and check the magic and byte-order mark
//! 2. Read the section directory and classify every entry by peeking the
//!    tag at its offset, building a map from tag to directory entry
//! 3. Read the TABL entry count and entries, validating each against the
//!    DATA section before anything is extracted
//!
//! Sub-file bytes are only read on request, one entry at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io::{BinaryCursor, ReadAt};

use super::structures::*;

/// Low-level RWAR parser.
///
/// Typically used through [`RwarExtractor`](super::RwarExtractor) rather
/// than directly.
pub struct RwarParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> RwarParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Read `len` bytes at `offset`, failing up front if the archive is too
    /// short to contain them.
    async fn read_region(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let needed = offset + len as u64;
        if needed > self.size {
            return Err(Error::Truncated {
                needed,
                size: self.size,
            });
        }
        let mut buf = vec![0u8; len];
        self.reader.read_exact_at(offset, &mut buf).await?;
        Ok(buf)
    }

    /// Read and validate the fixed header.
    ///
    /// A file shorter than the header is still checked for its magic and
    /// BOM first, so a foreign file is reported as such rather than as
    /// truncated.
    pub async fn read_header(&self) -> Result<Header> {
        let len = HEADER_FIXED_SIZE.min(self.size as usize);
        let buf = self.read_region(0, len).await?;
        Header::from_bytes(&buf)
    }

    /// Locate the TABL and DATA sections.
    ///
    /// Every directory entry is classified by the tag stored at its offset.
    /// Unknown tags and entries pointing outside the file are skipped; a
    /// missing or repeated TABL/DATA entry is an error.
    ///
    /// # Returns
    ///
    /// The (TABL, DATA) directory entries.
    pub async fn read_sections(&self, header: &Header) -> Result<(SectionEntry, SectionEntry)> {
        let count = header.section_count as usize;
        let directory = self
            .read_region(HEADER_FIXED_SIZE as u64, count * SECTION_ENTRY_SIZE)
            .await?;
        let mut cursor = BinaryCursor::from_slice(&directory);

        let mut sections: HashMap<SectionKind, SectionEntry> = HashMap::new();
        for i in 0..count {
            let entry = SectionEntry::read_from(&mut cursor)?;

            let Ok(offset) = u64::try_from(entry.offset) else {
                debug!("Section #{i} has negative offset {}, skipping", entry.offset);
                continue;
            };
            if offset + 4 > self.size {
                debug!("Section #{i} at 0x{offset:X} lies past the end, skipping");
                continue;
            }

            let mut tag = [0u8; 4];
            self.reader.read_exact_at(offset, &mut tag).await?;
            let Some(kind) = SectionKind::from_tag(&tag) else {
                debug!(
                    "Section #{i} at 0x{offset:X} has unknown tag {:?}, skipping",
                    String::from_utf8_lossy(&tag)
                );
                continue;
            };

            if sections.insert(kind, entry).is_some() {
                return Err(Error::DuplicateSection(kind));
            }
            debug!(
                "Found {kind} section at 0x{offset:X}, length 0x{:X}",
                entry.length
            );
        }

        let table = sections
            .remove(&SectionKind::Table)
            .ok_or(Error::MissingSection(SectionKind::Table))?;
        let data = sections
            .remove(&SectionKind::Data)
            .ok_or(Error::MissingSection(SectionKind::Data))?;
        Ok((table, data))
    }

    /// Read and validate every table entry.
    ///
    /// Each entry's `offset + length` must lie within the DATA section and
    /// within the file. A flags value other than the canonical one is only
    /// logged.
    pub async fn read_entries(
        &self,
        table: &SectionEntry,
        data: &SectionEntry,
    ) -> Result<Vec<RwarEntry>> {
        // Both offsets were checked non-negative by read_sections.
        let table_offset = table.offset as u64;
        let data_offset = data.offset as u64;

        let preamble = self.read_region(table_offset, TABLE_PREAMBLE_SIZE).await?;
        let mut cursor = BinaryCursor::from_slice(&preamble);
        cursor.skip(8)?;
        let count = cursor.read_i32()?;
        let count = usize::try_from(count).map_err(|_| Error::InvalidEntryCount(count))?;

        let raw = self
            .read_region(
                table_offset + TABLE_PREAMBLE_SIZE as u64,
                count * TABLE_ENTRY_SIZE,
            )
            .await?;
        let mut cursor = BinaryCursor::from_slice(&raw);

        let data_length = i64::from(data.length);
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let raw = TableEntry::read_from(&mut cursor)?;

            let (offset, length) = (i64::from(raw.offset), i64::from(raw.length));
            if offset < 0 || length < 0 || offset + length > data_length {
                return Err(Error::EntryOutOfRange {
                    index,
                    offset,
                    length,
                    data_length,
                });
            }

            let entry = RwarEntry {
                index,
                flags: raw.flags,
                offset: raw.offset as u32,
                length: raw.length as u32,
                data_offset,
            };

            let end = entry.absolute_offset() + entry.length as u64;
            if end > self.size {
                return Err(Error::Truncated {
                    needed: end,
                    size: self.size,
                });
            }

            if !entry.has_canonical_flags() {
                warn!("Entry #{index} has unexpected flags 0x{:08X}", entry.flags);
            }
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse all archive metadata. Nothing outside the header, directory and
    /// table is read.
    pub async fn read_archive(&self) -> Result<RwarArchive> {
        let header = self.read_header().await?;
        debug!(
            "RWAR v{}.{}, {} sections, declared length 0x{:X}",
            header.version_major, header.version_minor, header.section_count, header.file_length
        );

        let (table, data) = self.read_sections(&header).await?;
        let entries = self.read_entries(&table, &data).await?;

        Ok(RwarArchive {
            header,
            table,
            data,
            entries,
        })
    }

    /// Read one sub-file's bytes.
    pub async fn read_entry_data(&self, entry: &RwarEntry) -> Result<Vec<u8>> {
        self.read_region(entry.absolute_offset(), entry.length as usize)
            .await
    }
}
