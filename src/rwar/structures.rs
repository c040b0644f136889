use std::fmt;
use std::io::{Read, Seek, Write};

use crate::error::{Error, Result};
use crate::io::BinaryCursor;

/// File signature at offset 0.
pub const MAGIC: &[u8; 4] = b"RWAR";
/// Byte-order marker. RWAR archives are always big-endian.
pub const BYTE_ORDER_MARK: u16 = 0xFEFF;
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// Header length written into the header; also where the TABL section starts.
pub const HEADER_LENGTH: u16 = 0x20;
/// Bytes of the header before the section directory.
pub const HEADER_FIXED_SIZE: usize = 0x10;
/// Position of the total file length field.
pub const FILE_LENGTH_OFFSET: u64 = 0x08;
/// Number of sections the packer writes (TABL and DATA).
pub const SECTION_COUNT: u16 = 2;
/// One section directory entry: offset + length.
pub const SECTION_ENTRY_SIZE: usize = 8;

/// TABL tag, length and entry count.
pub const TABLE_PREAMBLE_SIZE: usize = 12;
/// One table entry: flags + offset + length.
pub const TABLE_ENTRY_SIZE: usize = 12;
/// Flags value found on every entry of known archives.
pub const CANONICAL_FLAGS: u32 = 0x0100_0000;

/// TABL is padded so DATA starts on this boundary; DATA's own header is
/// padded to it too.
pub const SECTION_ALIGNMENT: u64 = 0x20;
/// Every sub-file starts on this boundary.
pub const SUB_FILE_ALIGNMENT: u64 = 4;
/// Extension of extracted sub-files.
pub const SUB_FILE_EXTENSION: &str = "brwav";

/// The two section types an archive must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Table,
    Data,
}

impl SectionKind {
    pub const fn tag(self) -> &'static [u8; 4] {
        match self {
            SectionKind::Table => b"TABL",
            SectionKind::Data => b"DATA",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"TABL" => Some(SectionKind::Table),
            b"DATA" => Some(SectionKind::Data),
            _ => None,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionKind::Table => "TABL",
            SectionKind::Data => "DATA",
        })
    }
}

/// Fixed part of the RWAR header (0x10 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version_major: u8,
    pub version_minor: u8,
    pub file_length: i32,
    pub header_length: u16,
    pub section_count: u16,
}

impl Header {
    /// Parse and validate the fixed header.
    ///
    /// The magic is checked before the BOM, and both before the length, so
    /// a short foreign file is reported by its signature. A short file that
    /// does start like an RWAR header is reported as truncated.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let truncated = || Error::Truncated {
            needed: HEADER_FIXED_SIZE as u64,
            size: data.len() as u64,
        };
        let mut cursor = BinaryCursor::from_slice(data);

        let magic = cursor.read_fixed_string(MAGIC.len().min(data.len()))?;
        if magic.as_bytes() != MAGIC {
            return Err(Error::BadMagic { found: magic });
        }

        if data.len() < MAGIC.len() + 2 {
            return Err(truncated());
        }
        let bom = cursor.read_u16()?;
        if bom != BYTE_ORDER_MARK {
            return Err(Error::BadByteOrderMark(bom));
        }

        if data.len() < HEADER_FIXED_SIZE {
            return Err(truncated());
        }

        Ok(Self {
            version_major: cursor.read_u8()?,
            version_minor: cursor.read_u8()?,
            file_length: cursor.read_i32()?,
            header_length: cursor.read_u16()?,
            section_count: cursor.read_u16()?,
        })
    }

    pub fn write_to<S: Write + Seek>(&self, cursor: &mut BinaryCursor<S>) -> Result<()> {
        cursor.write_tag(MAGIC)?;
        cursor.write_u16(BYTE_ORDER_MARK)?;
        cursor.write_u8(self.version_major)?;
        cursor.write_u8(self.version_minor)?;
        cursor.write_i32(self.file_length)?;
        cursor.write_u16(self.header_length)?;
        cursor.write_u16(self.section_count)?;
        Ok(())
    }
}

/// A section directory entry, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    /// Absolute offset of the section's tag.
    pub offset: i32,
    pub length: i32,
}

impl SectionEntry {
    pub fn read_from<S: Read + Seek>(cursor: &mut BinaryCursor<S>) -> Result<Self> {
        Ok(Self {
            offset: cursor.read_i32()?,
            length: cursor.read_i32()?,
        })
    }
}

/// A table entry, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub flags: u32,
    /// Offset relative to the DATA section's tag.
    pub offset: i32,
    pub length: i32,
}

impl TableEntry {
    pub fn read_from<S: Read + Seek>(cursor: &mut BinaryCursor<S>) -> Result<Self> {
        Ok(Self {
            flags: cursor.read_u32()?,
            offset: cursor.read_i32()?,
            length: cursor.read_i32()?,
        })
    }
}

/// A validated sub-file entry, ready to be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RwarEntry {
    /// Position in the table; also the extracted file's name.
    pub index: usize,
    pub flags: u32,
    /// Offset relative to the DATA section's tag.
    pub offset: u32,
    pub length: u32,
    /// Absolute offset of the DATA section.
    pub data_offset: u64,
}

impl RwarEntry {
    /// Absolute offset of this sub-file's first byte.
    pub fn absolute_offset(&self) -> u64 {
        self.data_offset + self.offset as u64
    }

    pub fn has_canonical_flags(&self) -> bool {
        self.flags == CANONICAL_FLAGS
    }

    /// Name the sub-file is extracted under: `{index}.brwav`.
    pub fn file_name(&self) -> String {
        format!("{}.{SUB_FILE_EXTENSION}", self.index)
    }
}

/// Absolute position of section directory entry `index`.
pub const fn directory_entry_offset(index: usize) -> u64 {
    (HEADER_FIXED_SIZE + index * SECTION_ENTRY_SIZE) as u64
}

/// Absolute position of table entry `index` in an archive whose TABL
/// section starts right after the header.
pub const fn table_entry_offset(index: usize) -> u64 {
    HEADER_LENGTH as u64 + (TABLE_PREAMBLE_SIZE + index * TABLE_ENTRY_SIZE) as u64
}

/// Parsed archive metadata. Sub-file bytes are read on demand.
#[derive(Debug, Clone)]
pub struct RwarArchive {
    pub header: Header,
    pub table: SectionEntry,
    pub data: SectionEntry,
    pub entries: Vec<RwarEntry>,
}
