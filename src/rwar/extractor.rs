use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;
use crate::io::ReadAt;

use super::parser::RwarParser;
use super::structures::{RwarArchive, RwarEntry};

/// RWAR archive extractor
pub struct RwarExtractor<R: ReadAt> {
    parser: RwarParser<R>,
}

impl<R: ReadAt> RwarExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: RwarParser::new(reader),
        }
    }

    /// Parse and validate the archive's header, sections and table
    pub async fn read_archive(&self) -> Result<RwarArchive> {
        self.parser.read_archive().await
    }

    /// List all sub-files in the archive
    pub async fn list_entries(&self) -> Result<Vec<RwarEntry>> {
        Ok(self.parser.read_archive().await?.entries)
    }

    /// Extract sub-file data to memory
    pub async fn extract_to_memory(&self, entry: &RwarEntry) -> Result<Vec<u8>> {
        self.parser.read_entry_data(entry).await
    }

    /// Extract sub-file to disk
    pub async fn extract_to_file(&self, entry: &RwarEntry, output_path: &Path) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        Ok(())
    }

    /// Extract every sub-file into `output_dir` as `{index}.brwav`.
    ///
    /// `on_extracted` is called after each file is written.
    ///
    /// The whole table is validated before `output_dir` is created, so a
    /// malformed archive leaves nothing behind. An I/O failure partway
    /// through leaves the files written so far in place.
    ///
    /// # Returns
    ///
    /// The paths written, in table order.
    pub async fn extract_all(
        &self,
        output_dir: &Path,
        mut on_extracted: impl FnMut(&RwarEntry, &Path),
    ) -> Result<Vec<PathBuf>> {
        let entries = self.list_entries().await?;

        fs::create_dir_all(output_dir).await?;

        let mut written = Vec::with_capacity(entries.len());
        for entry in &entries {
            let path = output_dir.join(entry.file_name());
            self.extract_to_file(entry, &path).await?;
            debug!("Extracted entry #{} to {}", entry.index, path.display());
            on_extracted(entry, &path);
            written.push(path);
        }

        Ok(written)
    }
}
