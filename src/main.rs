//! Main entry point for the brwartool CLI application.
//!
//! Dispatches `extract`, `create` and `list` to the library and prints a
//! line per file handled.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use brwartool::cli::Command;
use brwartool::{Cli, LocalFileReader, RwarExtractor, RwarPacker};

/// Application entry point.
///
/// Failures are reported as a one-line message on stdout followed by a
/// non-zero exit status.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the level picked
/// from `-q`/`-v`.
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Extract {
            archive,
            output_dir,
        } => extract(archive, output_dir, cli.is_quiet()).await,
        Command::Create { input_dir, archive } => create(input_dir, archive, cli.is_quiet()).await,
        Command::List { archive } => list(archive, cli.verbose).await,
    }
}

fn open_archive(archive: &Path) -> Result<RwarExtractor<LocalFileReader>> {
    let reader = LocalFileReader::new(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    Ok(RwarExtractor::new(Arc::new(reader)))
}

/// Extract every sub-file of `archive` into `output_dir`.
async fn extract(archive: &Path, output_dir: &Path, quiet: bool) -> Result<()> {
    let extractor = open_archive(archive)?;

    let written = extractor
        .extract_all(output_dir, |_, path| {
            if !quiet {
                println!("  extracting: {}", path.display());
            }
        })
        .await?;

    if !quiet {
        println!("{} files extracted to {}", written.len(), output_dir.display());
    }
    Ok(())
}

/// Pack the numbered `.brwav` files of `input_dir` into `archive`.
async fn create(input_dir: &Path, archive: &Path, quiet: bool) -> Result<()> {
    let packer = RwarPacker::from_dir(input_dir).await?;

    let summary = packer
        .pack_to_file(archive, |input| {
            if !quiet {
                println!("  adding: {}", input.path.display());
            }
        })
        .await
        .with_context(|| format!("Failed to create {}", archive.display()))?;

    if !quiet {
        println!(
            "Created {}: {} files, {}",
            archive.display(),
            summary.entries,
            format_size(summary.archive_length)
        );
    }
    Ok(())
}

/// List the sub-files in `archive`.
///
/// Supports two output formats:
/// - Simple format: the name each entry extracts to, one per line
/// - Verbose format (`-v`): table with flags, offset and length
async fn list(archive: &Path, verbose: bool) -> Result<()> {
    let extractor = open_archive(archive)?;
    let parsed = extractor.read_archive().await?;

    if verbose {
        println!(
            "RWAR v{}.{}, TABL at 0x{:X}, DATA at 0x{:X}",
            parsed.header.version_major,
            parsed.header.version_minor,
            parsed.table.offset,
            parsed.data.offset
        );
        println!(
            "{:>10}  {:>10}  {:>10}  {:>10}  Name",
            "Length", "Offset", "Flags", "Index"
        );
        println!("{}", "-".repeat(60));
    }

    let mut total_length = 0u64;
    for entry in &parsed.entries {
        if verbose {
            println!(
                "{:>10}  0x{:08X}  0x{:08X}  {:>10}  {}",
                entry.length,
                entry.offset,
                entry.flags,
                entry.index,
                entry.file_name()
            );
            total_length += u64::from(entry.length);
        } else {
            println!("{}", entry.file_name());
        }
    }

    if verbose {
        println!("{}", "-".repeat(60));
        println!(
            "{:>10}  {:>36}  {} files",
            total_length,
            "",
            parsed.entries.len()
        );
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
