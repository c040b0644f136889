use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "brwartool")]
#[command(version)]
#[command(about = "Extract and create RWAR (.brwar) wave archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  brwartool extract sound.brwar waves/     write waves/0.brwav, waves/1.brwav, ...\n  \
  brwartool create waves/ sound.brwar      pack waves/*.brwav in numeric order\n  \
  brwartool -v list sound.brwar            show flags, offsets and lengths")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Only print errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show debug logging and detailed listings
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract every sub-file of an archive into a folder
    Extract {
        /// Archive to read
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Folder to write {index}.brwav files into (created if absent)
        #[arg(value_name = "FOLDER")]
        output_dir: PathBuf,
    },

    /// Create an archive from a folder of numbered .brwav files
    Create {
        /// Folder holding 0.brwav, 1.brwav, ...
        #[arg(value_name = "FOLDER")]
        input_dir: PathBuf,

        /// Archive to write
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },

    /// List the sub-files of an archive
    List {
        /// Archive to read
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Default log level, used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::ERROR
        } else if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extract() {
        let cli = Cli::try_parse_from(["brwartool", "extract", "a.brwar", "out"]).unwrap();
        match &cli.command {
            Command::Extract {
                archive,
                output_dir,
            } => {
                assert_eq!(archive, &PathBuf::from("a.brwar"));
                assert_eq!(output_dir, &PathBuf::from("out"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level(), LevelFilter::WARN);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["brwartool", "create", "in", "b.brwar", "-q"]).unwrap();
        assert!(cli.is_quiet());
        assert_eq!(cli.log_level(), LevelFilter::ERROR);
    }

    #[test]
    fn missing_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["brwartool", "extract", "a.brwar"]).is_err());
        assert!(Cli::try_parse_from(["brwartool"]).is_err());
        assert!(Cli::try_parse_from(["brwartool", "unpack", "a", "b"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["brwartool", "-q", "-v", "list", "a.brwar"]).is_err());
    }
}
