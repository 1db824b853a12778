//! CLI argument parsing and configuration

use crate::separation::EngineKind;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// vocalprep - Vocal detection and stem separation for DJ setlists
///
/// Estimates whether a track contains vocals and, when it does, separates it
/// into instrumental and vocal stems. Instrumental tracks are copied through
/// unmodified. Every command prints a JSON result on stdout.
#[derive(Parser, Debug)]
#[command(name = "vocalprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Separation backend
    #[arg(long, value_enum, global = true, env = "VOCALPREP_ENGINE", default_value_t = EngineKind::Auto)]
    pub engine: EngineKind,

    /// Path to the separation model (ONNX engine)
    #[arg(long, value_name = "PATH", global = true, env = "VOCALPREP_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Analysis frame size in samples
    #[arg(long, value_name = "N", global = true, default_value_t = 2048)]
    pub frame_size: usize,

    /// Hop between analysis frames in samples
    #[arg(long, value_name = "N", global = true, default_value_t = 512)]
    pub hop_length: usize,

    /// Verbose logging on stderr (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only, no progress bars)
    #[arg(short, long, default_value = "false", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Estimate vocal confidence for one file
    Analyze {
        /// Audio file to analyze
        audio_file: PathBuf,
    },

    /// Separate one file into instrumental and vocal stems
    Separate {
        /// Audio file to separate
        audio_file: PathBuf,
        /// Directory for the stems and the original copy
        output_dir: PathBuf,
        /// Filename prefix for the outputs
        #[arg(default_value = "track")]
        prefix: String,
    },

    /// Analyze one setlist track and separate or pass it through
    Process {
        /// Audio file to process
        audio_file: PathBuf,
        /// Song title, used for the output directory and filenames
        song_title: String,
        /// Base output directory
        output_dir: PathBuf,
    },

    /// Process every audio file under a path and write a JSON report
    Batch {
        /// Input path (file or directory)
        input: PathBuf,
        /// Base output directory
        output_dir: PathBuf,
        /// Number of worker threads (defaults to CPU count - 1)
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,
        /// Only scan the top level of the input directory
        #[arg(long = "no-recursive", action = clap::ArgAction::SetFalse)]
        recursive: bool,
    },
}

impl Cli {
    /// Log filter directive based on verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Command {
    /// The input path this command reads
    pub fn input(&self) -> &Path {
        match self {
            Command::Analyze { audio_file }
            | Command::Separate { audio_file, .. }
            | Command::Process { audio_file, .. } => audio_file,
            Command::Batch { input, .. } => input,
        }
    }
}
