use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (bitsamp ",
    env!("BITSAMP_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for resampling and interleaving packed sample streams",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract windows of samples from one stream and rescale them.
    Resample(ResampleArgs),

    /// Concatenate one sample from each of several streams per round.
    Interleave(InterleaveArgs),
}

/// Options shared by both operations.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Output file (use "-" or omit for stdout).
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// YAML job file with parameter keys. Flags given here take precedence.
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Output buffer size in bytes, raised to one window if smaller.
    #[arg(long, value_name = "BYTES", default_value_t = 64 * 1024)]
    pub buffer_size: usize,

    /// Pad the output to a multiple of this many bits every OutputAlignRepeat windows.
    #[arg(long, value_name = "BITS")]
    pub output_align_bits: Option<i64>,

    /// Windows between output alignments (0 = never).
    #[arg(long, value_name = "N")]
    pub output_align_repeat: Option<i64>,

    /// Stop after this many windows (0 = until the input ends).
    #[arg(long, value_name = "N")]
    pub repeat: Option<i64>,
}

#[derive(Debug, Args)]
pub struct ResampleArgs {
    /// Input stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub job: JobArgs,

    /// Bits per input sample (1-16).
    #[arg(long, value_name = "BITS")]
    pub input_bits: Option<i64>,

    /// Samples per window.
    #[arg(long, value_name = "N")]
    pub samples: Option<i64>,

    /// Bits skipped before each window.
    #[arg(long, value_name = "BITS")]
    pub bits_before: Option<i64>,

    /// Bits skipped after each window.
    #[arg(long, value_name = "BITS")]
    pub bits_after: Option<i64>,

    /// Windows between input alignments (0 = never).
    #[arg(long, value_name = "N")]
    pub input_align_repeat: Option<i64>,

    /// Skip input to a multiple of this many bits every InputAlignRepeat windows.
    #[arg(long, value_name = "BITS")]
    pub input_align_bits: Option<i64>,

    /// Bits per output sample (1-16, defaults to input bits).
    #[arg(long, value_name = "BITS")]
    pub output_bits: Option<i64>,

    /// Reposition the input to where the previous buffer stopped before every fill.
    #[arg(long)]
    pub seek_source: bool,
}

#[derive(Debug, Args)]
pub struct InterleaveArgs {
    /// Input streams, in output order (defaults to DataSource from the job file).
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub job: JobArgs,

    /// Bits per sample, one value or one per input; the last value repeats.
    #[arg(long, value_name = "BITS", value_delimiter = ',')]
    pub input_bits: Vec<i64>,

    /// Windows between input alignments, per input like --input-bits.
    #[arg(long, value_name = "N", value_delimiter = ',')]
    pub input_align_repeat: Vec<i64>,

    /// Input alignment unit in bits, per input like --input-bits.
    #[arg(long, value_name = "BITS", value_delimiter = ',')]
    pub input_align_bits: Vec<i64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
