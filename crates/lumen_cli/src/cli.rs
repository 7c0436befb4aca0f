use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Progressive photon mapping, one image per pass
    Sppm,
    /// Direct lighting only, a single image
    Direct,
}

#[derive(Debug, Parser)]
#[command(name = "lumen")]
#[command(about = "Offline renderer using stochastic progressive photon mapping")]
pub struct Args {
    /// Scene description (JSON)
    pub scene: PathBuf,

    /// Output prefix; passes are written as <prefix>_<pass>.png
    #[arg(short, long, default_value = "render")]
    pub output: String,

    #[arg(short, long, value_enum, default_value = "sppm")]
    pub mode: Mode,

    /// Override the number of photon passes
    #[arg(long)]
    pub passes: Option<u32>,

    /// Override the photons emitted per light per pass
    #[arg(long)]
    pub photons: Option<u32>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only write every n-th pass (the last one is always written)
    #[arg(long, default_value = "1")]
    pub save_every: u32,

    /// Linear scale applied to radiance before gamma and quantization
    #[arg(short, long, default_value = "1.0")]
    pub exposure: f32,

    /// Set the logging level (RUST_LOG still applies per module)
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
