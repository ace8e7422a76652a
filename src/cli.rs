use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "trackscan",
    about = "Extract tempo, beats, spectral features and sections from audio files or URLs"
)]
pub struct Cli {
    /// Audio files (WAV, MP3, FLAC, OGG, M4A) or http(s) URLs
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Config file (defaults to trackscan.toml or the global config)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Download timeout in seconds for URL sources
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Number of sources analyzed in parallel (defaults to one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}
