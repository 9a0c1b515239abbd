use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "forkcast-server",
    about = "Forkcast Backend - resolve webpage and video URLs into caption transcriptions or direct media URLs",
    version,
    long_about = "HTTP service that accepts an arbitrary webpage or video-platform URL and returns either a plain-text transcription built from its subtitle tracks or a resolved direct media URL, using a cascade of extraction strategies."
)]
pub struct Cli {
    /// Address to bind (overrides the config file)
    #[arg(long, env = "FORKCAST_HOST")]
    pub host: Option<String>,

    /// Port to bind (overrides the config file)
    #[arg(short, long, env = "FORKCAST_PORT")]
    pub port: Option<u16>,

    /// Path to a config file (defaults to ./config.yaml, then the user config dir)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,
}
