use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "screening-gateway", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Overrides `server.port` from the configuration file.
    #[arg(short, long)]
    pub port: Option<u16>,
}
