use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "yield-links")]
#[command(about = "Extracts links from rendered pages, including lazy-loaded content")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve,

    /// Run one extraction and print the JSON response
    Extract {
        /// Page to extract links from
        url: String,

        /// Bearer credential for the identity service
        #[arg(short, long)]
        token: Option<String>,

        /// Skip the identity service and keep results in memory
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}
