mod config;
mod service;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use service::SpawnerService;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "spawner")]
#[command(about = "Browse, route and validate skill documents", long_about = None)]
struct Cli {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Extra config file, layered over ~/.spawner/spawner.toml and ./spawner.toml
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List loaded skills
    List,

    /// Show one skill by name, title, tag or trigger keyword
    Show {
        name: String,

        /// Print the skill as a Markdown document
        #[arg(long)]
        markdown: bool,
    },

    /// Route a task description to the skills that should handle it
    Route {
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },

    /// Show who a skill receives work from and hands work to
    Collab { name: String },

    /// Show hand-off edges, for one skill or for the whole library
    Graph { name: Option<String> },

    /// Load every skill and report problems. Exits non-zero on errors.
    Validate,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    let service = SpawnerService::new(config, cli.json);
    service.run(cli.command).await
}
