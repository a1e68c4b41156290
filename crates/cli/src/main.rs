use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// stagehand - deployment configuration pipeline
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Render the source template tree into a build directory
  Template {
    /// Directory to render into
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,
  },

  /// Publish a build directory into the deployment base via symlinks
  Link {
    /// Directory to publish
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,
  },

  /// Register a project and scaffold its source directory
  NewProject {
    /// Project name
    name: String,

    /// Skip creating the empty .env.tmpl
    #[arg(long)]
    no_env: bool,
  },

  /// Compare the current build against the previous one and restart changed services
  Diff {
    /// Restart configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Print the changed services without restarting anything
    #[arg(short = 'n', long)]
    dry_run: bool,
  },

  /// Check the configuration files for syntax and consistency
  Validate,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Template { build_dir } => cmd::cmd_template(&build_dir),
    Commands::Link { build_dir } => cmd::cmd_link(&build_dir),
    Commands::NewProject { name, no_env } => cmd::cmd_new_project(&name, no_env),
    Commands::Diff { config, dry_run } => cmd::cmd_diff(&config, dry_run),
    Commands::Validate => cmd::cmd_validate(),
  }
}
