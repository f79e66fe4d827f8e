//! gbhwdb CLI - builds the Game Boy hardware database site.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "gbhwdb")]
#[command(about = "Build tool for the Game Boy hardware database site")]
#[command(version)]
pub struct Cli {
    /// Task to run (defaults to build)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to gbhwdb.toml config file
    #[arg(short, long, default_value = "gbhwdb.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile scripts, then run the builder, while compiling styles
    Build,

    /// Compile TypeScript sources to JavaScript
    Scripts,

    /// Lint TypeScript sources
    Lint,

    /// Compile Sass stylesheets
    Styles,

    /// Run the site builder
    Html,

    /// Re-run tasks whenever their inputs change
    Watch,

    /// Preview the built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the builder output directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Write a default gbhwdb.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Build => commands::run::run(&cli.config, "build").await?,
        Commands::Scripts => commands::run::run(&cli.config, "scripts").await?,
        Commands::Lint => commands::run::run(&cli.config, "lint").await?,
        Commands::Styles => commands::run::run(&cli.config, "styles").await?,
        Commands::Html => commands::run::run(&cli.config, "html").await?,
        Commands::Watch => {
            commands::watch::run(&cli.config).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(&cli.config, port, dir).await?;
        }
    }

    Ok(())
}
