//! Plinth CLI - front-end asset pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plinth_pipeline::TaskId;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "plinth")]
#[command(about = "Builds pages, styles, scripts, images and fonts from src/ into dist/")]
#[command(version)]
pub struct Cli {
    /// Task to run; defaults to `watch`
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to plinth.toml config file
    #[arg(short, long, default_value = "plinth.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render pages into dist/
    Html,
    /// Compile, prefix, purge and minify style sheets
    Css,
    /// Bundle or minify scripts
    Js,
    /// Optimize images
    Images,
    /// Copy and convert fonts
    Fonts,
    /// Remove dist/
    Clean,
    /// Generate the grid stylesheet from grid.toml
    Grid,
    /// Extract per-page critical styles from the built site
    Critical,
    /// Clean, run every asset task, then extract critical styles
    Build,
    /// Build, then serve dist/ and rebuild on changes
    Watch {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
    /// Create plinth.toml, grid.toml and a starter src/ tree
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },
}

impl Commands {
    fn task(&self) -> Option<TaskId> {
        let id = match self {
            Commands::Html => TaskId::Html,
            Commands::Css => TaskId::Css,
            Commands::Js => TaskId::Js,
            Commands::Images => TaskId::Images,
            Commands::Fonts => TaskId::Fonts,
            Commands::Clean => TaskId::Clean,
            Commands::Grid => TaskId::Grid,
            Commands::Critical => TaskId::Critical,
            Commands::Build => TaskId::Build,
            Commands::Watch { .. } => TaskId::Watch,
            Commands::Init { .. } => return None,
        };
        Some(id)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let command = cli.command.unwrap_or(Commands::Watch {
        port: None,
        no_open: false,
    });

    if let Commands::Init { yes } = command {
        return commands::init::run(&commands::project_root(&cli.config), yes);
    }

    let overrides = match &command {
        Commands::Watch { port, no_open } => commands::run::ServerOverrides {
            port: *port,
            open: if *no_open { Some(false) } else { None },
        },
        _ => Default::default(),
    };

    if let Some(task) = command.task() {
        commands::run::run(&cli.config, task, overrides).await?;
    }

    Ok(())
}
