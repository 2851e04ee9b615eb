//! CLI entry point for markpage

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "markpage")]
#[command(version)]
#[command(about = "Serve Markdown content through Tera templates", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a local server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Render a URL path and print the HTML
    Render {
        /// URL path, such as /blog/post
        #[arg(default_value = "/")]
        path: String,
    },

    /// List content files
    List {
        /// Include drafts
        #[arg(long)]
        drafts: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "markpage=debug,info"
    } else {
        "markpage=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = markpage::Site::new(&base_dir)?;
            tracing::info!("Serving {:?}", base_dir);
            markpage::server::start(site, &ip, port).await?;
        }

        Commands::Render { path } => {
            let site = markpage::Site::new(&base_dir)?;
            markpage::commands::render::run(site, &path)?;
        }

        Commands::List { drafts } => {
            let site = markpage::Site::new(&base_dir)?;
            markpage::commands::list::run(&site, drafts)?;
        }

        Commands::Version => {
            println!("markpage version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
