//! CLI entry point for spacetraveling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacetraveling::{commands, server, Site};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog front-end rendering posts from a Prismic repository", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Read posts from a JSON fixture file instead of the CMS
    #[arg(short, long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to server.ip)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// List posts or routes
    List {
        /// Type of content to list (post, route)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Show a post's metadata and outline
    Show {
        /// The post's uid
        uid: String,
    },

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,tower_http=debug,info"
    } else {
        "spacetraveling=info"
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
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let fixture = cli.fixture.as_deref();

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = Site::new(&base_dir)?;
            let cms = site.cms_client(fixture)?;
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());
            let port = port.unwrap_or(site.config.server.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&site, cms, &ip, port).await?;
        }

        Commands::Generate => {
            let site = Site::new(&base_dir)?;
            let cms = site.cms_client(fixture)?;
            tracing::info!("Generating static files...");

            let summary = commands::generate::run(&site, cms).await?;
            println!(
                "Generated {} listing pages and {} posts in {:?}",
                summary.listing_pages, summary.posts, site.public_dir
            );
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            let cms = site.cms_client(fixture)?;
            commands::list::run(&site, cms.as_ref(), &r#type).await?;
        }

        Commands::Show { uid } => {
            let site = Site::new(&base_dir)?;
            let cms = site.cms_client(fixture)?;
            commands::show::run(&site, cms.as_ref(), &uid).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            commands::clean::run(&site)?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
