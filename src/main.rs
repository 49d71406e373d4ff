use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use co_provision::codeocean::CodeOcean;
use co_provision::config::{Config, DEFAULT_DOMAIN, MIN_POLLING_INTERVAL, TOKEN_ENV};
use co_provision::data_asset::Permissions;
use co_provision::manifest::{self, AssetManifest};
use co_provision::provision;
use co_provision::source_check;

#[derive(Parser)]
#[command(name = "co-provision")]
#[command(about = "Create Code Ocean data assets and share them with everyone")]
#[command(version)]
struct Cli {
    /// Code Ocean deployment URL
    #[arg(long, global = true, default_value = DEFAULT_DOMAIN)]
    domain: String,

    /// API access token
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data assets, wait until ready, then grant everyone viewer access
    Create {
        /// TOML manifest of assets; defaults to the pipeline training assets
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Maximum number of assets in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Seconds between readiness checks
        #[arg(long, default_value_t = MIN_POLLING_INTERVAL)]
        polling_interval: u64,

        /// Give up waiting for readiness after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// List each public S3 source before creating anything
        #[arg(long)]
        verify_sources: bool,

        /// Leave permissions untouched
        #[arg(long)]
        skip_permissions: bool,
    },
    /// Write the built-in pipeline training manifest
    Template {
        #[arg(long, short, default_value = "data_assets.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Template { output } => {
            manifest::pipeline_training()?.write(&output)?;
            info!(path = %output.display(), "Wrote manifest");
        }
        Commands::Create {
            manifest,
            concurrency,
            polling_interval,
            timeout,
            verify_sources,
            skip_permissions,
        } => {
            // Configuration problems surface before any network call
            let config = Config::new(&cli.domain, cli.token)?
                .with_polling_interval(polling_interval)?
                .with_timeout(timeout);

            let manifest = match manifest {
                Some(path) => AssetManifest::read(path)?,
                None => manifest::pipeline_training()?,
            };
            manifest.validate()?;

            if verify_sources {
                let s3 = source_check::anon_client(source_check::DEFAULT_REGION).await;
                source_check::check_sources(&s3, &manifest.assets).await?;
            }

            let client = CodeOcean::new(&config)?;
            let concurrency = concurrency.unwrap_or_else(provision::default_concurrency);
            let assets = provision::provision(&client, &manifest.assets, concurrency).await?;

            if !skip_permissions {
                provision::grant_permissions(&client, &assets, &Permissions::everyone_viewer())
                    .await?;
            }
        }
    }

    Ok(())
}
