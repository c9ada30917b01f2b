//! mesh-sync - applies configuration objects to the mesh control plane

mod config;
mod manifest;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Args, Command, LogFormat};
use manifest::Manifest;
use mesh_objects::{RevisionCache, SyncClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mesh_sync={0},mesh_objects={0}", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(2);
    }

    let config = args.client_config();
    info!(api = %config.api_base(), "Starting mesh-sync");

    let cache = Arc::new(RevisionCache::new());
    let client = SyncClient::new(config, cache)?;

    client.ping().await?;

    match args.command {
        Command::Ping => {
            info!("Control plane reachable");
        }
        Command::Apply { manifest } => {
            let manifest = Manifest::load(&manifest)?;
            info!(objects = manifest.objects.len(), "Applying manifest");

            let report = client.apply_all(&manifest.objects).await;
            info!(
                created = report.created(),
                existing = report.existing(),
                cached = report.cached(),
                failed = report.failed.len(),
                rejected = report.rejected.len(),
                "Apply finished"
            );
            for (revision, e) in &report.failed {
                error!(revision = %revision, error = %e, "Not applied");
            }
            if !report.is_success() {
                anyhow::bail!(
                    "{} object(s) failed to apply",
                    report.failed.len() + report.rejected.len()
                );
            }
        }
        Command::Change { change_set } => {
            let spec = manifest::load_change_spec(&change_set)?;
            client.change(&spec.kind, &spec.key, spec.changes).await?;
            info!(kind = %spec.kind, key = %spec.key, "Change applied");
        }
    }

    Ok(())
}
