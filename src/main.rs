use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command};
use fsbridge::bridge::{OpenMode, OpenOptions, StreamBridge};
use fsbridge::config;
use fsbridge::download_url::DownloadRoute;
use fsbridge::scheme::SchemeResolver;
use fsbridge::storage::AdapterRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "fsbridge=debug" } else { "fsbridge=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config(&cli.config)?;
    let settings = Arc::new(app_config.schemes.clone());
    let registry = Arc::new(AdapterRegistry::with_defaults());

    let mut bridge = StreamBridge::new(settings.clone(), registry.clone());
    if let Some(base_url) = &app_config.download_base_url {
        bridge = bridge.with_url_generator(Arc::new(DownloadRoute::new(base_url)?));
    }

    let mut stdout = tokio::io::stdout();

    match cli.command {
        Command::Cat { uri } => {
            // Plain read, nothing is written back / 只读，不回写
            let mut reader = bridge
                .fetch(&uri)
                .await?
                .ok_or_else(|| anyhow!("Cannot read {}", uri))?;
            tokio::io::copy(&mut reader, &mut stdout).await?;
        }
        Command::Put { uri, file, append } => {
            let data = match file {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut data = Vec::new();
                    tokio::io::stdin().read_to_end(&mut data).await?;
                    data
                }
            };

            let mode = if append { OpenMode::APPEND } else { OpenMode::WRITE };
            if !bridge.open(&uri, mode, OpenOptions::default()).await? {
                bail!("Cannot open {}", uri);
            }
            bridge.write(&data)?;
            if !bridge.close().await? {
                bail!("Failed to store {}", uri);
            }
            tracing::info!("Stored {} bytes to {}", data.len(), uri);
        }
        Command::Ls { uri } => {
            if !bridge.opendir(&uri).await? {
                bail!("Cannot list {}", uri);
            }
            while let Some(path) = bridge.readdir()? {
                stdout.write_all(format!("{}\n", path).as_bytes()).await?;
            }
            bridge.closedir();
        }
        Command::Stat { uri } => {
            let stat = bridge
                .stat(&uri)
                .await?
                .ok_or_else(|| anyhow!("No such object: {}", uri))?;
            stdout
                .write_all(format!("{}\n", serde_json::to_string_pretty(&stat)?).as_bytes())
                .await?;
        }
        Command::Rm { uri } => report("rm", &uri, bridge.unlink(&uri).await?)?,
        Command::Mkdir { uri } => report("mkdir", &uri, bridge.mkdir(&uri).await?)?,
        Command::Rmdir { uri } => report("rmdir", &uri, bridge.rmdir(&uri).await?)?,
        Command::Mv { from, to } => report("mv", &from, bridge.rename(&from, &to).await?)?,
        Command::Url { uri } => {
            let url = bridge.external_url(&uri)?;
            stdout.write_all(format!("{}\n", url).as_bytes()).await?;
        }
        Command::Scheme { path } => {
            let resolver = SchemeResolver::new(settings);
            let scheme = resolver.scheme_for_path(&path);
            stdout.write_all(format!("{}\n", scheme).as_bytes()).await?;
        }
        Command::Adapters => {
            let mut listing = serde_json::Map::new();
            for adapter_type in registry.list_adapter_types() {
                if let Some(factory) = registry.get_factory(&adapter_type) {
                    listing.insert(adapter_type, serde_json::to_value(factory.config_items())?);
                }
            }
            stdout
                .write_all(format!("{}\n", serde_json::to_string_pretty(&listing)?).as_bytes())
                .await?;
        }
    }

    stdout.flush().await?;
    Ok(())
}

fn report(operation: &str, uri: &str, succeeded: bool) -> anyhow::Result<()> {
    if !succeeded {
        bail!("{} failed: {}", operation, uri);
    }
    tracing::info!("{} {}", operation, uri);
    Ok(())
}
