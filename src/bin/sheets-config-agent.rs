use std::sync::Arc;

use anyhow::Result;
use clap::arg;
use clap::command;
use clap::Parser;
use reqwest::Client;
use sheets_config_agent::cache::config_cache::ConfigCache;
use sheets_config_agent::cache::namespace_record::FreshnessPolicy;
use sheets_config_agent::credentials::refresher::CredentialRefresher;
use sheets_config_agent::credentials::store::CredentialStore;
use sheets_config_agent::server;
use sheets_config_agent::server::routes::GatewayState;
use sheets_config_agent::sources::oauth2::OAuth2Exchange;
use sheets_config_agent::sources::sheets::SheetsSource;
use sheets_config_agent::utils::config_loader;
use sheets_config_agent::utils::logging;
use sheets_config_agent::utils::logging::LogLevel;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "sheets-config-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Create request client
    // -------------------------------

    let client = Client::builder()
        .timeout(service_config.upstream.request_timeout())
        .build()?;

    // -------------------------------
    // 3. Credential store and token exchange
    // -------------------------------

    let store = Arc::new(CredentialStore::new(&service_config.oauth.token_file));
    let exchange = Arc::new(OAuth2Exchange::new(client.clone()));

    // -------------------------------
    // 4. Configuration cache over the spreadsheet
    // -------------------------------

    let fetcher = Arc::new(SheetsSource::new(client.clone(), &service_config.upstream));
    let policy = FreshnessPolicy::from(&service_config.cache);
    info!("cache policy: {:?}", policy);
    let cache = Arc::new(ConfigCache::new(policy, store.clone(), fetcher));

    // -------------------------------
    // 5. Background credential refresher
    // -------------------------------

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresher = Arc::new(CredentialRefresher::new(
        store.clone(),
        exchange.clone(),
        service_config.oauth.clone(),
        &service_config.refresher,
    ));
    let refresher_task = tokio::spawn(refresher.run(shutdown_rx.clone()));

    // -------------------------------
    // 6. Start http server
    // -------------------------------

    let gateway_state = GatewayState::new(cache, store, exchange, service_config.oauth.clone());
    let mut server_shutdown = shutdown_rx.clone();
    let http_server = server::server::start(&service_config.settings, gateway_state, async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    });

    info!("Service starting...");
    tokio::try_join!(http_server, wait_for_signal(shutdown_tx))?;
    refresher_task.await??;

    info!("Service stopped");
    Ok(())
}

/// Resolve on SIGINT / SIGTERM and tell every task to stop.
async fn wait_for_signal(shutdown_tx: watch::Sender<bool>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT (Ctrl+C). Initiating graceful shutdown..."),
        _ = sigterm.recv() => info!("Received SIGTERM. Initiating graceful shutdown..."),
    }
    let _ = shutdown_tx.send(true);
    Ok(())
}
