use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
mod cli;
mod probe;
use keyrelay_core::Core;
use keyrelay_provider_core::{ConfigSource, CredentialResolver, EnvSource};
use keyrelay_provider_impl::{AistudioClient, BadRequestPolicy, RotatingProvider};
use tracing::{info, warn};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    // A missing .env is normal in deployments that inject variables directly.
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    if let Err(err) = run().await {
        eprintln!("keyrelay failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let resolver = CredentialResolver::new(
        cli.upstream.pool_names(),
        cli.upstream.key_order.strategy(),
    );
    let client = Arc::new(AistudioClient::new(
        cli.upstream.base_url.as_deref(),
        cli.upstream.proxy.as_deref(),
    )?);

    if let Some(Command::Probe(args)) = &cli.command {
        return probe::run(&resolver, client.as_ref(), args).await;
    }

    match resolver.resolve(&EnvSource.snapshot()) {
        Ok(pool) => info!(credentials = pool.len(), "pool ready"),
        Err(err) => warn!(error = %err, "no credentials configured; relay requests will fail"),
    }
    let key_order = resolver.order_name();
    let base_url = client.base_url().to_string();

    let provider = RotatingProvider::new(resolver, Arc::new(EnvSource), client)
        .with_policy(BadRequestPolicy::from(cli.bad_request_policy))
        .with_default_model(cli.default_model.clone());
    info!(
        host = %cli.host,
        port = cli.port,
        base_url = %base_url,
        proxy = %cli.upstream.proxy.as_deref().unwrap_or(""),
        key_order = key_order,
        bad_request_policy = ?provider.policy(),
        default_model = %cli.default_model,
        request_timeout_secs = ?cli.request_timeout_secs,
        "config loaded"
    );
    let core = Core::new(Arc::new(provider))
        .with_body_limit(cli.body_limit_bytes)
        .with_timeout(cli.request_timeout_secs.map(Duration::from_secs));
    let app = core.router();

    let bind = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "keyrelay=info,keyrelay_core=info,keyrelay_provider_impl=info,tower_http=info",
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
