use clap::Parser;
use ledger_node::{api, config::Config, context::NodeContext, resolve_periodically};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::parse();
    let state = Arc::new(NodeContext::from_config(&config)?);

    if let Some(every) = config.resolve_interval() {
        info!(every_secs = every.as_secs(), "background consensus enabled");
        tokio::spawn(resolve_periodically(state.clone(), every));
    }

    let app = api::router(state);
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ledger-node listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
