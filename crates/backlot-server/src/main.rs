#![forbid(unsafe_code)]

use backlot_funnel::{Funnel, FunnelConfig};
use backlot_server::{build_router, AppState};
use backlot_store::LeadStore;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = FunnelConfig::from_env();
    let store = match config.build_store() {
        Ok(store) => Arc::new(store) as Arc<dyn LeadStore>,
        Err(err) => {
            error!(error = %err, "store configuration is unusable");
            std::process::exit(1);
        }
    };
    let funnel = Arc::new(Funnel::new(config, store));
    let app = build_router(AppState::new(funnel));

    let addr = env_str("BACKLOT_ADDR", "127.0.0.1:8787");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %addr, error = %err, "bind failed");
            std::process::exit(1);
        }
    };
    info!(addr = %addr, "backlot server listening");
    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "server terminated");
        std::process::exit(1);
    }
}
