use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use config::AuthConfig;
use directory::HttpDirectory;
use key_manager::KeyManager;
use state::AppState;

mod api;
mod config;
mod directory;
mod error;
mod key_manager;
mod oauth2;
mod state;
#[cfg(test)]
mod testutil;
mod token;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logger - reads RUST_LOG environment variable.
    // Defaults to info level if RUST_LOG is not set.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let config = AuthConfig::from_env()?;

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.workers {
        runtime.worker_threads(workers);
    }
    runtime.enable_all().build()?.block_on(serve(config))
}

async fn serve(config: AuthConfig) -> Result<(), Box<dyn std::error::Error>> {
    let keys = Arc::new(KeyManager::load(
        config.ssl_key.clone(),
        config.ssl_cert.clone(),
    )?);
    let directory = HttpDirectory::new(
        &config.directory_url,
        Duration::from_secs(config.directory_timeout_secs),
    )?;
    let port = config.port;
    let app_state = AppState::new(config, Arc::new(directory), Arc::clone(&keys));

    // Re-read the signing key material on SIGHUP without a restart.
    #[cfg(unix)]
    {
        let keys = Arc::clone(&keys);
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            let Ok(mut hangup) = signal(SignalKind::hangup()) else {
                return;
            };
            while hangup.recv().await.is_some() {
                match keys.reload() {
                    Ok(()) => log::info!("Reloaded signing key material"),
                    Err(err) => log::error!("Failed to reload key material: {err}"),
                }
            }
        });
    }

    let app = api::router().with_state(app_state);

    let ip_addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&ip_addr).await?;

    log::info!("Starting server on {ip_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
