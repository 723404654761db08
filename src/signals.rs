use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use crate::config::load_config;
use crate::handlers::{AppState, Services};

/// Shutdown signal types
#[derive(Debug, Clone, Copy)]
pub enum ShutdownSignal {
    /// Graceful shutdown (drain connections, clean up)
    Graceful,
}

/// Setup signal handlers for the server
///
/// Returns a broadcast sender for shutdown signals and a join handle for the signal task
///
/// Handles:
/// - SIGTERM/SIGINT: Graceful shutdown
/// - SIGHUP: Configuration reload
#[cfg(unix)]
pub fn setup_signal_handlers(
    state: AppState,
    config_path: PathBuf,
    http_client: reqwest::Client,
) -> (
    broadcast::Sender<ShutdownSignal>,
    tokio::task::JoinHandle<()>,
) {
    let (shutdown_tx, _) = broadcast::channel(16);
    let tx_clone = shutdown_tx.clone();

    let handle = tokio::spawn(async move {
        let (mut sigterm, mut sigint, mut sighup) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::hangup()),
        ) {
            (Ok(term), Ok(int), Ok(hup)) => (term, int, hup),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C only");
                wait_for_ctrl_c(tx_clone).await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("SIGTERM received, initiating graceful shutdown");
                    let _ = tx_clone.send(ShutdownSignal::Graceful);
                    break;
                }
                _ = sigint.recv() => {
                    info!("SIGINT received, initiating graceful shutdown");
                    let _ = tx_clone.send(ShutdownSignal::Graceful);
                    break;
                }
                _ = sighup.recv() => {
                    info!("SIGHUP received, reloading configuration");
                    if let Err(e) = reload_config(&state, &config_path, &http_client).await {
                        error!("Failed to reload configuration: {}", e);
                    } else {
                        info!("Configuration reloaded successfully");
                    }
                }
            }
        }
    });

    (shutdown_tx, handle)
}

/// Non-unix platforms: only Ctrl+C is supported, no reload
#[cfg(not(unix))]
pub fn setup_signal_handlers(
    _state: AppState,
    _config_path: PathBuf,
    _http_client: reqwest::Client,
) -> (
    broadcast::Sender<ShutdownSignal>,
    tokio::task::JoinHandle<()>,
) {
    let (shutdown_tx, _) = broadcast::channel(16);
    let handle = tokio::spawn(wait_for_ctrl_c(shutdown_tx.clone()));

    (shutdown_tx, handle)
}

async fn wait_for_ctrl_c(tx: broadcast::Sender<ShutdownSignal>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl+C received, initiating shutdown");
            let _ = tx.send(ShutdownSignal::Graceful);
        }
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    }
}

/// Reload configuration and rebuild the services derived from it
///
/// The new configuration is loaded and validated first; if that fails the
/// running configuration stays in place. On success the cached tables are
/// dropped so the next request reads the spreadsheet again.
pub async fn reload_config(
    state: &AppState,
    config_path: &Path,
    http_client: &reqwest::Client,
) -> Result<()> {
    info!(path = %config_path.display(), "Loading new configuration...");

    let new_config = load_config(config_path)?;

    info!(
        spreadsheet = %new_config.sheets.spreadsheet_id,
        cache_ttl_secs = new_config.sheets.cache_ttl_seconds,
        assistant_enabled = new_config.assistant.enabled,
        "New configuration loaded"
    );

    let services = Services::from_config(&new_config, http_client.clone());

    // Requests still holding the old services must not keep serving old tables
    state.services.load_full().tables.invalidate().await;

    state.config.store(Arc::new(new_config));
    state.services.store(Arc::new(services));

    info!("Configuration and services swapped atomically");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;
    use std::io::Write;

    #[tokio::test]
    async fn test_setup_signal_handlers() {
        let (shutdown_tx, _handle) = setup_signal_handlers(
            test_state(None),
            PathBuf::from("config.toml"),
            reqwest::Client::new(),
        );

        let mut rx = shutdown_tx.subscribe();
        shutdown_tx.send(ShutdownSignal::Graceful).unwrap();

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, ShutdownSignal::Graceful));
    }

    #[tokio::test]
    async fn test_reload_config_swaps_config() {
        let state = test_state(None);
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[sheets]
spreadsheet_id = "reloaded-sheet"
cache_ttl_seconds = 30

[assistant]
enabled = false
"#
        )
        .unwrap();

        reload_config(&state, file.path(), &reqwest::Client::new())
            .await
            .unwrap();

        let config = state.config.load();
        assert_eq!(config.sheets.spreadsheet_id, "reloaded-sheet");
        assert_eq!(config.sheets.cache_ttl_seconds, 30);
        assert!(state.services.load().assistant.is_none());
    }

    #[tokio::test]
    async fn test_reload_invalid_config_keeps_running_config() {
        let state = test_state(None);
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sheets]\nspreadsheet_id = \"\"\n").unwrap();

        assert!(reload_config(&state, file.path(), &reqwest::Client::new())
            .await
            .is_err());
        assert_eq!(state.config.load().sheets.spreadsheet_id, "sheet-123");
    }
}
