//! The reveil alarm clock daemon.
//!
//! Loads the configuration, wires the hardware (real or mock), starts
//! the alarm evaluation loop, and serves the REST API until SIGINT or
//! SIGTERM.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use reveil_clock::api::server::{serve, SharedState};
use reveil_clock::config::ClockConfig;
use reveil_clock::engine::{AlarmMonitor, Engine};
use reveil_clock::hw::{
    Clock, ConsoleDisplay, Display, MockDisplay, MockPlayer, Player, ProcessPlayer, SystemClock,
};
use reveil_clock::store::{AlarmStore, JsonFiles};

#[tokio::main]
async fn main() -> Result<()> {
    reveil_clock::tracing::init();

    let config_path: PathBuf = env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".into())
        .into();
    let config = ClockConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let store = AlarmStore::open(Box::new(JsonFiles::new(&config.data_dir)))
        .with_context(|| format!("opening alarm store in {}", config.data_dir.display()))?;
    info!(
        alarms = store.alarms().count(),
        data_dir = %config.data_dir.display(),
        "Alarm store loaded"
    );

    let (clock, player, display) = build_hardware(&config);
    display.set_brightness(config.display_brightness);
    if let Err(err) = player.set_volume(config.volume).await {
        warn!(%err, "Failed to set startup volume");
    }

    let engine = Arc::new(Mutex::new(Engine::new(store, &config)));
    let cancellation = CancellationToken::new();

    let monitor = AlarmMonitor::new(
        engine.clone(),
        clock.clone(),
        player.clone(),
        display.clone(),
        config.check_interval(),
    );
    let monitor_task = tokio::spawn(monitor.run(cancellation.clone()));

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;

    let state = SharedState {
        engine,
        clock,
        player,
        display,
        config: Arc::new(Mutex::new(config)),
        config_path: Arc::new(config_path),
    };

    tokio::spawn(shutdown_signal(cancellation.clone()));
    serve(listener, state, cancellation).await?;

    monitor_task.await?;
    info!("Shutdown complete");
    Ok(())
}

/// The clock is always the system clock; mock mode swaps out the
/// player and display so the daemon runs on a machine with neither
/// audio nor a panel.
fn build_hardware(config: &ClockConfig) -> (Arc<dyn Clock>, Arc<dyn Player>, Arc<dyn Display>) {
    let clock = Arc::new(SystemClock);
    if config.mock_hardware {
        info!("Using mock hardware");
        (
            clock,
            Arc::new(MockPlayer::default()),
            Arc::new(MockDisplay::default()),
        )
    } else {
        (
            clock,
            Arc::new(ProcessPlayer::new(&config.sounds_dir)),
            Arc::new(ConsoleDisplay),
        )
    }
}

/// Cancel the token on SIGINT or SIGTERM.
async fn shutdown_signal(cancellation: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(err) => {
                warn!(%err, "Failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                cancellation.cancel();
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    info!("Shutdown signal received");
    cancellation.cancel();
}
