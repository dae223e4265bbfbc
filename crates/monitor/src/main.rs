//! `camwatch-monitor` — camera fleet alert daemon.
//!
//! Connects to every configured camera, watches their motion/event
//! channels, and relays debounced alerts as an email with a snapshot
//! attachment plus an advisory HTTP callback. Runs until externally
//! terminated.
//!
//! # Environment variables
//!
//! | Variable          | Required | Default        | Description             |
//! |-------------------|----------|----------------|-------------------------|
//! | `CAMWATCH_CONFIG` | no       | `config.json`  | Path to the config file |
//! | `RUST_LOG`        | no       | crate defaults | Tracing filter          |

use std::sync::Arc;

use camwatch_camera::HikClient;
use camwatch_core::Config;
use camwatch_monitor::fleet::Fleet;
use camwatch_notify::{CallbackDelivery, Dispatcher, EmailDelivery};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "camwatch_monitor=info,camwatch_camera=info,camwatch_notify=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("CAMWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    // Configuration errors are fatal before any monitor is created.
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %config_path, error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        cameras = config.cameras.len(),
        recipients = config.smtp.recipients.len(),
        "Starting camwatch-monitor"
    );

    let notifier = Arc::new(Dispatcher::new(
        EmailDelivery::new(config.smtp.clone()),
        CallbackDelivery::new(),
    ));

    let mut fleet = Fleet::new();

    for camera in &config.cameras {
        match HikClient::connect(camera).await {
            Ok(source) => {
                let callback_url = config.callback_url(camera);
                fleet.watch(source, notifier.clone(), callback_url);
            }
            Err(e) => {
                tracing::error!(
                    camera = %camera.name,
                    error = %e,
                    "Camera connection failed; skipping"
                );
            }
        }
    }

    if fleet.camera_count() == 0 {
        tracing::error!("No cameras connected");
        std::process::exit(1);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");

    fleet.shutdown().await;
}
