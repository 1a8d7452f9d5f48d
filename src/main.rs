mod command;
mod config;
mod daemon;
mod gpio;

use crate::config::{Backend, Config, LogTarget};
use crate::daemon::Daemon;
use anyhow::{Context, Result};
use log::{error, info};
use psx_link::embedded_hal::delay::DelayNs;
use psx_link::sim::VirtualDelay;
use psx_link::LinePort;
use std::fmt::Debug;
use std::fs;
use tokio::signal::unix::{signal, SignalKind};

const APP_NAME: &str = "psx-pad-daemon";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/psx-pad-daemon/config.yaml".to_string());

    let config = load_config(&config_path)?;

    // Initialize logging
    init_logger(config.logging.target)?;

    info!("PSX Pad Daemon starting...");
    info!("Configuration loaded from: {}", config_path);

    match config.gpio.backend {
        Backend::Cdev => {
            let lines = gpio::open_cdev(&config.gpio)?;
            let daemon = Daemon::new(config, lines, linux_embedded_hal::Delay)?;
            run(daemon, &config_path).await?;
        }
        Backend::Rppal => {
            let lines = gpio::open_rppal(&config.gpio)?;
            let daemon = Daemon::new(config, lines, linux_embedded_hal::Delay)?;
            run(daemon, &config_path).await?;
        }
        Backend::Simulated => {
            info!("Using simulated pads, no GPIO will be touched");
            let lines = gpio::open_simulated(&config.gpio);
            let daemon = Daemon::new(config, lines, VirtualDelay::new())?;
            run(daemon, &config_path).await?;
        }
    }

    info!("PSX Pad Daemon shutdown complete");
    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    let config_content = fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path))?;
    let config: Config = serde_yaml::from_str(&config_content)
        .context("Failed to parse configuration file")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run<L, D>(mut daemon: Daemon<L, D>, config_path: &str) -> Result<()>
where
    L: LinePort,
    L::Error: Debug + Send + Sync + 'static,
    D: DelayNs,
{
    // Setup signal handling via tokio
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to setup SIGHUP handler")?;

    info!("Daemon started successfully");

    loop {
        tokio::select! {
            result = daemon.poll() => {
                if let Err(e) = result {
                    error!("Daemon poll error: {:#}", e);
                    return Err(e);
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
                break;
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading configuration");
                match load_config(config_path) {
                    Ok(new_config) => daemon.reload_config(new_config)?,
                    Err(e) => error!("Keeping current configuration: {:#}", e),
                }
            }
        }
    }

    Ok(())
}

fn init_logger(target: LogTarget) -> Result<()> {
    match target {
        LogTarget::Stderr => {
            // Use `env_logger` for logging. Systemd/journald will capture stdout/stderr.
            if std::env::var("RUST_LOG").is_err() {
                std::env::set_var("RUST_LOG", "info");
            }
            env_logger::init();
        }
        LogTarget::Syslog => {
            let level = std::env::var("RUST_LOG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(log::LevelFilter::Info);
            syslog::init(syslog::Facility::LOG_DAEMON, level, Some(APP_NAME))
                .map_err(|e| anyhow::anyhow!("Failed to connect to syslog: {}", e))?;
        }
    }
    Ok(())
}
