//! ctrlsurf - MIDI control surface runtime
//!
//! Connects to a controller, identifies it and logs its control events.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctrlsurf::config::AppConfig;
use ctrlsurf::control::{snap, ControlKind};
use ctrlsurf::host::{self, MidiHost};
use ctrlsurf::{DetectionState, Device, DeviceRegistry, DeviceShadow, RawEvent, Session};

const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// ctrlsurf - Identify a MIDI controller and resolve its controls
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// List supported devices and their controls
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    if args.list_ports {
        return host::print_ports();
    }

    let registry = Arc::new(DeviceRegistry::with_builtin());

    if args.list_devices {
        return print_devices(&registry);
    }

    info!("Starting ctrlsurf...");
    info!("Configuration file: {}", args.config);
    let config = AppConfig::load(&args.config).await?;
    info!("Configuration loaded successfully");

    run_app(registry, config, shutdown_signal()).await?;

    info!("ctrlsurf shutdown complete");
    Ok(())
}

async fn run_app(
    registry: Arc<DeviceRegistry>,
    config: AppConfig,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel::<RawEvent>(1000);
    let midi_host = MidiHost::connect(&config.midi, event_tx)?;

    let mut session = Session::new(registry, config.bootstrap.clone(), midi_host);
    session.initialise(Instant::now());

    let mut shadow: Option<DeviceShadow> = None;
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(mut event) = event_rx.recv() => {
                debug!("Received: {}", event);
                if let Some(control_event) = session.process_event(&mut event) {
                    if let Some(shadow) = shadow.as_mut() {
                        shadow.process(&control_event);
                    }
                }
            }

            _ = ticker.tick() => {
                session.tick(Instant::now());
                if let Some(shadow) = shadow.as_mut() {
                    shadow.apply(false);
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }

        match session.state() {
            DetectionState::Bound(device) if shadow.is_none() => {
                info!("Controls ready for {}", device.id());
                let mut device_shadow = DeviceShadow::new(device);
                bind_logging(&mut device_shadow, config.plugins.do_snap);
                device_shadow.apply(true);
                shadow = Some(device_shadow);
            }
            DetectionState::Unrecognized => {
                anyhow::bail!(
                    "Device '{}' was not recognised, add a name association to the config",
                    config.midi.input_port
                );
            }
            _ => {}
        }
    }

    Ok(())
}

/// Log every control event, snapping wheels back to centre
fn bind_logging(shadow: &mut DeviceShadow, do_snap: bool) {
    shadow.bind(
        |c| c.kind() == ControlKind::PitchWheel,
        move |s, e| {
            let value = snap(e.value, 0.5, do_snap);
            if let Err(err) = s.set_value(value) {
                warn!("{}", err);
            }
            info!("{} = {:.3}", e.control, value);
            true
        },
    );
    shadow.bind(
        |c| c.kind() != ControlKind::Null,
        |_, e| {
            // Ignore button lifts
            if e.control.kind().is_button() && e.value == 0.0 {
                return true;
            }
            info!("{} = {:.3}", e.control, e.value);
            true
        },
    );
}

fn print_devices(registry: &DeviceRegistry) -> Result<()> {
    use colored::*;

    println!("\n{}", "=== Supported Devices ===".bold().cyan());
    for descriptor in registry.devices() {
        let device: Device = descriptor.create()?;
        println!("\n{}", descriptor.id().bold());
        for group in device.groups() {
            let controls = device.controls(Some(group.as_str()));
            println!(
                "  {} {}",
                group.yellow(),
                format!("({} controls)", controls.len()).dimmed()
            );
        }
    }
    println!();
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
