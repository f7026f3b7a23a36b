#![forbid(unsafe_code)]

mod color;
mod color_picker;
mod config;
mod constants;
mod controller;
mod event_handler;
mod hotkeys;
mod overlay;
mod scheduler;
mod signals;
mod surface;
mod tray;
mod types;
mod x11_utils;

use anyhow::{Context, Result};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;
use x11rb::connection::Connection;

use color::Color;
use color_picker::ZenityPicker;
use config::ConfigStore;
use constants::{event_loop, hotkey};
use controller::{Controller, Flow};
use event_handler::handle_event;
use overlay::FleetSettings;
use surface::X11Platform;

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to the X server")?;
    let screen = &conn.setup().roots[screen_num];
    info!(
        screen = screen_num,
        width = screen.width_in_pixels,
        height = screen.height_in_pixels,
        "Connected to X11"
    );

    let platform = X11Platform::new(&conn, screen).context("Failed to prepare overlay rendering")?;

    // Every background thread reports to the main loop through this channel
    let (event_tx, event_rx) = mpsc::channel();

    // The tray is the only way to change color or exit from the desktop
    let tray = tray::spawn_tray(Color::default(), event_tx.clone())
        .context("System tray is unavailable")?;

    // Hotkey is optional, the tray can toggle too
    let _hotkey_handles = if hotkeys::check_permissions() {
        match hotkeys::spawn_listener(event_tx.clone()) {
            Ok(handles) => {
                info!(hotkey = hotkey::LABEL, "Hotkey support enabled");
                Some(handles)
            }
            Err(e) => {
                error!(error = %e, "Failed to start hotkey listener");
                hotkeys::print_permission_error();
                None
            }
        }
    } else {
        hotkeys::print_permission_error();
        None
    };

    let _signal_handle = match signals::spawn_listener(event_tx.clone()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = ?e, "Termination signals will not clean up overlays");
            None
        }
    };

    let picker = ZenityPicker::new(event_tx.clone());
    let mut controller = Controller::start(
        platform,
        ConfigStore::from_env(),
        tray,
        picker,
        FleetSettings::default(),
    );
    info!(
        generation = controller.fleet().generation(),
        windows = controller.fleet().windows().len(),
        "Overlays ready"
    );

    loop {
        while let Some(event) = conn.poll_for_event().context("Lost connection to the X server")? {
            handle_event(controller.fleet_mut(), event);
        }

        // Wake up in time for deferred click-through, but keep polling X
        let now = Instant::now();
        let timeout = controller
            .fleet()
            .next_deadline()
            .map_or(event_loop::POLL_INTERVAL, |deadline| {
                deadline.saturating_duration_since(now).min(event_loop::POLL_INTERVAL)
            });

        match event_rx.recv_timeout(timeout) {
            Ok(event) => {
                info!(event = ?event, "Received control event");
                if controller.handle(event) == Flow::Exit {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("All control channels closed, exiting");
                controller.handle(controller::ControlEvent::Exit);
                break;
            }
        }

        controller.fleet_mut().run_due(Instant::now());
    }

    drop(controller);
    conn.flush().context("Failed to flush X11 connection on exit")?;
    info!("Exited cleanly");
    Ok(())
}
