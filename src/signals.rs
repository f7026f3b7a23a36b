use anyhow::{Context, Result};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, info};

use crate::controller::ControlEvent;

/// Turn termination signals into [`ControlEvent::Exit`] so the overlays are torn down
pub fn spawn_listener(sender: Sender<ControlEvent>) -> Result<thread::JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .context("Failed to register signal handlers")?;

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                info!(signal, "Received termination signal");
                if sender.send(ControlEvent::Exit).is_err() {
                    debug!("Main loop is gone");
                    break;
                }
            }
        })
        .context("Failed to spawn signal listener thread")
}
