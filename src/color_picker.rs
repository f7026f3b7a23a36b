use anyhow::{bail, Context, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::color::Color;
use crate::constants::picker;
use crate::controller::{ColorPicker, ControlEvent};

/// Runs `zenity --color-selection` and waits for it on a background thread.
///
/// The running dialog is kept here so it can be dismissed on exit instead of
/// outliving the process.
pub struct ZenityPicker {
    events: Sender<ControlEvent>,
    command: fn(Color) -> Command,
    running: Arc<Mutex<Option<Child>>>,
}

fn zenity_command(initial: Color) -> Command {
    let mut command = Command::new(picker::PROGRAM);
    command
        .arg("--color-selection")
        .arg(format!("--color={initial}"))
        .arg(format!("--title={}", picker::TITLE));
    command
}

fn lock(running: &Mutex<Option<Child>>) -> MutexGuard<'_, Option<Child>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ZenityPicker {
    pub fn new(events: Sender<ControlEvent>) -> Self {
        Self::with_command(events, zenity_command)
    }

    fn with_command(events: Sender<ControlEvent>, command: fn(Color) -> Command) -> Self {
        Self {
            events,
            command,
            running: Arc::new(Mutex::new(None)),
        }
    }

    fn send(&self, picked: Option<Color>) {
        if self.events.send(ControlEvent::ColorPicked(picked)).is_err() {
            debug!("Main loop is gone, dropping picked color");
        }
    }
}

impl ColorPicker for ZenityPicker {
    fn request(&mut self, initial: Color) {
        info!(%initial, program = picker::PROGRAM, "Opening color picker");
        let mut command = (self.command)(initial);
        let mut child = match command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .context(format!("Failed to run {}", picker::PROGRAM))
        {
            Ok(child) => child,
            Err(e) => {
                warn!(error = ?e, "Color picker failed, treating as cancelled");
                self.send(None);
                return;
            }
        };

        let stdout = child.stdout.take();
        *lock(&self.running) = Some(child);

        let events = self.events.clone();
        let running = Arc::clone(&self.running);
        let spawned = thread::Builder::new()
            .name("color-picker".into())
            .spawn(move || {
                let mut text = String::new();
                if let Some(mut stdout) = stdout
                    && let Err(e) = stdout.read_to_string(&mut text)
                {
                    warn!(error = %e, "Failed to read color picker output");
                }

                // Gone means the picker was dismissed through close()
                let Some(mut child) = lock(&running).take() else {
                    debug!("Color picker was closed");
                    return;
                };
                let picked = match child.wait() {
                    Ok(status) => interpret(status, &text),
                    Err(e) => {
                        warn!(error = %e, "Failed to wait for color picker");
                        None
                    }
                };
                if events.send(ControlEvent::ColorPicked(picked)).is_err() {
                    debug!("Main loop is gone, dropping picked color");
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn color picker thread");
            self.close();
            // Release the controller's open-picker state
            self.send(None);
        }
    }

    fn close(&mut self) {
        let Some(mut child) = lock(&self.running).take() else {
            return;
        };
        info!(pid = child.id(), "Closing color picker");
        if let Err(e) = child.kill() {
            warn!(error = %e, "Failed to kill color picker");
        }
        if let Err(e) = child.wait() {
            warn!(error = %e, "Failed to reap color picker");
        }
    }
}

impl Drop for ZenityPicker {
    fn drop(&mut self) {
        self.close();
    }
}

/// Turn the dialog's exit status and output into a choice; `None` means cancelled
fn interpret(status: ExitStatus, output: &str) -> Option<Color> {
    if !status.success() {
        debug!(%status, "Color picker closed without a selection");
        return None;
    }
    match parse_picker_output(output) {
        Ok(color) => {
            info!(%color, "Color picked");
            Some(color)
        }
        Err(e) => {
            warn!(output = output.trim(), error = ?e, "Unrecognized color picker output, treating as cancelled");
            None
        }
    }
}

/// Parse `rgb(r,g,b)`, `rgba(r,g,b,a)` or `#rrggbb`
pub fn parse_picker_output(text: &str) -> Result<Color> {
    let text = text.trim();

    if let Some(hex) = text.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            bail!("expected six hex digits");
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).context("invalid hex digit")
        };
        return Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }

    let inner = text
        .strip_prefix("rgba(")
        .or_else(|| text.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
        .context("expected rgb(...), rgba(...) or #rrggbb")?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        bail!("expected 3 or 4 components, got {}", parts.len());
    }
    let channel = |part: &str| -> Result<u8> {
        part.parse::<u8>()
            .context(format!("color component {part:?} is not in 0-255"))
    };
    // Alpha is ignored; the overlay uses its own
    Ok(Color::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::time::Duration;

    fn answer_red(_: Color) -> Command {
        let mut command = Command::new("echo");
        command.arg("rgb(255,0,0)");
        command
    }

    fn refuse(_: Color) -> Command {
        Command::new("false")
    }

    fn never_answer(_: Color) -> Command {
        let mut command = Command::new("sleep");
        command.arg("30");
        command
    }

    fn missing(_: Color) -> Command {
        Command::new("screen-border-no-such-picker")
    }

    #[test]
    fn test_picked_color_is_reported() {
        let (tx, rx) = mpsc::channel();
        let mut picker = ZenityPicker::with_command(tx, answer_red);
        picker.request(Color::default());
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            ControlEvent::ColorPicked(Some(Color::new(255, 0, 0)))
        );
    }

    #[test]
    fn test_failed_dialog_is_a_cancel() {
        let (tx, rx) = mpsc::channel();
        let mut picker = ZenityPicker::with_command(tx, refuse);
        picker.request(Color::default());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), ControlEvent::ColorPicked(None));

        let (tx, rx) = mpsc::channel();
        let mut picker = ZenityPicker::with_command(tx, missing);
        picker.request(Color::default());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), ControlEvent::ColorPicked(None));
    }

    #[test]
    fn test_close_kills_open_dialog() {
        let (tx, rx) = mpsc::channel();
        let mut picker = ZenityPicker::with_command(tx, never_answer);
        picker.request(Color::default());
        assert!(lock(&picker.running).is_some());

        picker.close();
        assert!(lock(&picker.running).is_none());
        assert_eq!(rx.recv_timeout(Duration::from_millis(500)), Err(RecvTimeoutError::Timeout));
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_picker_output("rgb(255,0,0)\n").unwrap(), Color::new(255, 0, 0));
        assert_eq!(parse_picker_output("rgb(1, 2, 3)").unwrap(), Color::new(1, 2, 3));
    }

    #[test]
    fn test_parse_rgba_ignores_alpha() {
        assert_eq!(
            parse_picker_output("rgba(10,20,30,0.5)").unwrap(),
            Color::new(10, 20, 30)
        );
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_picker_output("#00ff7f").unwrap(), Color::new(0, 255, 127));
        assert_eq!(parse_picker_output("#FFAA00\n").unwrap(), Color::new(255, 170, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_picker_output("").is_err());
        assert!(parse_picker_output("red").is_err());
        assert!(parse_picker_output("rgb(256,0,0)").is_err());
        assert!(parse_picker_output("rgb(1,2)").is_err());
        assert!(parse_picker_output("rgb(1,2,3").is_err());
        assert!(parse_picker_output("#12345").is_err());
        assert!(parse_picker_output("#gg0000").is_err());
    }
}
