//! StatusNotifier tray icon
//!
//! The tray runs on its own thread with a single-threaded tokio runtime.
//! Menu clicks are forwarded to the main thread as [`ControlEvent`]s and the
//! icon color is updated through an unbounded channel.

use anyhow::{anyhow, Context, Result};
use ksni::menu::StandardItem;
use ksni::{MenuItem, ToolTip, TrayMethods};
use std::sync::mpsc::Sender;
use std::thread;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::color::Color;
use crate::constants::{hotkey, tray};
use crate::controller::{ControlEvent, TrayControl};

struct BorderTray {
    color: Color,
    events: Sender<ControlEvent>,
}

impl BorderTray {
    fn send(&self, event: ControlEvent) {
        if let Err(e) = self.events.send(event) {
            warn!(event = ?e.0, "Main loop is gone, dropping tray request");
        }
    }
}

impl ksni::Tray for BorderTray {
    fn id(&self) -> String {
        tray::ID.into()
    }

    fn title(&self) -> String {
        tray::TITLE.into()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![ksni::Icon {
            width: tray::ICON_SIZE,
            height: tray::ICON_SIZE,
            data: icon_argb(self.color, tray::ICON_SIZE),
        }]
    }

    fn tool_tip(&self) -> ToolTip {
        ToolTip {
            title: tray::TITLE.into(),
            description: format!("Border color {}", self.color),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        vec![
            StandardItem {
                label: format!("Toggle ({})", hotkey::LABEL),
                activate: Box::new(|tray: &mut Self| tray.send(ControlEvent::ToggleVisibility)),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Change Color".into(),
                activate: Box::new(|tray: &mut Self| tray.send(ControlEvent::ChangeColor)),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Exit".into(),
                activate: Box::new(|tray: &mut Self| tray.send(ControlEvent::Exit)),
                ..Default::default()
            }
            .into(),
        ]
    }
}

/// A filled rounded square in `color` on a transparent background,
/// as ARGB32 in network byte order.
pub fn icon_argb(color: Color, size: i32) -> Vec<u8> {
    let size = size.max(0);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            if in_rounded_square(x, y, size) {
                data.extend_from_slice(&[0xFF, color.red, color.green, color.blue]);
            } else {
                data.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    data
}

fn in_rounded_square(x: i32, y: i32, size: i32) -> bool {
    let low = tray::ICON_MARGIN;
    let high = size - 1 - tray::ICON_MARGIN;
    if x < low || x > high || y < low || y > high {
        return false;
    }

    let radius = tray::ICON_RADIUS.min((high - low) / 2);
    let cx = x.clamp(low + radius, high - radius);
    let cy = y.clamp(low + radius, high - radius);
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy <= radius * radius
}

/// Keeps the tray thread fed with color updates
pub struct TrayHandle {
    colors: UnboundedSender<Color>,
}

impl TrayControl for TrayHandle {
    fn show_color(&mut self, color: Color) {
        if self.colors.send(color).is_err() {
            error!(%color, "Tray thread has stopped, icon not updated");
        }
    }
}

/// Register the tray icon. Fails if no StatusNotifier host answers in time.
pub fn spawn_tray(color: Color, events: Sender<ControlEvent>) -> Result<TrayHandle> {
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();
    let (colors, mut updates) = unbounded_channel::<Color>();

    thread::Builder::new()
        .name("tray".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow!(e).context("Failed to start tray runtime")));
                    return;
                }
            };

            runtime.block_on(async move {
                let handle = match (BorderTray { color, events }).spawn().await {
                    Ok(handle) => {
                        let _ = ready_tx.send(Ok(()));
                        handle
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(anyhow!(e).context("Failed to register tray icon")));
                        return;
                    }
                };

                while let Some(color) = updates.recv().await {
                    debug!(%color, "Updating tray icon");
                    handle.update(|tray: &mut BorderTray| tray.color = color).await;
                }

                handle.shutdown().await;
                debug!("Tray thread finished");
            });
        })
        .context("Failed to spawn tray thread")?;

    ready_rx
        .recv_timeout(tray::STARTUP_TIMEOUT)
        .context("System tray did not come up in time")??;

    info!("System tray ready");
    Ok(TrayHandle { colors })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(data: &[u8], size: i32, x: i32, y: i32) -> [u8; 4] {
        let offset = ((y * size + x) * 4) as usize;
        [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
    }

    #[test]
    fn test_icon_size() {
        let data = icon_argb(Color::default(), tray::ICON_SIZE);
        assert_eq!(data.len(), (tray::ICON_SIZE * tray::ICON_SIZE * 4) as usize);
    }

    #[test]
    fn test_icon_center_is_color() {
        let color = Color::new(255, 10, 20);
        let size = tray::ICON_SIZE;
        let data = icon_argb(color, size);
        assert_eq!(pixel(&data, size, size / 2, size / 2), [0xFF, 255, 10, 20]);
        // Straight edges are filled up to the margin
        assert_eq!(pixel(&data, size, tray::ICON_MARGIN, size / 2), [0xFF, 255, 10, 20]);
    }

    #[test]
    fn test_icon_corners_and_margin_transparent() {
        let size = tray::ICON_SIZE;
        let data = icon_argb(Color::new(1, 2, 3), size);
        assert_eq!(pixel(&data, size, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&data, size, size - 1, size - 1), [0, 0, 0, 0]);
        // Rounded away even inside the margin
        assert_eq!(pixel(&data, size, tray::ICON_MARGIN, tray::ICON_MARGIN), [0, 0, 0, 0]);
        assert_eq!(pixel(&data, size, 0, size / 2), [0, 0, 0, 0]);
    }
}
