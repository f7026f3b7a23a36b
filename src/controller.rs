use tracing::{debug, error, info, warn};

use crate::color::Color;
use crate::config::ConfigStore;
use crate::overlay::{FleetSettings, FleetState, OverlayFleet, Platform};

/// Requests delivered to the main thread from hotkey, tray, picker and signal threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ToggleVisibility,
    ChangeColor,
    /// Result of a color picker session; `None` means cancelled
    ColorPicked(Option<Color>),
    Exit,
}

/// Whether the main loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Reflects the current color in the tray icon
pub trait TrayControl {
    fn show_color(&mut self, color: Color);
}

/// Opens a color picker without blocking; the answer comes back as
/// [`ControlEvent::ColorPicked`]
pub trait ColorPicker {
    fn request(&mut self, initial: Color);

    /// Dismiss an open picker, if any, without reporting a result
    fn close(&mut self);
}

pub struct Controller<P: Platform, T: TrayControl, K: ColorPicker> {
    fleet: OverlayFleet<P>,
    store: ConfigStore,
    tray: T,
    picker: K,
    picking: bool,
}

impl<P: Platform, T: TrayControl, K: ColorPicker> Controller<P, T, K> {
    /// Load the saved color, show the overlays and paint the tray icon
    pub fn start(platform: P, store: ConfigStore, mut tray: T, picker: K, settings: FleetSettings) -> Self {
        let color = store.load();
        info!(%color, config = %store.path().display(), "Starting with saved color");
        let fleet = OverlayFleet::build(platform, color, settings);
        tray.show_color(color);
        Self {
            fleet,
            store,
            tray,
            picker,
            picking: false,
        }
    }

    pub fn fleet(&self) -> &OverlayFleet<P> {
        &self.fleet
    }

    pub fn fleet_mut(&mut self) -> &mut OverlayFleet<P> {
        &mut self.fleet
    }

    pub fn handle(&mut self, event: ControlEvent) -> Flow {
        if self.fleet.state() == FleetState::Destroyed {
            debug!(event = ?event, "Ignoring event after exit");
            return Flow::Exit;
        }

        match event {
            ControlEvent::ToggleVisibility => {
                self.fleet.toggle_visibility();
            }
            ControlEvent::ChangeColor => {
                if self.picking {
                    debug!("Color picker already open");
                } else {
                    self.picking = true;
                    self.picker.request(self.fleet.color());
                }
            }
            ControlEvent::ColorPicked(picked) => {
                self.picking = false;
                match picked {
                    Some(color) => self.apply_color(color),
                    None => info!("Color selection cancelled"),
                }
            }
            ControlEvent::Exit => {
                info!("Exit requested");
                self.picker.close();
                self.picking = false;
                self.fleet.shutdown();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    fn apply_color(&mut self, color: Color) {
        if let Err(e) = self.fleet.set_color(color) {
            error!(%color, error = ?e, "Failed to recolor overlays, keeping previous color");
            return;
        }
        if let Err(e) = self.store.save(color) {
            warn!(%color, error = ?e, "Failed to save color");
        }
        self.tray.show_color(color);
        info!(%color, "Border color changed");
    }
}
