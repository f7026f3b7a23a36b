use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::{OverlayWindow, Platform};
use crate::color::Color;
use crate::constants::overlay;
use crate::scheduler::DeferredQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetSettings {
    pub border_width: u16,
    pub click_through_delay: Duration,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            border_width: overlay::BORDER_WIDTH,
            click_through_delay: overlay::CLICK_THROUGH_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetState {
    Built,
    Destroyed,
}

/// Deferred click-through for one window of one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClickThroughTask {
    generation: u64,
    window: u32,
}

/// One overlay window per display, all sharing one color and one visibility flag.
///
/// A color change never recolors windows in place: a whole new generation is
/// built, swapped in, and only then is the old generation destroyed.
pub struct OverlayFleet<P: Platform> {
    platform: P,
    windows: Vec<OverlayWindow<P::Surface>>,
    color: Color,
    visible: bool,
    generation: u64,
    state: FleetState,
    settings: FleetSettings,
    pending: DeferredQueue<ClickThroughTask>,
}

impl<P: Platform> OverlayFleet<P> {
    /// Build the first generation, visible, in `color`.
    ///
    /// A failed display enumeration leaves the fleet built but empty; the
    /// next color change tries again.
    pub fn build(platform: P, color: Color, settings: FleetSettings) -> Self {
        let mut fleet = Self {
            platform,
            windows: Vec::new(),
            color,
            visible: true,
            generation: 0,
            state: FleetState::Built,
            settings,
            pending: DeferredQueue::new(),
        };
        if let Err(e) = fleet.recreate(color) {
            error!(error = ?e, "Failed to build overlay windows");
        }
        fleet
    }

    pub fn windows(&self) -> &[OverlayWindow<P::Surface>] {
        &self.windows
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> FleetState {
        self.state
    }

    fn is_destroyed(&self, operation: &str) -> bool {
        if self.state == FleetState::Destroyed {
            warn!(operation, "Ignoring operation on destroyed overlay fleet");
            return true;
        }
        false
    }

    /// Replace every window with a new generation in `color`.
    ///
    /// Displays are enumerated before anything is touched; if that fails the
    /// current windows stay as they are.
    pub fn recreate(&mut self, color: Color) -> Result<()> {
        if self.is_destroyed("recreate") {
            return Ok(());
        }

        let displays = self
            .platform
            .displays()
            .context("Failed to enumerate displays")?;

        let generation = self.generation + 1;
        let mut windows = Vec::with_capacity(displays.len());
        for (index, geometry) in displays.into_iter().enumerate() {
            match OverlayWindow::create(&self.platform, geometry, color, self.settings.border_width) {
                Ok(window) => windows.push(window),
                Err(e) => {
                    warn!(display = index, %geometry, error = ?e, "Skipping display, overlay window could not be created");
                }
            }
        }

        // A window that cannot take the shared visibility is dropped like a failed display
        let mut consistent = Vec::with_capacity(windows.len());
        for mut window in windows {
            match window.set_visible(self.visible) {
                Ok(true) => {
                    self.pending.schedule_after(
                        self.settings.click_through_delay,
                        ClickThroughTask {
                            generation,
                            window: window.id(),
                        },
                    );
                    consistent.push(window);
                }
                Ok(false) => consistent.push(window),
                Err(e) => {
                    warn!(
                        window = window.id(),
                        geometry = %window.geometry(),
                        visible = self.visible,
                        error = ?e,
                        "Skipping display, overlay window could not take the shared visibility"
                    );
                }
            }
        }
        let windows = consistent;

        let previous = std::mem::replace(&mut self.windows, windows);
        self.generation = generation;
        self.color = color;
        self.pending.retain(|task| task.generation == generation);
        let replaced = previous.len();
        drop(previous);
        self.flush();

        info!(
            generation,
            windows = self.windows.len(),
            replaced,
            %color,
            visible = self.visible,
            "Overlay windows rebuilt"
        );
        Ok(())
    }

    /// Flip the shared visibility flag and apply it to every window
    pub fn toggle_visibility(&mut self) {
        if self.is_destroyed("toggle_visibility") {
            return;
        }
        self.visible = !self.visible;
        let generation = self.generation;
        for window in &mut self.windows {
            match window.set_visible(self.visible) {
                Ok(true) => self.pending.schedule_after(
                    self.settings.click_through_delay,
                    ClickThroughTask {
                        generation,
                        window: window.id(),
                    },
                ),
                Ok(false) => {}
                Err(e) => error!(
                    window = window.id(),
                    visible = self.visible,
                    window_visible = window.is_visible(),
                    error = ?e,
                    "Failed to change overlay visibility, window is out of step with the fleet"
                ),
            }
        }
        self.flush();
        info!(visible = self.visible, windows = self.windows.len(), "Toggled overlay visibility");
    }

    /// Rebuild in `color` unless it is already the current color
    pub fn set_color(&mut self, color: Color) -> Result<()> {
        if self.is_destroyed("set_color") {
            return Ok(());
        }
        if color == self.color {
            debug!(%color, "Color unchanged, keeping overlay windows");
            return Ok(());
        }
        self.recreate(color)
    }

    /// Destroy every window. Safe to call repeatedly and with no windows.
    pub fn shutdown(&mut self) {
        if self.state == FleetState::Destroyed {
            return;
        }
        let count = self.windows.len();
        self.windows.clear();
        self.pending.clear();
        self.state = FleetState::Destroyed;
        self.flush();
        info!(windows = count, "Overlay windows destroyed");
    }

    /// Re-render one window, e.g. after the windowing system discarded its contents
    pub fn repaint(&mut self, window: u32) {
        if let Some(target) = self.windows.iter_mut().find(|w| w.id() == window) {
            if !target.is_visible() {
                return;
            }
            if let Err(e) = target.render() {
                error!(window, error = ?e, "Failed to repaint overlay window");
            }
            self.flush();
        }
    }

    /// When the main loop must wake up to run deferred work
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.next_due()
    }

    /// Run deferred work due at `now`
    pub fn run_due(&mut self, now: Instant) {
        let tasks = self.pending.take_due(now);
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            if task.generation != self.generation {
                continue;
            }
            if let Some(window) = self.windows.iter_mut().find(|w| w.id() == task.window) {
                window.enable_click_through();
            }
        }
        self.flush();
    }

    fn flush(&self) {
        if let Err(e) = self.platform.flush() {
            error!(error = ?e, "Failed to flush overlay changes");
        }
    }
}

impl<P: Platform> Drop for OverlayFleet<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
