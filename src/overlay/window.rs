use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::{BorderFrame, Platform, Surface};
use crate::color::Color;
use crate::types::DisplayGeometry;

/// Click-through setup progress. Setup is attempted at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickThrough {
    /// Window has never been shown
    NotRequested,
    /// Window was shown; the deferred setup has not run yet
    Scheduled,
    Enabled,
    /// The platform rejected the call; the window may still capture input
    Failed,
}

/// Border overlay covering one display
#[derive(Debug)]
pub struct OverlayWindow<S: Surface> {
    surface: S,
    geometry: DisplayGeometry,
    color: Color,
    border_width: u16,
    visible: bool,
    click_through: ClickThrough,
}

impl<S: Surface> OverlayWindow<S> {
    /// Create a hidden window for `geometry`, bound to `color` for its lifetime
    pub fn create<P>(platform: &P, geometry: DisplayGeometry, color: Color, border_width: u16) -> Result<Self>
    where
        P: Platform<Surface = S>,
    {
        geometry.validate()?;
        let surface = platform
            .create_surface(&geometry)
            .context(format!("Failed to create overlay window for display {geometry}"))?;
        debug!(window = surface.id(), %geometry, %color, "Created overlay window");
        Ok(Self {
            surface,
            geometry,
            color,
            border_width,
            visible: false,
            click_through: ClickThrough::NotRequested,
        })
    }

    pub fn id(&self) -> u32 {
        self.surface.id()
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    #[cfg(test)]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn click_through(&self) -> ClickThrough {
        self.click_through
    }

    pub fn frame(&self) -> BorderFrame {
        BorderFrame::new(self.geometry.width, self.geometry.height, self.border_width)
    }

    /// Draw the border at the fixed overlay alpha
    pub fn render(&mut self) -> Result<()> {
        let frame = self.frame();
        self.surface
            .paint(&frame, self.color.overlay())
            .context(format!("Failed to paint overlay window {}", self.id()))
    }

    /// Show or hide without destroying.
    ///
    /// Returns `true` exactly once per window: on the first show, when the
    /// caller must schedule [`OverlayWindow::enable_click_through`]. A mapped
    /// window always gets that request, even if painting it failed.
    pub fn set_visible(&mut self, visible: bool) -> Result<bool> {
        if visible == self.visible {
            return Ok(false);
        }
        if !visible {
            self.surface
                .hide()
                .context(format!("Failed to hide overlay window {}", self.id()))?;
            self.visible = false;
            return Ok(false);
        }

        self.surface
            .show()
            .context(format!("Failed to show overlay window {}", self.id()))?;
        self.visible = true;
        if let Err(e) = self.render() {
            error!(window = self.id(), error = ?e, "Overlay window shown without its border");
        }

        if self.click_through == ClickThrough::NotRequested {
            self.click_through = ClickThrough::Scheduled;
            return Ok(true);
        }
        Ok(false)
    }

    /// Make the window ignore pointer input. Failure is logged, never fatal.
    pub fn enable_click_through(&mut self) {
        if self.click_through != ClickThrough::Scheduled {
            return;
        }
        match self.surface.pass_input_through() {
            Ok(()) => {
                self.click_through = ClickThrough::Enabled;
                info!(window = self.id(), geometry = %self.geometry, "Overlay window is click-through");
            }
            Err(e) => {
                self.click_through = ClickThrough::Failed;
                warn!(window = self.id(), error = ?e, "Failed to make overlay window click-through");
            }
        }
    }
}
