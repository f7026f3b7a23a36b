//! Overlay window lifecycle
//!
//! - [`OverlayWindow`]: one display's border window and its input mode
//! - [`OverlayFleet`]: one window per display, sharing one color and one
//!   visibility flag, rebuilt wholesale on color change
//!
//! The windowing system sits behind [`Platform`] and [`Surface`] so the
//! lifecycle logic runs the same against X11 and against the in-memory
//! platform used in tests.

mod fleet;
mod frame;
mod window;

#[cfg(test)]
pub(crate) mod fake;

pub use fleet::{FleetSettings, FleetState, OverlayFleet};
pub use frame::BorderFrame;
pub use window::OverlayWindow;
#[cfg(test)]
pub use window::ClickThrough;

use anyhow::Result;

use crate::color::Rgba;
use crate::types::DisplayGeometry;

/// Windowing system entry point
pub trait Platform {
    type Surface: Surface;

    /// Current displays, in the order the windowing system reports them
    fn displays(&self) -> Result<Vec<DisplayGeometry>>;

    /// Create an unmapped, borderless, always-on-top, non-focusable window
    /// covering `geometry`. Dropping the surface destroys the window.
    fn create_surface(&self, geometry: &DisplayGeometry) -> Result<Self::Surface>;

    /// Push queued requests to the windowing system
    fn flush(&self) -> Result<()>;
}

/// One platform window
pub trait Surface {
    /// Identifier the windowing system uses in its events
    fn id(&self) -> u32;

    fn show(&mut self) -> Result<()>;

    fn hide(&mut self) -> Result<()>;

    /// Clear the window to transparent and fill `frame` with `color`
    fn paint(&mut self, frame: &BorderFrame, color: Rgba) -> Result<()>;

    /// Let pointer input pass through to whatever is beneath
    fn pass_input_through(&mut self) -> Result<()>;
}
