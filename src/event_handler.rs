use tracing::{trace, warn};
use x11rb::protocol::Event;

use crate::overlay::{OverlayFleet, Platform};

/// Apply one X11 event to the fleet
pub fn handle_event<P: Platform>(fleet: &mut OverlayFleet<P>, event: Event) {
    match event {
        // Only repaint on the last expose of a batch
        Event::Expose(event) if event.count == 0 => {
            fleet.repaint(event.window);
        }
        Event::Expose(_) => {}
        Event::Error(error) => {
            // Asynchronous request failures, e.g. for a window that is already gone
            warn!(error = ?error, "X11 request failed");
        }
        other => {
            trace!(event = ?other, "Ignoring X11 event");
        }
    }
}
