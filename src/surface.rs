//! X11 implementation of the overlay platform
//!
//! Each overlay is an override-redirect ARGB window drawn with RENDER fills.
//! Click-through is an empty XFixes input region on the window.

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::render::{ConnectionExt as RenderExt, CreatePictureAux, PictOp, Pictformat, Picture};
use x11rb::protocol::shape::SK;
use x11rb::protocol::xfixes::ConnectionExt as XFixesExt;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;
use x11rb::NONE;

use crate::color::Rgba;
use crate::constants::x11;
use crate::overlay::{BorderFrame, Platform, Surface};
use crate::types::{DisplayGeometry, Rect};
use crate::x11_utils::{find_argb_visual, get_pictformat, init_xfixes, monitor_geometries, CachedAtoms};

/// Connection-wide state shared by every overlay window
pub struct X11Platform<'a> {
    conn: &'a RustConnection,
    screen: &'a Screen,
    atoms: CachedAtoms,
    visual: Visualid,
    pictformat: Pictformat,
    xfixes: bool,
}

impl<'a> X11Platform<'a> {
    pub fn new(conn: &'a RustConnection, screen: &'a Screen) -> Result<Self> {
        let atoms = CachedAtoms::new(conn).context("Failed to cache X11 atoms")?;
        let visual = find_argb_visual(screen)?;
        let pictformat = get_pictformat(conn, visual).context("Failed to get picture format for overlay rendering")?;
        let xfixes = match init_xfixes(conn) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = ?e, "Overlay windows will not be click-through");
                false
            }
        };
        info!(visual, xfixes, "X11 overlay platform ready");
        Ok(Self {
            conn,
            screen,
            atoms,
            visual,
            pictformat,
            xfixes,
        })
    }

    /// Setup window properties (WM_CLASS, always-on-top, no taskbar/pager entry)
    fn setup_window_properties(&self, window: Window) -> Result<()> {
        self.conn
            .change_property8(
                PropMode::REPLACE,
                window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                x11::WM_CLASS,
            )
            .context(format!("Failed to set WM_CLASS on window {window}"))?;

        self.conn
            .change_property32(
                PropMode::REPLACE,
                window,
                self.atoms.net_wm_state,
                AtomEnum::ATOM,
                &[
                    self.atoms.net_wm_state_above,
                    self.atoms.net_wm_state_skip_taskbar,
                    self.atoms.net_wm_state_skip_pager,
                ],
            )
            .context(format!("Failed to set _NET_WM_STATE on window {window}"))?;
        Ok(())
    }
}

impl<'a> Platform for X11Platform<'a> {
    type Surface = X11Surface<'a>;

    fn displays(&self) -> Result<Vec<DisplayGeometry>> {
        monitor_geometries(self.conn, self.screen)
    }

    fn create_surface(&self, geometry: &DisplayGeometry) -> Result<X11Surface<'a>> {
        // Partially built surfaces release whatever they already own on drop
        let mut surface = X11Surface {
            conn: self.conn,
            window: NONE,
            colormap: NONE,
            picture: NONE,
            xfixes: self.xfixes,
        };

        let colormap = self.conn.generate_id().context("Failed to generate colormap ID")?;
        self.conn
            .create_colormap(ColormapAlloc::NONE, colormap, self.screen.root, self.visual)
            .context("Failed to create ARGB colormap")?;
        surface.colormap = colormap;

        let window = self.conn.generate_id().context("Failed to generate X11 window ID")?;
        self.conn
            .create_window(
                x11::ARGB_DEPTH,
                window,
                self.screen.root,
                geometry.x,
                geometry.y,
                geometry.width,
                geometry.height,
                0,
                WindowClass::INPUT_OUTPUT,
                self.visual,
                &CreateWindowAux::new()
                    .background_pixel(0)
                    .border_pixel(0)
                    .colormap(colormap)
                    .override_redirect(x11::OVERRIDE_REDIRECT)
                    .event_mask(EventMask::EXPOSURE),
            )
            .context(format!("Failed to send window creation for display {geometry}"))?
            .check()
            .context(format!("X server refused overlay window for display {geometry}"))?;
        surface.window = window;

        self.setup_window_properties(window)?;

        let picture = self.conn.generate_id().context("Failed to generate ID for window picture")?;
        self.conn
            .render_create_picture(picture, window, self.pictformat, &CreatePictureAux::new())
            .context(format!("Failed to create picture for window {window}"))?;
        surface.picture = picture;

        debug!(window, %geometry, "Created X11 overlay window");
        Ok(surface)
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}

fn to_rectangle(rect: &Rect) -> Rectangle {
    Rectangle {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

/// One override-redirect ARGB window; destroyed on drop
#[derive(Debug)]
pub struct X11Surface<'a> {
    conn: &'a RustConnection,
    window: Window,
    colormap: Colormap,
    picture: Picture,
    xfixes: bool,
}

impl Surface for X11Surface<'_> {
    fn id(&self) -> u32 {
        self.window
    }

    fn show(&mut self) -> Result<()> {
        self.conn
            .map_window(self.window)
            .context(format!("Failed to map window {}", self.window))?;
        self.conn
            .configure_window(self.window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
            .context(format!("Failed to raise window {} to top of stack", self.window))?;
        Ok(())
    }

    fn hide(&mut self) -> Result<()> {
        self.conn
            .unmap_window(self.window)
            .context(format!("Failed to unmap window {}", self.window))?;
        Ok(())
    }

    fn paint(&mut self, frame: &BorderFrame, color: Rgba) -> Result<()> {
        let whole = Rectangle {
            x: 0,
            y: 0,
            width: frame.width(),
            height: frame.height(),
        };
        self.conn
            .render_fill_rectangles(PictOp::SRC, self.picture, Rgba::TRANSPARENT.to_x11_color(), &[whole])
            .context(format!("Failed to clear window {}", self.window))?;

        let rectangles: Vec<Rectangle> = frame.rectangles().iter().map(to_rectangle).collect();
        if !rectangles.is_empty() {
            self.conn
                .render_fill_rectangles(PictOp::SRC, self.picture, color.to_x11_color(), &rectangles)
                .context(format!("Failed to fill border of window {}", self.window))?;
        }
        Ok(())
    }

    fn pass_input_through(&mut self) -> Result<()> {
        if !self.xfixes {
            bail!("XFixes is unavailable");
        }
        let region = self.conn.generate_id().context("Failed to generate region ID")?;
        self.conn
            .xfixes_create_region(region, &[])
            .context("Failed to create empty input region")?;
        let result = self
            .conn
            .xfixes_set_window_shape_region(self.window, SK::INPUT, 0, 0, region)
            .context(format!("Failed to send input shape for window {}", self.window))
            .and_then(|cookie| {
                cookie
                    .check()
                    .context(format!("X server rejected input shape for window {}", self.window))
            });
        if let Err(e) = self.conn.xfixes_destroy_region(region) {
            error!("Failed to destroy region {}: {}", region, e);
        }
        result
    }
}

impl Drop for X11Surface<'_> {
    fn drop(&mut self) {
        // Clean up each resource independently to prevent cascade failures

        if self.picture != NONE {
            if let Err(e) = self.conn.render_free_picture(self.picture) {
                error!("Failed to free picture {}: {}", self.picture, e);
            }
        }

        if self.window != NONE {
            if let Err(e) = self.conn.destroy_window(self.window) {
                error!("Failed to destroy window {}: {}", self.window, e);
            }
        }

        if self.colormap != NONE {
            if let Err(e) = self.conn.free_colormap(self.colormap) {
                error!("Failed to free colormap {}: {}", self.colormap, e);
            }
        }
    }
}
