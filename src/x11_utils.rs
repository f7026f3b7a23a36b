use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use x11rb::protocol::randr::ConnectionExt as RandrExt;
use x11rb::protocol::render::{ConnectionExt as RenderExt, Pictformat};
use x11rb::protocol::xfixes::ConnectionExt as XFixesExt;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11;
use crate::types::DisplayGeometry;

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug, Clone, Copy)]
pub struct CachedAtoms {
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_state_skip_pager: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_state_skip_taskbar: intern(conn, "_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_skip_pager: intern(conn, "_NET_WM_STATE_SKIP_PAGER")?,
        })
    }
}

/// 32-bit TrueColor visual, needed for per-pixel transparency
pub fn find_argb_visual(screen: &Screen) -> Result<Visualid> {
    screen
        .allowed_depths
        .iter()
        .filter(|depth| depth.depth == x11::ARGB_DEPTH)
        .flat_map(|depth| depth.visuals.iter())
        .find(|visual| visual.class == VisualClass::TRUE_COLOR)
        .map(|visual| visual.visual_id)
        .context("No 32-bit TrueColor visual available. A compositing-capable X server is required.")
}

/// RENDER picture format matching `visual`
#[tracing::instrument(skip(conn))]
pub fn get_pictformat(conn: &RustConnection, visual: Visualid) -> Result<Pictformat> {
    let formats = conn
        .render_query_pict_formats()
        .context("Failed to query RENDER picture formats")?
        .reply()
        .context("Failed to get reply for RENDER picture formats query")?;

    if let Some(format) = formats
        .screens
        .iter()
        .flat_map(|screen| screen.depths.iter())
        .flat_map(|depth| depth.visuals.iter())
        .find(|pict_visual| pict_visual.visual == visual)
    {
        debug!("using Pictformat {} for visual {}", format.format, visual);
        return Ok(format.format);
    }

    // Fall back to any ARGB format of the right depth
    formats
        .formats
        .iter()
        .find(|format| format.depth == x11::ARGB_DEPTH && format.direct.alpha_mask != 0)
        .map(|format| format.id)
        .context(format!(
            "Could not find a picture format for visual {visual}. Check RENDER extension support."
        ))
}

/// Negotiate the XFixes version; the server rejects XFixes requests otherwise
pub fn init_xfixes(conn: &RustConnection) -> Result<()> {
    let version = conn
        .xfixes_query_version(x11::XFIXES_MAJOR, x11::XFIXES_MINOR)
        .context("Failed to query XFixes version")?
        .reply()
        .context("XFixes extension is not available")?;
    debug!(major = version.major_version, minor = version.minor_version, "XFixes initialized");
    Ok(())
}

/// Geometry of every active monitor, falling back to the whole root window
pub fn monitor_geometries(conn: &RustConnection, screen: &Screen) -> Result<Vec<DisplayGeometry>> {
    match randr_monitors(conn, screen) {
        Ok(monitors) if !monitors.is_empty() => return Ok(monitors),
        Ok(_) => warn!("RandR reported no monitors, using the root window"),
        Err(e) => warn!(error = ?e, "RandR monitor query failed, using the root window"),
    }
    Ok(vec![DisplayGeometry::new(
        0,
        0,
        screen.width_in_pixels,
        screen.height_in_pixels,
    )])
}

fn randr_monitors(conn: &RustConnection, screen: &Screen) -> Result<Vec<DisplayGeometry>> {
    conn.randr_query_version(x11::RANDR_MAJOR, x11::RANDR_MINOR)
        .context("Failed to query RandR version")?
        .reply()
        .context("RandR extension is not available")?;
    let reply = conn
        .randr_get_monitors(screen.root, true)
        .context("Failed to send RandR monitor query")?
        .reply()
        .context("Failed to get RandR monitor list")?;

    let monitors: Vec<DisplayGeometry> = reply
        .monitors
        .iter()
        .map(|monitor| DisplayGeometry::new(monitor.x, monitor.y, monitor.width, monitor.height))
        .collect();
    info!(count = monitors.len(), monitors = ?monitors, "Enumerated monitors");
    Ok(monitors)
}
