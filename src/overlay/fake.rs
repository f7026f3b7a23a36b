//! In-memory platform for lifecycle tests

use anyhow::{anyhow, bail, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use super::{BorderFrame, Platform, Surface};
use crate::color::Rgba;
use crate::types::DisplayGeometry;

#[derive(Debug, Default)]
struct FakeWindow {
    geometry: Option<DisplayGeometry>,
    mapped: bool,
    click_through: bool,
    click_through_attempts: u32,
    paints: Vec<(BorderFrame, Rgba)>,
}

#[derive(Debug, Default)]
struct FakeState {
    displays: Vec<DisplayGeometry>,
    fail_enumeration: bool,
    fail_geometries: HashSet<(i16, i16)>,
    fail_click_through: bool,
    fail_paint: bool,
    fail_show: bool,
    next_id: u32,
    live: BTreeMap<u32, FakeWindow>,
    created: u32,
    destroyed: Vec<u32>,
    flushes: u32,
}

/// Cloning shares state, so a test can keep a handle while the fleet owns one
#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    state: Rc<RefCell<FakeState>>,
}

impl FakePlatform {
    pub fn with_displays(displays: Vec<DisplayGeometry>) -> Self {
        let platform = Self::default();
        platform.state.borrow_mut().displays = displays;
        platform.state.borrow_mut().next_id = 100;
        platform
    }

    pub fn set_displays(&self, displays: Vec<DisplayGeometry>) {
        self.state.borrow_mut().displays = displays;
    }

    pub fn fail_enumeration(&self, fail: bool) {
        self.state.borrow_mut().fail_enumeration = fail;
    }

    /// Window creation fails for displays whose origin is `(x, y)`
    pub fn fail_display_at(&self, x: i16, y: i16) {
        self.state.borrow_mut().fail_geometries.insert((x, y));
    }

    pub fn fail_click_through(&self, fail: bool) {
        self.state.borrow_mut().fail_click_through = fail;
    }

    pub fn fail_paint(&self, fail: bool) {
        self.state.borrow_mut().fail_paint = fail;
    }

    pub fn fail_show(&self, fail: bool) {
        self.state.borrow_mut().fail_show = fail;
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn live_ids(&self) -> Vec<u32> {
        self.state.borrow().live.keys().copied().collect()
    }

    pub fn created_count(&self) -> u32 {
        self.state.borrow().created
    }

    pub fn destroyed(&self) -> Vec<u32> {
        self.state.borrow().destroyed.clone()
    }

    pub fn flushes(&self) -> u32 {
        self.state.borrow().flushes
    }

    pub fn is_mapped(&self, id: u32) -> bool {
        self.state.borrow().live.get(&id).is_some_and(|w| w.mapped)
    }

    pub fn is_click_through(&self, id: u32) -> bool {
        self.state.borrow().live.get(&id).is_some_and(|w| w.click_through)
    }

    pub fn click_through_attempts(&self, id: u32) -> u32 {
        self.state
            .borrow()
            .live
            .get(&id)
            .map_or(0, |w| w.click_through_attempts)
    }

    pub fn paint_count(&self, id: u32) -> usize {
        self.state.borrow().live.get(&id).map_or(0, |w| w.paints.len())
    }

    pub fn last_paint(&self, id: u32) -> Option<(BorderFrame, Rgba)> {
        self.state
            .borrow()
            .live
            .get(&id)
            .and_then(|w| w.paints.last().copied())
    }

    pub fn geometry_of(&self, id: u32) -> Option<DisplayGeometry> {
        self.state.borrow().live.get(&id).and_then(|w| w.geometry)
    }
}

impl Platform for FakePlatform {
    type Surface = FakeSurface;

    fn displays(&self) -> Result<Vec<DisplayGeometry>> {
        let state = self.state.borrow();
        if state.fail_enumeration {
            bail!("display enumeration unavailable");
        }
        Ok(state.displays.clone())
    }

    fn create_surface(&self, geometry: &DisplayGeometry) -> Result<FakeSurface> {
        let mut state = self.state.borrow_mut();
        if state.fail_geometries.contains(&(geometry.x, geometry.y)) {
            return Err(anyhow!("window creation refused for {geometry}"));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.created += 1;
        state.live.insert(
            id,
            FakeWindow {
                geometry: Some(*geometry),
                ..FakeWindow::default()
            },
        );
        Ok(FakeSurface {
            id,
            state: Rc::clone(&self.state),
        })
    }

    fn flush(&self) -> Result<()> {
        self.state.borrow_mut().flushes += 1;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeSurface {
    id: u32,
    state: Rc<RefCell<FakeState>>,
}

impl FakeSurface {
    fn with_window<R>(&self, f: impl FnOnce(&mut FakeWindow) -> R) -> Result<R> {
        let mut state = self.state.borrow_mut();
        let window = state
            .live
            .get_mut(&self.id)
            .ok_or_else(|| anyhow!("window {} does not exist", self.id))?;
        Ok(f(window))
    }
}

impl Surface for FakeSurface {
    fn id(&self) -> u32 {
        self.id
    }

    fn show(&mut self) -> Result<()> {
        if self.state.borrow().fail_show {
            bail!("map request rejected");
        }
        self.with_window(|w| w.mapped = true)
    }

    fn hide(&mut self) -> Result<()> {
        self.with_window(|w| w.mapped = false)
    }

    fn paint(&mut self, frame: &BorderFrame, color: Rgba) -> Result<()> {
        if self.state.borrow().fail_paint {
            bail!("render request rejected");
        }
        self.with_window(|w| w.paints.push((*frame, color)))
    }

    fn pass_input_through(&mut self) -> Result<()> {
        let fail = self.state.borrow().fail_click_through;
        self.with_window(|w| {
            w.click_through_attempts += 1;
            if !fail {
                w.click_through = true;
            }
        })?;
        if fail {
            bail!("input shape rejected");
        }
        Ok(())
    }
}

impl Drop for FakeSurface {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&self.id);
        state.destroyed.push(self.id);
    }
}
