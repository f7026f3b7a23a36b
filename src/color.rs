//! Border color types
//!
//! [`Color`] is the user-facing, persisted RGB value. [`Rgba`] is what actually
//! gets drawn: the same channels plus the fixed overlay alpha.

use serde::{Deserialize, Serialize};
use std::fmt;
use x11rb::protocol::render;

use crate::constants::{color, overlay};

/// RGB color, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Attach the fixed overlay alpha for drawing
    pub fn overlay(self) -> Rgba {
        self.with_alpha(overlay::ALPHA)
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba {
        Rgba {
            red: self.red,
            green: self.green,
            blue: self.blue,
            alpha,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(color::DEFAULT_RED, color::DEFAULT_GREEN, color::DEFAULT_BLUE)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        red: 0,
        green: 0,
        blue: 0,
        alpha: 0,
    };

    /// Convert to a RENDER color: 16 bits per channel, premultiplied by alpha
    pub fn to_x11_color(self) -> render::Color {
        let premultiply = |channel: u8| -> u16 {
            let scaled = u32::from(channel) * u32::from(self.alpha) / 255;
            (scaled * 257) as u16
        };
        render::Color {
            red: premultiply(self.red),
            green: premultiply(self.green),
            blue: premultiply(self.blue),
            alpha: u16::from(self.alpha) * 257,
        }
    }
}
