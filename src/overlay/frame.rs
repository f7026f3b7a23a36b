use tracing::debug;

use crate::types::Rect;

/// Picture-frame region drawn inside a window: everything between the outer
/// rectangle and the rectangle inset by `border` on all sides.
///
/// A border of half the smaller side or more would invert the inner
/// rectangle, so it is clamped to exactly half, which fills the whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderFrame {
    width: u16,
    height: u16,
    border: u16,
}

impl BorderFrame {
    pub fn new(width: u16, height: u16, border: u16) -> Self {
        let max = width.min(height) / 2;
        let clamped = border.min(max);
        if clamped != border {
            debug!(width, height, requested = border, used = clamped, "Clamped border to window size");
        }
        Self {
            width,
            height,
            border: clamped,
        }
    }

    #[cfg(test)]
    pub fn border(&self) -> u16 {
        self.border
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// True when no transparent interior is left
    pub fn is_solid(&self) -> bool {
        self.border > 0 && u32::from(self.border) * 2 >= u32::from(self.width.min(self.height))
    }

    /// Non-overlapping rectangles covering the frame: top, bottom, left, right
    pub fn rectangles(&self) -> Vec<Rect> {
        let (w, h, b) = (self.width, self.height, self.border);
        if b == 0 || w == 0 || h == 0 {
            return Vec::new();
        }
        if self.is_solid() {
            return vec![Rect::new(0, 0, w, h)];
        }
        let side_height = h - 2 * b;
        vec![
            Rect::new(0, 0, w, b),
            Rect::new(0, (h - b) as i16, w, b),
            Rect::new(0, b as i16, b, side_height),
            Rect::new((w - b) as i16, b as i16, b, side_height),
        ]
    }

    /// Number of pixels the frame covers
    #[cfg(test)]
    pub fn area(&self) -> u32 {
        self.rectangles().iter().map(Rect::area).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_frame_rectangles() {
        let frame = BorderFrame::new(1920, 1080, 20);
        assert!(!frame.is_solid());
        assert_eq!(
            frame.rectangles(),
            vec![
                Rect::new(0, 0, 1920, 20),
                Rect::new(0, 1060, 1920, 20),
                Rect::new(0, 20, 20, 1040),
                Rect::new(1900, 20, 20, 1040),
            ]
        );
    }

    #[test]
    fn test_frame_area_is_outer_minus_inner() {
        let frame = BorderFrame::new(1920, 1080, 20);
        assert_eq!(frame.area(), 1920 * 1080 - 1880 * 1040);
    }

    #[test]
    fn test_oversized_border_fills_window() {
        let frame = BorderFrame::new(30, 100, 20);
        assert_eq!(frame.border(), 15);
        assert!(frame.is_solid());
        assert_eq!(frame.rectangles(), vec![Rect::new(0, 0, 30, 100)]);
        assert_eq!(frame.area(), 30 * 100);
    }

    #[test]
    fn test_border_exactly_half_is_solid() {
        let frame = BorderFrame::new(40, 40, 20);
        assert!(frame.is_solid());
        assert_eq!(frame.area(), 1600);
    }

    #[test]
    fn test_odd_size_keeps_one_pixel_interior() {
        let frame = BorderFrame::new(41, 41, 20);
        assert!(!frame.is_solid());
        assert_eq!(frame.area(), 41 * 41 - 1);
    }

    #[test]
    fn test_zero_border_draws_nothing() {
        let frame = BorderFrame::new(800, 600, 0);
        assert!(frame.rectangles().is_empty());
        assert!(!frame.is_solid());
    }
}
