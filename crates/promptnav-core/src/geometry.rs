#![forbid(unsafe_code)]

//! Panel placement in CSS pixel coordinates.

use serde::{Deserialize, Serialize};

/// Gap kept between the panel and the viewport edge.
pub const PANEL_MARGIN: f64 = 8.0;

/// Top-left corner of the panel, in CSS pixels from the viewport origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Keep a panel of `panel` size fully inside `viewport`, `margin` from each edge.
///
/// When the panel is larger than the viewport it pins to the top-left margin.
#[must_use]
pub fn clamp_position(pos: Position, panel: Size, viewport: Size, margin: f64) -> Position {
    let max_x = margin.max(viewport.width - panel.width - margin);
    let max_y = margin.max(viewport.height - panel.height - margin);
    Position {
        x: pos.x.clamp(margin, max_x),
        y: pos.y.clamp(margin, max_y),
    }
}

/// Pointer offset captured when a header drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub pointer_id: i32,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl DragAnchor {
    /// Anchor a drag at pointer `(client_x, client_y)` over a panel whose
    /// top-left is at `origin`.
    #[must_use]
    pub fn new(pointer_id: i32, client_x: f64, client_y: f64, origin: Position) -> Self {
        Self {
            pointer_id,
            offset_x: client_x - origin.x,
            offset_y: client_y - origin.y,
        }
    }

    /// Unclamped panel origin for the pointer at `(client_x, client_y)`.
    #[must_use]
    pub fn origin_for(&self, client_x: f64, client_y: f64) -> Position {
        Position::new(client_x - self.offset_x, client_y - self.offset_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1000.0, 800.0);
    const PANEL: Size = Size::new(300.0, 400.0);

    #[test]
    fn inside_position_is_unchanged() {
        let pos = Position::new(100.0, 50.0);
        assert_eq!(clamp_position(pos, PANEL, VIEWPORT, PANEL_MARGIN), pos);
    }

    #[test]
    fn clamps_to_margins() {
        let pos = clamp_position(Position::new(-50.0, 2000.0), PANEL, VIEWPORT, PANEL_MARGIN);
        assert_eq!(pos, Position::new(8.0, 392.0));
        let pos = clamp_position(Position::new(5000.0, -1.0), PANEL, VIEWPORT, PANEL_MARGIN);
        assert_eq!(pos, Position::new(692.0, 8.0));
    }

    #[test]
    fn oversized_panel_pins_to_margin() {
        let tiny = Size::new(200.0, 100.0);
        let pos = clamp_position(Position::new(300.0, 300.0), PANEL, tiny, PANEL_MARGIN);
        assert_eq!(pos, Position::new(8.0, 8.0));
    }

    #[test]
    fn drag_anchor_preserves_grab_offset() {
        let anchor = DragAnchor::new(1, 120.0, 60.0, Position::new(100.0, 50.0));
        assert_eq!(anchor.origin_for(220.0, 160.0), Position::new(200.0, 150.0));
    }

    #[test]
    fn finiteness() {
        assert!(Position::new(1.0, 2.0).is_finite());
        assert!(!Position::new(f64::NAN, 2.0).is_finite());
        assert!(!Position::new(1.0, f64::INFINITY).is_finite());
    }
}
