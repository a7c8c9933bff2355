//! Travel rectangle for the logo

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// One of the four rectangle corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Fixed evaluation order; ties resolve to the earliest entry
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn is_right(self) -> bool {
        matches!(self, Corner::TopRight | Corner::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Corner::BottomLeft | Corner::BottomRight)
    }
}

/// Safe area for the logo's top-left point (screen coordinates, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl RectBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x: max_x.max(min_x),
            min_y,
            max_y: max_y.max(min_y),
        }
    }

    /// Viewport minus a margin on every side minus the logo's own size.
    /// A viewport too small for the logo collapses to a single point.
    pub fn from_viewport(viewport: DVec2, margin: f64, logo_size: DVec2) -> Self {
        Self::new(
            margin,
            viewport.x - margin - logo_size.x,
            margin,
            viewport.y - margin - logo_size.y,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_collapsed(&self) -> bool {
        self.width() <= 0.0 && self.height() <= 0.0
    }

    pub fn corner(&self, corner: Corner) -> DVec2 {
        DVec2::new(
            if corner.is_right() { self.max_x } else { self.min_x },
            if corner.is_bottom() { self.max_y } else { self.min_y },
        )
    }

    pub fn clamp(&self, p: DVec2) -> DVec2 {
        DVec2::new(p.x.clamp(self.min_x, self.max_x), p.y.clamp(self.min_y, self.max_y))
    }

    /// Corner the point is touching, if any, within `tolerance` px on both axes
    pub fn touching_corner(&self, p: DVec2, tolerance: f64) -> Option<Corner> {
        Corner::ALL.into_iter().find(|&c| {
            let q = self.corner(c);
            (p.x - q.x).abs() <= tolerance && (p.y - q.y).abs() <= tolerance
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_viewport_subtracts_margin_and_logo() {
        let b = RectBounds::from_viewport(DVec2::new(1000.0, 800.0), 20.0, DVec2::new(100.0, 50.0));
        assert_eq!(b, RectBounds::new(20.0, 880.0, 20.0, 730.0));
        assert_eq!(b.corner(Corner::BottomRight), DVec2::new(880.0, 730.0));
        assert_eq!(b.corner(Corner::TopLeft), DVec2::new(20.0, 20.0));
    }

    #[test]
    fn test_tiny_viewport_collapses() {
        let b = RectBounds::from_viewport(DVec2::new(50.0, 50.0), 20.0, DVec2::new(100.0, 50.0));
        assert!(b.is_collapsed());
        assert_eq!(b.corner(Corner::BottomRight), b.corner(Corner::TopLeft));
    }

    #[test]
    fn test_touching_corner() {
        let b = RectBounds::new(0.0, 100.0, 0.0, 50.0);
        assert_eq!(b.touching_corner(DVec2::new(99.0, 1.5), 2.0), Some(Corner::TopRight));
        assert_eq!(b.touching_corner(DVec2::new(50.0, 0.0), 2.0), None);
    }
}
