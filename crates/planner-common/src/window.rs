//! Pixel windows in source-raster space.

use serde::{Deserialize, Serialize};

/// A rectangular window of pixels: `(col_off, row_off, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col_off: i64,
    pub row_off: i64,
    pub width: u64,
    pub height: u64,
}

impl PixelWindow {
    pub fn new(col_off: i64, row_off: i64, width: u64, height: u64) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// The window covering a whole raster.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as u64, height as u64)
    }

    /// Window spanning `[col_start, col_end) x [row_start, row_end)`.
    /// Inverted ranges produce an empty window.
    pub fn from_ranges(col_start: i64, col_end: i64, row_start: i64, row_end: i64) -> Self {
        Self::new(
            col_start,
            row_start,
            (col_end - col_start).max(0) as u64,
            (row_end - row_start).max(0) as u64,
        )
    }

    pub fn col_end(&self) -> i64 {
        self.col_off + self.width as i64
    }

    pub fn row_end(&self) -> i64 {
        self.row_off + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> u64 {
        self.width * self.height
    }

    /// Clamp to `[0, raster_width) x [0, raster_height)`.
    ///
    /// Returns `None` when nothing of the window lies inside the raster.
    pub fn clamp_to(&self, raster_width: u32, raster_height: u32) -> Option<PixelWindow> {
        let col_start = self.col_off.max(0);
        let row_start = self.row_off.max(0);
        let col_end = self.col_end().min(raster_width as i64);
        let row_end = self.row_end().min(raster_height as i64);

        let clamped = PixelWindow::from_ranges(col_start, col_end, row_start, row_end);
        if clamped.is_empty() {
            None
        } else {
            Some(clamped)
        }
    }

    /// Whether a pixel lies inside the window.
    pub fn contains(&self, col: i64, row: i64) -> bool {
        col >= self.col_off && col < self.col_end() && row >= self.row_off && row < self.row_end()
    }
}

impl std::fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[col {}..{}, row {}..{}]",
            self.col_off,
            self.col_end(),
            self.row_off,
            self.row_end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_partial_overlap() {
        let window = PixelWindow::new(-10, 5, 30, 10);
        let clamped = window.clamp_to(15, 12).unwrap();
        assert_eq!(clamped, PixelWindow::new(0, 5, 15, 7));
    }

    #[test]
    fn test_clamp_no_overlap() {
        assert!(PixelWindow::new(20, 0, 5, 5).clamp_to(10, 10).is_none());
        assert!(PixelWindow::new(-5, 0, 5, 5).clamp_to(10, 10).is_none());
        assert!(PixelWindow::new(0, 0, 0, 5).clamp_to(10, 10).is_none());
    }

    #[test]
    fn test_from_ranges_inverted_is_empty() {
        assert!(PixelWindow::from_ranges(5, 2, 0, 3).is_empty());
    }
}
