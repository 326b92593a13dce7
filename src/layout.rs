//! Vertical layout cursor.
//!
//! Sections are stacked top to bottom. Each drawing step reports the next free y and the cursor
//! only accepts values at or below its current position, so nothing on a page is drawn over
//! earlier content. When a block would run into the footer area a new page is started and the
//! cursor restarts at the top margin.

use log::debug;

use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    y: f64,
    top: f64,
    bottom: f64,
}

impl Cursor {
    /// Creates a cursor at `y` on a page whose usable area spans `top..bottom`.
    pub fn new(y: f64, top: f64, bottom: f64) -> Self {
        Self { y, top, bottom }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Moves down by `delta`. Negative values are ignored.
    pub fn advance(&mut self, delta: f64) {
        self.y += delta.max(0.0);
    }

    /// Moves to `y` when it lies below the current position.
    pub fn advance_to(&mut self, y: f64) {
        if y > self.y {
            self.y = y;
        }
    }

    /// Whether a block of `height` fits between the cursor and the bottom limit.
    pub fn fits(&self, height: f64) -> bool {
        self.y + height <= self.bottom
    }

    /// Starts a new page on `surface` when `height` does not fit on the current one.
    ///
    /// Returns `true` when a page was added. A block taller than a whole page is placed at the
    /// top of a fresh page and allowed to overflow.
    pub fn ensure_space<S: Surface + ?Sized>(&mut self, surface: &mut S, height: f64) -> bool {
        if self.fits(height) || self.y <= self.top {
            return false;
        }
        surface.add_page();
        debug!(
            "Block of {:.1} mm does not fit at y = {:.1}; continuing on page {}",
            height,
            self.y,
            surface.current_page()
        );
        self.y = self.top;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    #[test]
    fn never_moves_up() {
        let mut cursor = Cursor::new(50.0, 20.0, 267.0);
        cursor.advance_to(40.0);
        assert_eq!(cursor.y(), 50.0);
        cursor.advance(-5.0);
        assert_eq!(cursor.y(), 50.0);
        cursor.advance_to(72.5);
        assert_eq!(cursor.y(), 72.5);
    }

    #[test]
    fn breaks_page_when_block_overflows() {
        let mut surface = RecordingSurface::a4();
        let mut cursor = Cursor::new(250.0, 20.0, 267.0);

        assert!(!cursor.ensure_space(&mut surface, 10.0));
        assert_eq!(surface.page_count(), 1);

        assert!(cursor.ensure_space(&mut surface, 40.0));
        assert_eq!(surface.page_count(), 2);
        assert_eq!(cursor.y(), 20.0);
    }

    #[test]
    fn oversized_block_at_top_does_not_loop() {
        let mut surface = RecordingSurface::a4();
        let mut cursor = Cursor::new(20.0, 20.0, 267.0);
        assert!(!cursor.ensure_space(&mut surface, 400.0));
        assert_eq!(surface.page_count(), 1);
    }
}
