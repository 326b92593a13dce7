//! The drawing surface reports are laid out on.
//!
//! [`Surface`] is a small, stateful canvas in the style of most PDF drawing libraries: colours
//! and the current font are set first and then used by the following drawing calls.
//! Coordinates are millimetres measured from the top-left corner of the current page, with `y`
//! growing downwards, and text is positioned by its baseline.
//!
//! [`crate::pdf::PdfSurface`] draws into a real document; [`RecordingSurface`] keeps a display
//! list of every call, which is what the layout tests inspect.

use serde::{Deserialize, Serialize};

use crate::fonts::{FontMetrics, FontWeight};

/// An sRGB colour with 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            f64::from(self.0) / 255.0,
            f64::from(self.1) / 255.0,
            f64::from(self.2) / 255.0,
        )
    }
}

/// Drawing primitives needed to lay out a report.
pub trait Surface {
    /// Width and height of a page in millimetres.
    fn page_size(&self) -> (f64, f64);

    /// Number of pages created so far.
    fn page_count(&self) -> usize;

    /// 1-based index of the page drawing calls go to.
    fn current_page(&self) -> usize;

    /// Appends a page and makes it current.
    fn add_page(&mut self);

    /// Makes an existing page current. Out-of-range values are clamped.
    fn set_page(&mut self, page: usize);

    fn set_fill_color(&mut self, color: Rgb);

    fn set_draw_color(&mut self, color: Rgb);

    fn set_text_color(&mut self, color: Rgb);

    fn set_font(&mut self, size_pt: f64, weight: FontWeight);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);

    /// Draws `text` with its baseline starting at `(x, y)`.
    fn text(&mut self, text: &str, x: f64, y: f64);

    /// Width of `text` in the current font, in millimetres.
    fn text_width(&self, text: &str) -> f64;
}

/// Axis-aligned rectangle in page coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        page: usize,
        rect: Rect,
        color: Rgb,
    },
    StrokeRect {
        page: usize,
        rect: Rect,
        color: Rgb,
    },
    Line {
        page: usize,
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
    },
    Text {
        page: usize,
        text: String,
        x: f64,
        y: f64,
        size: f64,
        weight: FontWeight,
        color: Rgb,
    },
}

impl DrawOp {
    /// Page the operation was drawn on.
    pub fn page(&self) -> usize {
        match self {
            Self::FillRect { page, .. }
            | Self::StrokeRect { page, .. }
            | Self::Line { page, .. }
            | Self::Text { page, .. } => *page,
        }
    }
}

/// A [`Surface`] that records drawing calls instead of producing a document.
///
/// Text is measured with the built-in Helvetica metrics, matching what
/// [`crate::pdf::PdfSurface`] uses when no TrueType family is installed.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    pages: usize,
    current: usize,
    fill: Rgb,
    draw: Rgb,
    text_color: Rgb,
    font_size: f64,
    weight: FontWeight,
    regular: FontMetrics,
    bold: FontMetrics,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    /// Creates a surface with one blank page of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pages: 1,
            current: 1,
            fill: Rgb::BLACK,
            draw: Rgb::BLACK,
            text_color: Rgb::BLACK,
            font_size: 12.0,
            weight: FontWeight::Regular,
            regular: FontMetrics::helvetica(FontWeight::Regular),
            bold: FontMetrics::helvetica(FontWeight::Bold),
            ops: Vec::new(),
        }
    }

    /// Creates an A4 portrait surface.
    pub fn a4() -> Self {
        Self::new(210.0, 297.0)
    }

    /// Operations recorded so far, in drawing order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Consumes the surface and returns the display list.
    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Text strings drawn so far, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn metrics(&self) -> &FontMetrics {
        match self.weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl Surface for RecordingSurface {
    fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn current_page(&self) -> usize {
        self.current
    }

    fn add_page(&mut self) {
        self.pages += 1;
        self.current = self.pages;
    }

    fn set_page(&mut self, page: usize) {
        self.current = page.clamp(1, self.pages);
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.fill = color;
    }

    fn set_draw_color(&mut self, color: Rgb) {
        self.draw = color;
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    fn set_font(&mut self, size_pt: f64, weight: FontWeight) {
        self.font_size = size_pt;
        self.weight = weight;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::FillRect {
            page: self.current,
            rect: Rect {
                x,
                y,
                width,
                height,
            },
            color: self.fill,
        });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::StrokeRect {
            page: self.current,
            rect: Rect {
                x,
                y,
                width,
                height,
            },
            color: self.draw,
        });
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.ops.push(DrawOp::Line {
            page: self.current,
            from: (x1, y1),
            to: (x2, y2),
            color: self.draw,
        });
    }

    fn text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::Text {
            page: self.current,
            text: text.to_owned(),
            x,
            y,
            size: self.font_size,
            weight: self.weight,
            color: self.text_color,
        });
    }

    fn text_width(&self, text: &str) -> f64 {
        self.metrics().text_width(text, self.font_size)
    }
}
