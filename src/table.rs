//! Striped data tables drawn cell by cell.
//!
//! A table is a coloured header band followed by fixed-height rows. Its footprint depends only
//! on the column widths and the number of rows: cell text never grows a row, it is shortened to
//! fit its column instead (see [`TruncationPolicy`]).

use std::borrow::Cow;

use crate::config::{TableStyle, TruncationPolicy};
use crate::fonts::FontWeight;
use crate::surface::{Rgb, Surface};

/// Marker appended to shortened cell text.
pub const ELLIPSIS: &str = "...";

/// Millimetres per character allowed by [`TruncationPolicy::CharacterBudget`].
pub const CHARACTER_BUDGET_DIVISOR: f64 = 2.5;

/// Content and column widths of one table.
///
/// The column count is the number of widths. Headers and row cells beyond it are ignored and
/// missing ones are left empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub column_widths: Vec<f64>,
}

impl TableSpec {
    pub fn new<H, S>(headers: H, column_widths: impl Into<Vec<f64>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            column_widths: column_widths.into(),
        }
    }

    /// Appends a row.
    pub fn row<R, S>(mut self, cells: R) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    pub fn push_row<R, S>(&mut self, cells: R)
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn column_count(&self) -> usize {
        self.column_widths.len()
    }

    /// Sum of the column widths.
    pub fn width(&self) -> f64 {
        self.column_widths.iter().sum()
    }

    /// Height of the table body, trailing margin excluded.
    pub fn height(&self, style: &TableStyle) -> f64 {
        style.header_height + self.rows.len() as f64 * style.row_height
    }
}

/// Character budget of a column under [`TruncationPolicy::CharacterBudget`].
pub fn character_budget(column_width: f64) -> usize {
    if column_width.is_finite() && column_width > 0.0 {
        (column_width / CHARACTER_BUDGET_DIVISOR).floor() as usize
    } else {
        0
    }
}

/// Cuts `text` to `budget - 3` characters plus an ellipsis when it exceeds `budget` characters.
pub fn truncate_to_budget(text: &str, budget: usize) -> Cow<'_, str> {
    if text.chars().count() <= budget {
        return Cow::Borrowed(text);
    }
    let kept: String = text.chars().take(budget.saturating_sub(3)).collect();
    Cow::Owned(kept + ELLIPSIS)
}

/// Shortens `text` to the longest prefix that, followed by an ellipsis, fits in `available`
/// millimetres of the surface's current font.
pub fn truncate_to_width<'t, S: Surface + ?Sized>(
    surface: &S,
    text: &'t str,
    available: f64,
) -> Cow<'t, str> {
    if surface.text_width(text) <= available {
        return Cow::Borrowed(text);
    }

    let budget = available - surface.text_width(ELLIPSIS);
    let mut end = 0;
    for (index, ch) in text.char_indices() {
        let next = index + ch.len_utf8();
        if surface.text_width(&text[..next]) > budget {
            break;
        }
        end = next;
    }
    Cow::Owned(format!("{}{}", &text[..end], ELLIPSIS))
}

/// Draws [`TableSpec`]s with a shared [`TableStyle`].
#[derive(Clone, Copy, Debug)]
pub struct TableBuilder<'a> {
    style: &'a TableStyle,
}

impl<'a> TableBuilder<'a> {
    pub fn new(style: &'a TableStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &TableStyle {
        self.style
    }

    /// Draws `spec` with its top-left corner at `(x, y)` and returns the y below the table,
    /// trailing margin included.
    pub fn draw_table<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        x: f64,
        y: f64,
        spec: &TableSpec,
        header_color: Rgb,
    ) -> f64 {
        let style = self.style;
        let width = spec.width();
        let height = spec.height(style);
        let columns = column_offsets(x, &spec.column_widths);

        surface.set_fill_color(header_color);
        surface.fill_rect(x, y, width, style.header_height);

        surface.set_text_color(Rgb::WHITE);
        surface.set_font(style.header_font_size, FontWeight::Bold);
        for ((left, column_width), header) in columns.iter().zip(&spec.headers) {
            self.cell_text(
                surface,
                header,
                *left,
                *column_width,
                y + style.header_baseline,
            );
        }

        surface.set_draw_color(Rgb::WHITE);
        for (left, _) in columns.iter().skip(1) {
            surface.line(*left, y, *left, y + style.header_height);
        }

        let mut row_top = y + style.header_height;
        for (index, row) in spec.rows.iter().enumerate() {
            if index % 2 == 1 {
                surface.set_fill_color(style.stripe_color);
                surface.fill_rect(x, row_top, width, style.row_height);
            }

            surface.set_text_color(Rgb::BLACK);
            surface.set_font(style.font_size, FontWeight::Regular);
            for ((left, column_width), cell) in columns.iter().zip(row) {
                self.cell_text(
                    surface,
                    cell,
                    *left,
                    *column_width,
                    row_top + style.row_baseline,
                );
            }

            surface.set_draw_color(style.grid_color);
            for (left, _) in columns.iter().skip(1) {
                surface.line(*left, row_top, *left, row_top + style.row_height);
            }
            let row_bottom = row_top + style.row_height;
            surface.line(x, row_bottom, x + width, row_bottom);
            row_top = row_bottom;
        }

        surface.set_draw_color(style.border_color);
        surface.stroke_rect(x, y, width, height);

        y + height + style.trailing_margin
    }

    fn cell_text<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        text: &str,
        left: f64,
        column_width: f64,
        baseline: f64,
    ) {
        if text.is_empty() {
            return;
        }
        let fitted = match self.style.truncation {
            TruncationPolicy::Measured => {
                let available = column_width - 2.0 * self.style.cell_padding;
                truncate_to_width(&*surface, text, available)
            }
            TruncationPolicy::CharacterBudget => {
                truncate_to_budget(text, character_budget(column_width))
            }
        };
        surface.text(&fitted, left + self.style.cell_padding, baseline);
    }
}

/// Left edge and width of every column.
fn column_offsets(x: f64, widths: &[f64]) -> Vec<(f64, f64)> {
    widths
        .iter()
        .scan(x, |left, width| {
            let column = (*left, *width);
            *left += width;
            Some(column)
        })
        .collect()
}
