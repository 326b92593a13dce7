//! [`Surface`] implementation writing a PDF document with printpdf.

use std::io::{BufWriter, Cursor as IoCursor};

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use printpdf::indices::{PdfLayerIndex, PdfPageIndex};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::fonts::{FontMetrics, FontSource, FontWeight};
use crate::format::fold_diacritic;
use crate::surface::{Rgb, Surface};

const LAYER_NAME: &str = "Contenu";
const STROKE_WIDTH_PT: f64 = 0.5;

/// A report document being drawn.
///
/// Drawing calls go to the single layer of the current page; page coordinates are converted
/// from the top-left origin of [`Surface`] to the bottom-left origin of PDF.
pub struct PdfSurface {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    current: usize,
    width: f64,
    height: f64,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    regular_metrics: FontMetrics,
    bold_metrics: FontMetrics,
    builtin: bool,
    fill: Rgb,
    draw: Rgb,
    text_color: Rgb,
    font_size: f64,
    weight: FontWeight,
}

impl PdfSurface {
    /// Starts a one-page document sized after `config`, drawn with `fonts`.
    pub fn new(title: &str, config: &ReportConfig, fonts: &FontSource) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(config.page_width),
            Mm(config.page_height),
            LAYER_NAME,
        );

        let (regular, bold) = match fonts {
            FontSource::Builtin => (
                doc.add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(ReportError::rendering)?,
                doc.add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(ReportError::rendering)?,
            ),
            FontSource::TrueType(family) => (
                doc.add_external_font(IoCursor::new(family.regular.as_slice()))
                    .map_err(ReportError::rendering)?,
                doc.add_external_font(IoCursor::new(family.bold.as_slice()))
                    .map_err(ReportError::rendering)?,
            ),
        };

        let surface = Self {
            doc,
            pages: vec![(page, layer)],
            current: 0,
            width: config.page_width,
            height: config.page_height,
            regular,
            bold,
            regular_metrics: fonts.metrics(FontWeight::Regular),
            bold_metrics: fonts.metrics(FontWeight::Bold),
            builtin: matches!(fonts, FontSource::Builtin),
            fill: Rgb::BLACK,
            draw: Rgb::BLACK,
            text_color: Rgb::BLACK,
            font_size: 12.0,
            weight: FontWeight::Regular,
        };
        surface.prepare_layer();
        Ok(surface)
    }

    /// Serialises the document.
    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc.save(&mut writer).map_err(ReportError::rendering)?;
        writer
            .into_inner()
            .map_err(|err| ReportError::rendering(err.error()))
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.pages[self.current];
        self.doc.get_page(page).get_layer(layer)
    }

    fn prepare_layer(&self) {
        self.layer().set_outline_thickness(STROKE_WIDTH_PT);
    }

    fn point(&self, x: f64, y: f64) -> Point {
        Point::new(Mm(x), Mm(self.height - y))
    }

    fn shape(&self, points: Vec<Point>, closed: bool, fill: bool, stroke: bool) {
        let line = Line {
            points: points.into_iter().map(|point| (point, false)).collect(),
            is_closed: closed,
            has_fill: fill,
            has_stroke: stroke,
            is_clipping_path: false,
        };
        self.layer().add_shape(line);
    }

    fn rectangle(&self, x: f64, y: f64, width: f64, height: f64) -> Vec<Point> {
        vec![
            self.point(x, y),
            self.point(x + width, y),
            self.point(x + width, y + height),
            self.point(x, y + height),
        ]
    }

    fn metrics(&self) -> &FontMetrics {
        match self.weight {
            FontWeight::Regular => &self.regular_metrics,
            FontWeight::Bold => &self.bold_metrics,
        }
    }
}

fn pdf_color(color: Rgb) -> Color {
    let (r, g, b) = color.to_unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

/// Replaces characters the built-in fonts cannot show with close ASCII equivalents.
fn builtin_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            ' '..='~' => out.push(ch),
            '\u{a0}' | '\u{202f}' => out.push(' '),
            '—' | '–' => out.push('-'),
            '…' => out.push_str("..."),
            '²' => out.push('2'),
            '€' => out.push_str("EUR"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            other => {
                let folded = fold_diacritic(other);
                out.push(if folded.is_ascii() { folded } else { '?' });
            }
        }
    }
    out
}

impl Surface for PdfSurface {
    fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page(&self) -> usize {
        self.current + 1
    }

    fn add_page(&mut self) {
        let name = format!("{} {}", LAYER_NAME, self.pages.len() + 1);
        let indices = self
            .doc
            .add_page(Mm(self.width), Mm(self.height), name);
        self.pages.push(indices);
        self.current = self.pages.len() - 1;
        self.prepare_layer();
    }

    fn set_page(&mut self, page: usize) {
        self.current = page.clamp(1, self.pages.len()) - 1;
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
        self.layer().set_fill_color(pdf_color(self.fill));
        self.shape(self.rectangle(x, y, width, height), true, true, false);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.layer().set_outline_color(pdf_color(self.draw));
        self.shape(self.rectangle(x, y, width, height), true, false, true);
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.layer().set_outline_color(pdf_color(self.draw));
        self.shape(
            vec![self.point(x1, y1), self.point(x2, y2)],
            false,
            false,
            true,
        );
    }

    fn text(&mut self, text: &str, x: f64, y: f64) {
        let font = match self.weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        };
        let text = if self.builtin {
            builtin_text(text)
        } else {
            text.to_owned()
        };
        // Text is painted with the fill colour.
        let layer = self.layer();
        layer.set_fill_color(pdf_color(self.text_color));
        layer.use_text(text, self.font_size, Mm(x), Mm(self.height - y), font);
    }

    fn text_width(&self, text: &str) -> f64 {
        if self.builtin {
            self.metrics().text_width(&builtin_text(text), self.font_size)
        } else {
            self.metrics().text_width(text, self.font_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_surface() -> PdfSurface {
        PdfSurface::new("Test", &ReportConfig::default(), &FontSource::Builtin)
            .expect("document")
    }

    #[test]
    fn builtin_text_is_ascii() {
        assert_eq!(builtin_text("Données d'entrée"), "Donnees d'entree");
        assert_eq!(builtin_text("4,5 kWh/m²/j — 1\u{202f}200 €"), "4,5 kWh/m2/j - 1 200 EUR");
    }

    #[test]
    fn pages_are_tracked() {
        let mut surface = builtin_surface();
        assert_eq!(surface.page_count(), 1);
        surface.add_page();
        assert_eq!(surface.page_count(), 2);
        assert_eq!(surface.current_page(), 2);
        surface.set_page(1);
        assert_eq!(surface.current_page(), 1);
        surface.set_page(9);
        assert_eq!(surface.current_page(), 2);
    }

    #[test]
    fn folded_text_is_measured_as_drawn() {
        let mut surface = builtin_surface();
        surface.set_font(9.0, FontWeight::Regular);
        assert_eq!(
            surface.text_width("12 345 678.90 €"),
            surface.text_width("12 345 678.90 EUR")
        );
    }

    #[test]
    fn euro_price_is_truncated_within_its_cell() {
        let style = crate::config::TableStyle::default();
        let available = 30.0 - 2.0 * style.cell_padding;
        let mut surface = builtin_surface();
        surface.set_font(style.font_size, FontWeight::Regular);

        let fitted = crate::table::truncate_to_width(&surface, "12 345 678.90 €", available);
        assert!(fitted.ends_with("..."), "{fitted:?} should be shortened");
        assert!(
            surface.metrics().text_width(&builtin_text(&fitted), style.font_size) <= available,
            "drawn text {:?} overflows the cell",
            builtin_text(&fitted)
        );
    }

    #[test]
    fn finished_document_is_a_pdf() {
        let mut surface = builtin_surface();
        surface.set_fill_color(Rgb(41, 128, 185));
        surface.fill_rect(0.0, 0.0, 210.0, 5.0);
        surface.set_font(18.0, FontWeight::Bold);
        surface.text("Rapport de Dimensionnement Photovoltaïque", 20.0, 25.0);
        surface.add_page();
        surface.line(20.0, 267.0, 190.0, 267.0);

        let bytes = surface.finish().expect("serialised document");
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
