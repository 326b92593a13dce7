//! Report configuration.
//!
//! Every field has a default matching the stock report layout, so a configuration file only
//! needs to name what it changes. Files are JSON:
//!
//! ```json
//! { "page_height": 279.4, "table": { "truncation": "character_budget" } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::surface::Rgb;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How cell text that does not fit its column is shortened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Keep the longest prefix whose measured width, ellipsis included, fits the cell.
    #[default]
    Measured,
    /// Allow `column width / 2.5` characters; longer text keeps `budget - 3` of them.
    CharacterBudget,
}

/// Geometry and colours of rendered tables. Lengths are millimetres, font sizes points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStyle {
    pub header_height: f64,
    pub row_height: f64,
    pub font_size: f64,
    pub header_font_size: f64,
    pub cell_padding: f64,
    pub header_baseline: f64,
    pub row_baseline: f64,
    pub trailing_margin: f64,
    pub stripe_color: Rgb,
    pub border_color: Rgb,
    pub grid_color: Rgb,
    pub truncation: TruncationPolicy,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_height: 8.0,
            row_height: 6.0,
            font_size: 9.0,
            header_font_size: 10.0,
            cell_padding: 2.0,
            header_baseline: 5.5,
            row_baseline: 4.0,
            trailing_margin: 5.0,
            stripe_color: Rgb(245, 245, 245),
            border_color: Rgb(150, 150, 150),
            grid_color: Rgb(200, 200, 200),
            truncation: TruncationPolicy::Measured,
        }
    }
}

/// Accent colours of the report sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPalette {
    pub header_band: Rgb,
    pub parameters: Rgb,
    pub results: Rgb,
    pub equipment: Rgb,
    pub topology: Rgb,
    pub title: Rgb,
    pub subtitle: Rgb,
    /// Separator lines of the header and footer.
    pub rule: Rgb,
    /// Footer text.
    pub muted: Rgb,
}

impl Default for SectionPalette {
    fn default() -> Self {
        Self {
            header_band: Rgb(41, 128, 185),
            parameters: Rgb(52, 152, 219),
            results: Rgb(46, 204, 113),
            equipment: Rgb(230, 126, 34),
            topology: Rgb(41, 128, 185),
            title: Rgb(41, 128, 185),
            subtitle: Rgb(100, 100, 100),
            rule: Rgb(200, 200, 200),
            muted: Rgb(128, 128, 128),
        }
    }
}

/// Settings for one report generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    /// Space kept free above the bottom edge for the footer.
    pub footer_reserve: f64,
    pub table: TableStyle,
    pub palette: SectionPalette,
    /// Directory searched first for the TrueType family.
    pub fonts_dir: Option<PathBuf>,
    /// Embed a TrueType family when one is found. Disabled, reports use built-in Helvetica.
    pub embed_fonts: bool,
    /// Add a PDF outline entry per section (requires the `bookmarks` feature).
    pub bookmarks: bool,
    pub attribution: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            footer_reserve: 30.0,
            table: TableStyle::default(),
            palette: SectionPalette::default(),
            fonts_dir: None,
            embed_fonts: true,
            bookmarks: true,
            attribution: "Rapport généré automatiquement par le Calculateur Solaire".to_owned(),
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Sets the page size in millimetres.
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    pub fn with_truncation(mut self, policy: TruncationPolicy) -> Self {
        self.table.truncation = policy;
        self
    }

    pub fn with_fonts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fonts_dir = Some(dir.into());
        self
    }

    /// Enables or disables TrueType embedding.
    pub fn with_embedded_fonts(mut self, embed: bool) -> Self {
        self.embed_fonts = embed;
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_attribution(mut self, text: impl Into<String>) -> Self {
        self.attribution = text.into();
        self
    }

    /// Lowest y a section may reach before the footer area.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.footer_reserve
    }
}
