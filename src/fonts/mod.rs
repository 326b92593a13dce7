//! Font discovery and glyph metrics for the `solar_report` crate.
//!
//! Reports are drawn with the PDF built-in Helvetica family unless a TrueType family is found
//! on disk, in which case it is embedded so accented text renders with the right glyphs. Either
//! way the table renderer measures text through [`FontMetrics`], so truncation follows the font
//! that is actually used.

use std::collections::HashMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::format::fold_diacritic;

/// Name of the TrueType family looked up on disk.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory that holds the TrueType family.
pub const FONTS_DIR_ENV: &str = "SOLAR_REPORT_FONTS_DIR";

const REGULAR_FILE: &str = "Roboto-Regular.ttf";
const BOLD_FILE: &str = "Roboto-Bold.ttf";
const FONT_FILES: &[&str] = &[REGULAR_FILE, BOLD_FILE];

/// Millimetres per PostScript point.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Errors raised while locating or loading a TrueType family.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Unable to locate font directory. Checked: {0}. Set SOLAR_REPORT_FONTS_DIR to a directory containing Roboto-Regular.ttf and Roboto-Bold.ttf.")]
    NotFound(String),

    #[error("failed to read font file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse font file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ttf_parser::FaceParsingError,
    },
}

/// Stroke weight of a font face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

// Adobe AFM advance widths for ' '..='~', in thousandths of an em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const HELVETICA_EXTRAS: &[(char, u16)] = &[
    ('\u{a0}', 278),
    ('°', 400),
    ('²', 333),
    ('·', 278),
    ('—', 1000),
    ('…', 1000),
    ('€', 556),
];

/// Characters whose advance is cached when reading a TrueType face.
fn measured_characters() -> impl Iterator<Item = char> {
    (' '..='~')
        .chain('\u{a0}'..='\u{17f}')
        .chain(['—', '…', '€', '\u{202f}'])
}

/// Advance widths of one font face, in thousandths of an em.
#[derive(Clone, Debug, PartialEq)]
pub struct FontMetrics {
    widths: HashMap<char, u16>,
    fallback: u16,
}

impl FontMetrics {
    /// Metrics of the built-in Helvetica face with the given weight.
    pub fn helvetica(weight: FontWeight) -> Self {
        let table = match weight {
            FontWeight::Regular => &HELVETICA_WIDTHS,
            FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
        };

        let mut widths: HashMap<char, u16> = (' '..='~').zip(table.iter().copied()).collect();
        widths.extend(HELVETICA_EXTRAS.iter().copied());
        for ch in '\u{c0}'..='\u{ff}' {
            let base = fold_diacritic(ch);
            if base != ch {
                if let Some(width) = widths.get(&base).copied() {
                    widths.insert(ch, width);
                }
            }
        }

        Self {
            widths,
            fallback: 556,
        }
    }

    /// Reads the horizontal advances of a TrueType face.
    pub fn from_truetype(data: &[u8]) -> Result<Self, ttf_parser::FaceParsingError> {
        let face = ttf_parser::Face::parse(data, 0)?;
        let units_per_em = u32::from(face.units_per_em().max(1));
        let advance = |ch: char| {
            face.glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map(|units| (u32::from(units) * 1000 / units_per_em) as u16)
        };

        let widths: HashMap<char, u16> = measured_characters()
            .filter_map(|ch| advance(ch).map(|width| (ch, width)))
            .collect();
        let fallback = widths.get(&'n').copied().unwrap_or(500);

        Ok(Self { widths, fallback })
    }

    /// Advance of `ch` in thousandths of an em.
    pub fn char_width(&self, ch: char) -> u16 {
        self.widths.get(&ch).copied().unwrap_or(self.fallback)
    }

    /// Width of `text` set at `size_pt`, in millimetres.
    pub fn text_width(&self, text: &str, size_pt: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| u32::from(self.char_width(ch))).sum();
        f64::from(units) / 1000.0 * size_pt * MM_PER_PT
    }
}

/// A regular and a bold TrueType face loaded from disk.
#[derive(Clone, Debug)]
pub struct TrueTypeFamily {
    pub directory: PathBuf,
    pub regular: Vec<u8>,
    pub bold: Vec<u8>,
    pub regular_metrics: FontMetrics,
    pub bold_metrics: FontMetrics,
}

/// The font family a report is drawn with.
#[derive(Clone, Debug)]
pub enum FontSource {
    /// PDF built-in Helvetica, nothing embedded.
    Builtin,
    /// Embedded TrueType family.
    TrueType(TrueTypeFamily),
}

impl FontSource {
    /// Metrics for the given weight.
    pub fn metrics(&self, weight: FontWeight) -> FontMetrics {
        match (self, weight) {
            (Self::Builtin, weight) => FontMetrics::helvetica(weight),
            (Self::TrueType(family), FontWeight::Regular) => family.regular_metrics.clone(),
            (Self::TrueType(family), FontWeight::Bold) => family.bold_metrics.clone(),
        }
    }
}

fn font_directory_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.iter().any(|existing| existing == &candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = configured {
        push(path.to_path_buf());
    }

    if let Some(path) = env::var_os(FONTS_DIR_ENV) {
        if !path.is_empty() {
            push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }

    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

    candidates
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    FONT_FILES
        .iter()
        .copied()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

fn resolve_font_directory(configured: Option<&Path>) -> Result<PathBuf, FontError> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(configured) {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    let summary = if attempts.is_empty() {
        "no search paths were available".to_owned()
    } else {
        attempts.join(", ")
    };
    Err(FontError::NotFound(summary))
}

fn load_face(directory: &Path, file: &str) -> Result<(Vec<u8>, FontMetrics), FontError> {
    let path = directory.join(file);
    let data = std::fs::read(&path).map_err(|source| FontError::Io {
        path: path.clone(),
        source,
    })?;
    let metrics = FontMetrics::from_truetype(&data).map_err(|source| FontError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((data, metrics))
}

/// Loads the TrueType family from the first directory that contains every required file.
pub fn load_truetype_family(configured: Option<&Path>) -> Result<TrueTypeFamily, FontError> {
    let directory = resolve_font_directory(configured)?;
    let (regular, regular_metrics) = load_face(&directory, REGULAR_FILE)?;
    let (bold, bold_metrics) = load_face(&directory, BOLD_FILE)?;
    debug!(
        "Loaded '{}' font family from {}",
        DEFAULT_FONT_FAMILY_NAME,
        directory.display()
    );

    Ok(TrueTypeFamily {
        directory,
        regular,
        bold,
        regular_metrics,
        bold_metrics,
    })
}

/// Returns the TrueType family if one can be found and falls back to built-in Helvetica when
/// none is installed.
///
/// Files that exist but cannot be read or parsed are reported as errors rather than silently
/// replaced.
pub fn default_font_source(configured: Option<&Path>) -> Result<FontSource, FontError> {
    match load_truetype_family(configured) {
        Ok(family) => Ok(FontSource::TrueType(family)),
        Err(FontError::NotFound(summary)) => {
            warn!(
                "TrueType fonts unavailable ({}); falling back to built-in Helvetica.",
                summary
            );
            Ok(FontSource::Builtin)
        }
        Err(err) => Err(err),
    }
}

/// Indicates whether a complete TrueType family can be found on disk.
pub fn truetype_fonts_available(configured: Option<&Path>) -> bool {
    resolve_font_directory(configured).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths_match_afm() {
        let regular = FontMetrics::helvetica(FontWeight::Regular);
        assert_eq!(regular.char_width(' '), 278);
        assert_eq!(regular.char_width('W'), 944);
        assert_eq!(regular.char_width('i'), 222);
        assert_eq!(regular.char_width('~'), 584);

        let bold = FontMetrics::helvetica(FontWeight::Bold);
        assert_eq!(bold.char_width('i'), 278);
        assert_eq!(bold.char_width('m'), 889);
    }

    #[test]
    fn accented_letters_use_base_width() {
        let regular = FontMetrics::helvetica(FontWeight::Regular);
        assert_eq!(regular.char_width('é'), regular.char_width('e'));
        assert_eq!(regular.char_width('Î'), regular.char_width('I'));
        assert_eq!(regular.char_width('—'), 1000);
    }

    #[test]
    fn text_width_scales_with_size() {
        let regular = FontMetrics::helvetica(FontWeight::Regular);
        let ten = regular.text_width("Panneau", 10.0);
        let twenty = regular.text_width("Panneau", 20.0);
        assert!((twenty - 2.0 * ten).abs() < 1e-9);
        // 'W' at 72pt spans 0.944 inch.
        assert!((regular.text_width("W", 72.0) - 0.944 * 25.4).abs() < 1e-9);
        assert_eq!(regular.text_width("", 12.0), 0.0);
    }

    #[test]
    fn missing_directory_is_reported() {
        if truetype_fonts_available(None) {
            return;
        }
        let missing = Path::new("/__solar_report_missing_fonts__");
        let err = resolve_font_directory(Some(missing)).unwrap_err();
        let FontError::NotFound(summary) = err else {
            panic!("expected NotFound");
        };
        assert!(summary.contains("/__solar_report_missing_fonts__ (directory missing)"));
    }

    #[test]
    fn garbage_font_is_a_parse_error() {
        assert!(FontMetrics::from_truetype(b"not a font").is_err());
    }
}
