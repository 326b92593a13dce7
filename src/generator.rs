//! The top-level "generate report" call.
//!
//! [`ReportGenerator`] ties the pieces together: it holds the busy indicator for the duration of
//! the call, validates the input, renders into a [`PdfSurface`], names the file, hands it to a
//! [`ReportSink`] and tells the user about every outcome through a [`Notifier`]. Failures never
//! escape as panics and the file is only saved once the whole document has been rendered.

use chrono::{DateTime, Local, TimeZone};
use log::{debug, error, info};

use crate::busy::BusyIndicator;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::filename::report_filename;
use crate::fonts::{default_font_source, FontSource};
use crate::model::ReportInput;
use crate::notify::Notifier;
use crate::pdf::PdfSurface;
use crate::report::{AssembledReport, ReportAssembler, ReportMode, SectionPlacement};
use crate::sink::ReportSink;

pub const GENERATING_NOTICE: &str = "Génération du rapport PDF en cours...";
pub const FULL_SUCCESS_NOTICE: &str = "Rapport PDF téléchargé avec succès !";
pub const QUICK_SUCCESS_NOTICE: &str = "PDF téléchargé !";
pub const QUICK_FAILURE_NOTICE: &str = "Erreur lors de la génération du PDF";

const BUSY_LABEL: &str = "Génération du rapport PDF";

/// A report that was rendered and saved.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mode: ReportMode,
    pub sections: Vec<SectionPlacement>,
    pub pages: usize,
}

/// Renders a report into PDF bytes without saving it.
///
/// `input` is validated before anything is drawn.
pub fn render_pdf<Tz: TimeZone>(
    input: &ReportInput,
    mode: ReportMode,
    config: &ReportConfig,
    now: &DateTime<Tz>,
) -> Result<(Vec<u8>, AssembledReport), ReportError> {
    input.validate()?;

    let fonts = if config.embed_fonts {
        default_font_source(config.fonts_dir.as_deref())?
    } else {
        FontSource::Builtin
    };

    let mut surface = PdfSurface::new(mode.title(), config, &fonts)?;
    let report = ReportAssembler::new(config).assemble(&mut surface, input, mode, now)?;
    let bytes = surface.finish()?;
    let bytes = with_bookmarks(bytes, &report, config)?;
    debug!(
        "Rendered {:?} report: {} bytes, {} page(s)",
        mode,
        bytes.len(),
        report.pages
    );
    Ok((bytes, report))
}

#[cfg(feature = "bookmarks")]
fn with_bookmarks(
    bytes: Vec<u8>,
    report: &AssembledReport,
    config: &ReportConfig,
) -> Result<Vec<u8>, ReportError> {
    if !config.bookmarks || report.mode == ReportMode::Quick {
        return Ok(bytes);
    }
    Ok(crate::bookmarks::apply_section_bookmarks(
        &bytes,
        &report.sections,
    )?)
}

#[cfg(not(feature = "bookmarks"))]
fn with_bookmarks(
    bytes: Vec<u8>,
    _report: &AssembledReport,
    _config: &ReportConfig,
) -> Result<Vec<u8>, ReportError> {
    Ok(bytes)
}

/// Generates reports and reports every outcome to the user.
pub struct ReportGenerator<N, K> {
    config: ReportConfig,
    notifier: N,
    sink: K,
    busy: BusyIndicator,
}

impl<N: Notifier, K: ReportSink> ReportGenerator<N, K> {
    pub fn new(config: ReportConfig, notifier: N, sink: K) -> Self {
        Self {
            config,
            notifier,
            sink,
            busy: BusyIndicator::new(),
        }
    }

    /// Shares an existing busy indicator instead of a private one.
    pub fn with_busy_indicator(mut self, busy: BusyIndicator) -> Self {
        self.busy = busy;
        self
    }

    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Generates and saves the full report.
    pub fn generate(&self, input: &ReportInput) -> Result<GeneratedReport, ReportError> {
        self.generate_at(input, ReportMode::Full, &Local::now())
    }

    /// Generates and saves the one-table summary report.
    pub fn generate_quick(&self, input: &ReportInput) -> Result<GeneratedReport, ReportError> {
        self.generate_at(input, ReportMode::Quick, &Local::now())
    }

    /// Generates and saves a report dated `now`.
    ///
    /// Every outcome is also sent to the notifier; the returned error is the same failure the
    /// user was told about.
    pub fn generate_at<Tz: TimeZone>(
        &self,
        input: &ReportInput,
        mode: ReportMode,
        now: &DateTime<Tz>,
    ) -> Result<GeneratedReport, ReportError> {
        let _busy = self.busy.acquire(Some(BUSY_LABEL));

        if let Err(err) = input.validate() {
            self.notifier.error(&err.to_string());
            return Err(err.into());
        }
        if mode == ReportMode::Full {
            self.notifier.info(GENERATING_NOTICE);
        }

        match self.render_and_save(input, mode, now) {
            Ok(report) => {
                match mode {
                    ReportMode::Full => {
                        self.notifier.success(FULL_SUCCESS_NOTICE);
                        self.notifier
                            .info(&format!("Nom du fichier : {}", report.filename));
                    }
                    ReportMode::Quick => self.notifier.success(QUICK_SUCCESS_NOTICE),
                }
                info!("Generated {}", report.filename);
                Ok(report)
            }
            Err(err) => {
                error!("Erreur lors de la génération du PDF: {}", err);
                match mode {
                    ReportMode::Full => self.notifier.error(&err.user_message()),
                    ReportMode::Quick => self.notifier.error(QUICK_FAILURE_NOTICE),
                }
                Err(err)
            }
        }
    }

    fn render_and_save<Tz: TimeZone>(
        &self,
        input: &ReportInput,
        mode: ReportMode,
        now: &DateTime<Tz>,
    ) -> Result<GeneratedReport, ReportError> {
        let (bytes, report) = render_pdf(input, mode, &self.config, now)?;
        let location = input
            .input_data
            .as_ref()
            .and_then(|params| params.location());
        let filename = report_filename(mode, location, now);

        self.sink
            .save(&filename, &bytes)
            .map_err(|source| ReportError::Save {
                filename: filename.clone(),
                source,
            })?;

        Ok(GeneratedReport {
            filename,
            bytes,
            mode,
            sections: report.sections,
            pages: report.pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{CollectingNotifier, Notice, NoticeLevel};
    use crate::sample::{sample_parameters, sample_result};
    use crate::sink::MemorySink;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;
    use std::io;

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn save(&self, _filename: &str, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-15T10:30:00+03:00").expect("timestamp")
    }

    fn config() -> ReportConfig {
        ReportConfig::default().with_embedded_fonts(false)
    }

    fn notice(level: NoticeLevel, message: &str) -> Notice {
        Notice {
            level,
            message: message.to_owned(),
        }
    }

    #[test]
    fn full_generation_notifies_and_saves() {
        let generator = ReportGenerator::new(config(), CollectingNotifier::new(), MemorySink::new());
        let input = ReportInput::new(sample_result(), sample_parameters());

        let report = generator
            .generate_at(&input, ReportMode::Full, &now())
            .expect("generated");
        assert_eq!(
            report.filename,
            "dimensionnement-solaire-15-03-2024-antananarivo-1710487800000.pdf"
        );
        assert!(report.bytes.starts_with(b"%PDF-"));
        assert_eq!(report.sections.len(), 4);

        assert_eq!(
            generator.notifier().notices(),
            vec![
                notice(NoticeLevel::Info, GENERATING_NOTICE),
                notice(NoticeLevel::Success, FULL_SUCCESS_NOTICE),
                notice(NoticeLevel::Info, &format!("Nom du fichier : {}", report.filename)),
            ]
        );
        assert_eq!(generator.sink().files()[0].0, report.filename);
        assert!(!generator.busy().is_busy());
    }

    #[test]
    fn quick_generation_has_short_notices() {
        let generator = ReportGenerator::new(config(), CollectingNotifier::new(), MemorySink::new());
        let input = ReportInput::new(sample_result(), sample_parameters());

        let report = generator
            .generate_at(&input, ReportMode::Quick, &now())
            .expect("generated");
        assert!(report.filename.starts_with("dimensionnement-15-03-2024-"));
        assert_eq!(
            generator.notifier().notices(),
            vec![notice(NoticeLevel::Success, QUICK_SUCCESS_NOTICE)]
        );
    }

    #[test]
    fn invalid_input_saves_nothing() {
        let generator = ReportGenerator::new(config(), CollectingNotifier::new(), MemorySink::new());
        let err = generator
            .generate_at(&ReportInput::default(), ReportMode::Full, &now())
            .unwrap_err();

        assert!(err.is_validation());
        assert!(generator.sink().is_empty());
        assert_eq!(
            generator.notifier().notices(),
            vec![notice(
                NoticeLevel::Error,
                "Données incomplètes pour la génération du PDF"
            )]
        );
        assert!(!generator.busy().is_busy());
    }

    #[test]
    fn save_failure_is_reported_generically() {
        let generator = ReportGenerator::new(config(), CollectingNotifier::new(), FailingSink);
        let input = ReportInput::new(sample_result(), sample_parameters());

        let err = generator
            .generate_at(&input, ReportMode::Full, &now())
            .unwrap_err();
        assert!(matches!(err, ReportError::Save { .. }));

        let notices = generator.notifier().notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].level, NoticeLevel::Error);
        assert!(notices[1]
            .message
            .starts_with("Erreur lors de la génération du PDF : failed to save"));
        assert!(!generator.busy().is_busy());
    }

    #[test]
    fn shared_busy_indicator_is_released() {
        let busy = BusyIndicator::new();
        let generator = ReportGenerator::new(config(), CollectingNotifier::new(), MemorySink::new())
            .with_busy_indicator(busy.clone());
        let input = ReportInput::new(sample_result(), sample_parameters());

        let _outer = busy.acquire(Some("page"));
        generator
            .generate_at(&input, ReportMode::Quick, &now())
            .expect("generated");
        assert_eq!(busy.outstanding(), 1);
    }
}
