//! Core entry point for the solar_report crate.
//!
//! Turns the result of a photovoltaic sizing computation into a PDF report: a header, one
//! striped table per section and a footer on every page. [`ReportGenerator`] is the usual way in;
//! [`render_pdf`] renders without saving, and [`ReportAssembler`] lays a report out on any
//! [`Surface`].

pub mod auth;
pub mod busy;
pub mod config;
pub mod error;
pub mod filename;
pub mod fonts;
pub mod format;
pub mod generator;
pub mod layout;
pub mod model;
pub mod notify;
pub mod pdf;
pub mod report;
pub mod sample;
pub mod sink;
pub mod surface;
pub mod table;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use config::{ReportConfig, TruncationPolicy};
pub use error::ReportError;
pub use generator::{render_pdf, GeneratedReport, ReportGenerator};
pub use model::{ReportInput, SizingParameters, SizingResult};
pub use report::{AssembledReport, ReportAssembler, ReportMode};
pub use surface::Surface;
