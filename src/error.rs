//! Error types shared by the report pipeline.

use thiserror::Error;

use crate::fonts::FontError;
use crate::model::ValidationError;

/// Errors produced while generating a sizing report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Required input or result data is missing. Nothing was drawn or saved.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The drawing backend failed while building or serialising the document.
    #[error("PDF rendering failed: {0}")]
    Rendering(String),

    /// A discovered font family could not be loaded or embedded.
    #[error("font error: {0}")]
    Font(#[from] FontError),

    /// The section outline could not be written into the rendered document.
    #[cfg(feature = "bookmarks")]
    #[error("failed to embed section bookmarks: {0}")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),

    /// The finished document could not be handed to the sink.
    #[error("failed to save {filename}: {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub(crate) fn rendering(err: impl std::fmt::Display) -> Self {
        Self::Rendering(err.to_string())
    }

    /// Returns `true` when the failure was detected before any drawing started.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Message shown to the end user for this failure.
    ///
    /// Validation failures name what is missing; every other failure is
    /// reported generically with the underlying cause appended.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            other => format!("Erreur lors de la génération du PDF : {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequiredField;

    #[test]
    fn validation_message_lists_missing_fields() {
        let err = ReportError::from(ValidationError::MissingFields(vec![
            RequiredField::PeakPower,
            RequiredField::Irradiation,
        ]));
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Données manquantes: P_max, H_solaire");
    }

    #[test]
    fn rendering_message_is_generic() {
        let err = ReportError::rendering("layer vanished");
        assert!(!err.is_validation());
        assert_eq!(
            err.user_message(),
            "Erreur lors de la génération du PDF : PDF rendering failed: layer vanished"
        );
    }
}
