//! File names for generated reports.

use chrono::{DateTime, TimeZone};

use crate::format::{format_date, sanitize_filename, DEFAULT_FILENAME_COMPONENT_LEN};
use crate::report::ReportMode;

const FALLBACK_LOCATION: &str = "calcul";

/// Builds `{prefix}-{dd-mm-yyyy}-{location}-{unix millis}.pdf`.
///
/// The location is sanitised; when it is absent or sanitises to nothing, `calcul` is used. The
/// millisecond timestamp keeps repeated downloads on the same day apart.
pub fn report_filename<Tz: TimeZone>(
    mode: ReportMode,
    location: Option<&str>,
    now: &DateTime<Tz>,
) -> String {
    let date = format_date(now).replace('/', "-");
    let location = location
        .map(|text| sanitize_filename(text, DEFAULT_FILENAME_COMPONENT_LEN))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| FALLBACK_LOCATION.to_owned());

    format!(
        "{}-{}-{}-{}.pdf",
        mode.filename_prefix(),
        date,
        location,
        now.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).expect("timestamp")
    }

    #[test]
    fn full_report_name() {
        let now = at("2024-03-15T10:30:00+03:00");
        assert_eq!(
            report_filename(ReportMode::Full, Some("Antananarivo"), &now),
            "dimensionnement-solaire-15-03-2024-antananarivo-1710487800000.pdf"
        );
    }

    #[test]
    fn quick_report_name_and_fallback() {
        let now = at("2024-03-15T10:30:00+03:00");
        let name = report_filename(ReportMode::Quick, None, &now);
        assert_eq!(name, "dimensionnement-15-03-2024-calcul-1710487800000.pdf");

        let blank = report_filename(ReportMode::Quick, Some("  ---  "), &now);
        assert_eq!(blank, name);
    }

    #[test]
    fn location_is_sanitised() {
        let now = at("2024-01-02T08:00:00Z");
        let name = report_filename(ReportMode::Full, Some("Île Sainte-Marie, Analanjirofo"), &now);
        assert_eq!(
            name,
            format!(
                "dimensionnement-solaire-02-01-2024-ile-sainte-marie-ana-{}.pdf",
                now.timestamp_millis()
            )
        );
    }

    #[test]
    fn timestamps_keep_names_apart() {
        let first = Utc::now();
        let second = first + chrono::Duration::milliseconds(1);
        assert_ne!(
            report_filename(ReportMode::Full, Some("Toamasina"), &first),
            report_filename(ReportMode::Full, Some("Toamasina"), &second)
        );
    }
}
