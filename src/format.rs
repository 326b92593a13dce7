//! Display formatting for quantities, prices and dates.
//!
//! Every function is pure and returns [`PLACEHOLDER`] for missing or non-finite input instead of
//! failing, so table cells and headers can be filled without special-casing absent values. The
//! PDF variants only emit plain ASCII spaces as group separators because the built-in PDF fonts
//! have no glyph for the narrow no-break space used by the French locale.

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};

/// Text rendered in place of a missing value.
pub const PLACEHOLDER: &str = "—";

/// Default length limit applied by [`sanitize_filename`].
pub const DEFAULT_FILENAME_COMPONENT_LEN: usize = 20;

const NARROW_NO_BREAK_SPACE: char = '\u{202f}';

/// Currencies the sizing backend quotes equipment prices in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Currency {
    /// Malagasy ariary (`MGA`), the backend default.
    #[default]
    Ariary,
    /// Euro (`EUR`).
    Euro,
    /// US dollar (`USD`).
    UsDollar,
    /// Any other code, displayed verbatim.
    Other(String),
}

impl Currency {
    /// Resolves an ISO code or display symbol.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "" | "MGA" | "AR" | "ARIARY" => Self::Ariary,
            "EUR" | "€" => Self::Euro,
            "USD" | "$" => Self::UsDollar,
            _ => Self::Other(code.trim().to_owned()),
        }
    }

    /// Suffix appended to formatted amounts.
    pub fn suffix(&self) -> &str {
        match self {
            Self::Ariary => "Ar",
            Self::Euro => "€",
            Self::UsDollar => "$",
            Self::Other(code) => code,
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

fn grouped_fixed(value: f64, decimals: usize, separator: char, decimal_mark: char) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + 4);
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    out.push_str(&group_thousands(integer, separator));
    if let Some(fraction) = fraction {
        out.push(decimal_mark);
        out.push_str(fraction);
    }
    out
}

/// Formats a price in ariary: `1234567` becomes `1 234 567 Ar`.
pub fn format_price(amount: impl Into<Option<f64>>) -> String {
    format_price_in(amount, &Currency::Ariary)
}

/// Formats a price with space-grouped thousands and the currency's suffix.
///
/// Whole amounts are printed without decimals, anything else with two.
pub fn format_price_in(amount: impl Into<Option<f64>>, currency: &Currency) -> String {
    let Some(amount) = finite(amount.into()) else {
        return PLACEHOLDER.to_owned();
    };
    let decimals = if amount.fract() == 0.0 { 0 } else { 2 };
    format!(
        "{} {}",
        grouped_fixed(amount, decimals, ' ', '.'),
        currency.suffix()
    )
}

/// Formats an energy amount, switching to kWh from 1000 Wh upwards.
pub fn format_energy(wh: impl Into<Option<f64>>) -> String {
    let Some(wh) = finite(wh.into()) else {
        return PLACEHOLDER.to_owned();
    };
    if wh >= 1000.0 {
        format!("{:.1} kWh", wh / 1000.0)
    } else {
        let fixed = grouped_fixed(wh, 3, ' ', '.');
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        format!("{trimmed} Wh")
    }
}

/// On-screen variant of [`format_energy`] using the French decimal comma and narrow spaces.
pub fn format_energy_locale(wh: impl Into<Option<f64>>) -> String {
    let Some(wh) = finite(wh.into()) else {
        return PLACEHOLDER.to_owned();
    };
    if wh >= 1000.0 {
        format!(
            "{} kWh",
            grouped_fixed(wh / 1000.0, 1, NARROW_NO_BREAK_SPACE, ',')
        )
    } else {
        let fixed = grouped_fixed(wh, 3, NARROW_NO_BREAK_SPACE, ',');
        let trimmed = fixed.trim_end_matches('0').trim_end_matches(',');
        format!("{trimmed} Wh")
    }
}

/// Formats a power rating in whole watts, or kW/MW with one decimal.
pub fn format_power(watts: impl Into<Option<f64>>) -> String {
    let Some(watts) = finite(watts.into()) else {
        return PLACEHOLDER.to_owned();
    };
    if watts >= 1_000_000.0 {
        format!("{:.1} MW", watts / 1_000_000.0)
    } else if watts >= 1000.0 {
        format!("{:.1} kW", watts / 1000.0)
    } else {
        format!("{watts:.0} W")
    }
}

/// Formats a battery capacity.
pub fn format_capacity(ah: impl Into<Option<f64>>) -> String {
    with_unit(ah.into(), "Ah")
}

/// Formats a voltage.
pub fn format_voltage(volts: impl Into<Option<f64>>) -> String {
    with_unit(volts.into(), "V")
}

/// Formats a daily solar irradiation with one decimal.
pub fn format_irradiation(value: impl Into<Option<f64>>) -> String {
    match finite(value.into()) {
        Some(value) => format!("{value:.1} kWh/m²/j"),
        None => PLACEHOLDER.to_owned(),
    }
}

/// Formats a percentage with the given number of decimals.
pub fn format_percentage(value: impl Into<Option<f64>>, decimals: usize) -> String {
    match finite(value.into()) {
        Some(value) => format!("{value:.decimals$} %"),
        None => PLACEHOLDER.to_owned(),
    }
}

/// Formats a number with fixed decimals and space-grouped thousands.
pub fn format_number(value: impl Into<Option<f64>>, decimals: usize) -> String {
    match finite(value.into()) {
        Some(value) => grouped_fixed(value, decimals, ' ', '.'),
        None => PLACEHOLDER.to_owned(),
    }
}

/// Shortest faithful rendering of a number (`24`, `4.5`, `1520`).
pub fn format_plain(value: f64) -> String {
    if value == 0.0 {
        // avoids "-0"
        return "0".to_owned();
    }
    value.to_string()
}

fn with_unit(value: Option<f64>, unit: &str) -> String {
    match finite(value) {
        Some(value) => format!("{} {unit}", format_plain(value)),
        None => PLACEHOLDER.to_owned(),
    }
}

/// Formats a calendar date as `dd/mm/yyyy`.
pub fn format_date(date: &impl Datelike) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

/// Formats an ISO-8601 timestamp or plain `YYYY-MM-DD` date as `dd/mm/yyyy`.
///
/// Timestamps are converted to the local time zone first.
pub fn format_date_iso(text: &str) -> String {
    let text = text.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return format_date(&timestamp.with_timezone(&Local).date_naive());
    }
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => format_date(&date),
        Err(_) => PLACEHOLDER.to_owned(),
    }
}

/// Formats a wall-clock time as `HH:MM`.
pub fn format_time(time: &impl Timelike) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Maps an accented Latin letter onto its unaccented base letter.
pub(crate) fn fold_diacritic(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'æ' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Æ' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'œ' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Œ' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        other => other,
    }
}

/// Turns free text (typically a location) into a lowercase, dash-separated file name component.
///
/// Diacritics are folded to their base letter, every other run of non-alphanumeric characters
/// becomes a single `-`, and the result is cut to `max_len` characters without a trailing dash.
pub fn sanitize_filename(text: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars().map(fold_diacritic) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out.truncate(max_len);
    let trimmed = out.trim_end_matches('-').len();
    out.truncate(trimmed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};

    #[test]
    fn price_groups_thousands_with_plain_spaces() {
        assert_eq!(format_price(1_234_567.0), "1 234 567 Ar");
        assert_eq!(format_price(999.0), "999 Ar");
        assert_eq!(format_price(0.0), "0 Ar");
        assert_eq!(format_price(1500.5), "1 500.50 Ar");
        assert_eq!(format_price(-25_000.0), "-25 000 Ar");
    }

    #[test]
    fn price_uses_currency_suffix() {
        assert_eq!(
            format_price_in(1_234_567.0, &Currency::from_code("MGA")),
            "1 234 567 Ar"
        );
        assert_eq!(format_price_in(12.0, &Currency::from_code("eur")), "12 €");
        assert_eq!(format_price_in(12.0, &Currency::from_code("CHF")), "12 CHF");
    }

    #[test]
    fn missing_values_render_placeholder() {
        assert_eq!(format_price(None), PLACEHOLDER);
        assert_eq!(format_price(f64::NAN), PLACEHOLDER);
        assert_eq!(format_energy(None), PLACEHOLDER);
        assert_eq!(format_power(f64::INFINITY), PLACEHOLDER);
        assert_eq!(format_capacity(None), PLACEHOLDER);
        assert_eq!(format_number(None, 2), PLACEHOLDER);
    }

    #[test]
    fn energy_switches_to_kwh() {
        assert_eq!(format_energy(1520.0), "1.5 kWh");
        assert_eq!(format_energy(554_800.0), "554.8 kWh");
        assert_eq!(format_energy(950.0), "950 Wh");
        assert_eq!(format_energy(12.25), "12.25 Wh");
        assert_eq!(format_energy(-5000.0), "-5 000 Wh");
        assert_eq!(format_energy(-1_234_567.5), "-1 234 567.5 Wh");
        assert_eq!(format_energy(0.0), "0 Wh");
        assert_eq!(format_energy_locale(1520.0), "1,5 kWh");
        assert_eq!(format_energy_locale(12.5), "12,5 Wh");
        assert_eq!(format_energy_locale(1_234_500.0), "1\u{202f}234,5 kWh");
    }

    #[test]
    fn power_scales_units() {
        assert_eq!(format_power(400.0), "400 W");
        assert_eq!(format_power(399.6), "400 W");
        assert_eq!(format_power(1520.0), "1.5 kW");
        assert_eq!(format_power(2_500_000.0), "2.5 MW");
    }

    #[test]
    fn units_and_numbers() {
        assert_eq!(format_capacity(200.0), "200 Ah");
        assert_eq!(format_voltage(24.0), "24 V");
        assert_eq!(format_irradiation(4.5), "4.5 kWh/m²/j");
        assert_eq!(format_percentage(12.345, 1), "12.3 %");
        assert_eq!(format_number(1_234_567.891, 2), "1 234 567.89");
        assert_eq!(format_plain(4.5), "4.5");
        assert_eq!(format_plain(1520.0), "1520");
    }

    #[test]
    fn dates_use_french_order() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(&date), "07/03/2026");
        assert_eq!(format_date_iso("2026-03-07"), "07/03/2026");
        assert_eq!(format_date_iso("not a date"), PLACEHOLDER);

        let time = NaiveTime::from_hms_opt(9, 5, 59).unwrap();
        assert_eq!(format_time(&time), "09:05");
        let stamp = NaiveDateTime::new(date, time);
        assert_eq!(format_time(&stamp), "09:05");
    }

    #[test]
    fn sanitize_filename_folds_and_lowercases() {
        assert_eq!(sanitize_filename("Antananarivo", 20), "antananarivo");
        assert_eq!(sanitize_filename("Île Sainte-Marie", 20), "ile-sainte-marie");
        assert_eq!(
            sanitize_filename("Fianarantsoa, Madagascar", 20),
            "fianarantsoa-madagas"
        );
        assert_eq!(sanitize_filename("Toamasina / Est", 10), "toamasina");
        assert_eq!(sanitize_filename("  ?!  ", 20), "");
    }
}
