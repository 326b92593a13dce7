//! Report assembly: header, section tables and footer laid out on a [`Surface`].

use chrono::{DateTime, TimeZone};
use log::debug;

use crate::config::ReportConfig;
use crate::fonts::FontWeight;
use crate::format::{
    format_date, format_energy, format_number, format_plain, format_price, format_price_in,
    format_time, PLACEHOLDER,
};
use crate::layout::Cursor;
use crate::model::{
    EquipmentSlot, RecommendedEquipment, ReportInput, SelectionPriority, SizingResult,
    ValidatedInput, ValidationError,
};
use crate::surface::{Rgb, Surface};
use crate::table::{TableBuilder, TableSpec};

pub const FULL_TITLE: &str = "Rapport de Dimensionnement Photovoltaïque";
pub const FULL_SUBTITLE: &str = "Système solaire autonome";
pub const QUICK_TITLE: &str = "Rapport de Dimensionnement - Résumé";

pub const INPUT_SECTION: &str = "Données d'entrée";
pub const RESULTS_SECTION: &str = "Résultats du dimensionnement";
pub const EQUIPMENT_SECTION: &str = "Équipements recommandés";
pub const TOPOLOGY_SECTION: &str = "Topologies";
pub const QUICK_SECTION: &str = "Résumé";

const UNSPECIFIED_LOCATION: &str = "Non spécifiée";
const NOT_AVAILABLE: &str = "N/A";

const HEADER_BAND_HEIGHT: f64 = 5.0;
const QUICK_BAND_HEIGHT: f64 = 3.0;
const SECOND_COLUMN_X: f64 = 120.0;
const SECTION_GAP: f64 = 10.0;
const TITLE_TO_TABLE: f64 = 8.0;

/// Which report is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Header, every section table and a footer on each page.
    #[default]
    Full,
    /// Title block and a four-row summary table.
    Quick,
}

impl ReportMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Full => FULL_TITLE,
            Self::Quick => QUICK_TITLE,
        }
    }

    /// Leading component of generated file names.
    pub fn filename_prefix(self) -> &'static str {
        match self {
            Self::Full => "dimensionnement-solaire",
            Self::Quick => "dimensionnement",
        }
    }
}

/// Where a section ended up in the document.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionPlacement {
    /// Title as printed, numbering included.
    pub title: String,
    pub page: usize,
    /// y of the section title's top edge.
    pub top: f64,
    /// y below the section's table, trailing margin included.
    pub bottom: f64,
    /// Number of data rows in the section's table.
    pub rows: usize,
}

/// Summary of an assembled report.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledReport {
    pub mode: ReportMode,
    pub sections: Vec<SectionPlacement>,
    pub pages: usize,
}

impl AssembledReport {
    /// Finds a section by its unnumbered title.
    pub fn section(&self, name: &str) -> Option<&SectionPlacement> {
        self.sections
            .iter()
            .find(|section| section.title.ends_with(name))
    }
}

/// Lays reports out on a [`Surface`] according to a [`ReportConfig`].
pub struct ReportAssembler<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Validates `input` and draws the report for `mode`.
    ///
    /// Nothing is drawn when validation fails. `now` is printed as the report date.
    pub fn assemble<S, Tz>(
        &self,
        surface: &mut S,
        input: &ReportInput,
        mode: ReportMode,
        now: &DateTime<Tz>,
    ) -> Result<AssembledReport, ValidationError>
    where
        S: Surface + ?Sized,
        Tz: TimeZone,
    {
        let validated = input.validate()?;
        let sections = match mode {
            ReportMode::Full => self.full(surface, validated, now),
            ReportMode::Quick => self.quick(surface, validated, now),
        };
        debug!(
            "Assembled {:?} report: {} section(s) on {} page(s)",
            mode,
            sections.len(),
            surface.page_count()
        );
        Ok(AssembledReport {
            mode,
            sections,
            pages: surface.page_count(),
        })
    }

    fn full<S, Tz>(
        &self,
        surface: &mut S,
        input: ValidatedInput<'_>,
        now: &DateTime<Tz>,
    ) -> Vec<SectionPlacement>
    where
        S: Surface + ?Sized,
        Tz: TimeZone,
    {
        let palette = &self.config.palette;
        let header_bottom = self.header(surface, input, now);
        let mut cursor = Cursor::new(
            header_bottom,
            self.config.margin,
            self.config.content_bottom(),
        );

        let mut tables = vec![
            (INPUT_SECTION, palette.parameters, input_table(input)),
            (RESULTS_SECTION, palette.results, results_table(input.result)),
        ];
        if let Some(table) = equipment_table(input) {
            tables.push((EQUIPMENT_SECTION, palette.equipment, table));
        }
        if let Some(table) = topology_table(input.result) {
            tables.push((TOPOLOGY_SECTION, palette.topology, table));
        }

        let sections = tables
            .into_iter()
            .enumerate()
            .map(|(index, (name, color, table))| {
                let title = format!("{}. {}", index + 1, name);
                self.section(surface, &mut cursor, title, color, &table)
            })
            .collect();

        self.footers(surface, now);
        sections
    }

    fn header<S, Tz>(&self, surface: &mut S, input: ValidatedInput<'_>, now: &DateTime<Tz>) -> f64
    where
        S: Surface + ?Sized,
        Tz: TimeZone,
    {
        let palette = &self.config.palette;
        let margin = self.config.margin;
        let (width, _) = surface.page_size();

        surface.set_fill_color(palette.header_band);
        surface.fill_rect(0.0, 0.0, width, HEADER_BAND_HEIGHT);

        surface.set_font(18.0, FontWeight::Bold);
        surface.set_text_color(palette.title);
        surface.text(FULL_TITLE, margin, 25.0);

        surface.set_font(12.0, FontWeight::Bold);
        surface.set_text_color(palette.subtitle);
        surface.text(FULL_SUBTITLE, margin, 35.0);

        surface.set_draw_color(palette.rule);
        surface.line(margin, 38.0, width - margin, 38.0);

        surface.set_font(10.0, FontWeight::Regular);
        surface.set_text_color(Rgb::BLACK);
        surface.text(
            &format!("Date du rapport: {}", format_date(now)),
            margin,
            48.0,
        );
        surface.text(
            &format!("Localisation: {}", display_location(input)),
            SECOND_COLUMN_X,
            48.0,
        );

        58.0
    }

    fn section<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        cursor: &mut Cursor,
        title: String,
        color: Rgb,
        table: &TableSpec,
    ) -> SectionPlacement {
        let style = &self.config.table;
        let needed = SECTION_GAP + TITLE_TO_TABLE + table.height(style) + style.trailing_margin;
        cursor.ensure_space(surface, needed);

        let top = cursor.y();
        let title_y = top + SECTION_GAP;
        surface.set_font(14.0, FontWeight::Bold);
        surface.set_text_color(color);
        surface.text(&title, self.config.margin, title_y);

        let bottom = TableBuilder::new(style).draw_table(
            surface,
            self.config.margin,
            title_y + TITLE_TO_TABLE,
            table,
            color,
        );
        cursor.advance_to(bottom);

        SectionPlacement {
            title,
            page: surface.current_page(),
            top,
            bottom,
            rows: table.rows.len(),
        }
    }

    fn footers<S, Tz>(&self, surface: &mut S, now: &DateTime<Tz>)
    where
        S: Surface + ?Sized,
        Tz: TimeZone,
    {
        let palette = &self.config.palette;
        let margin = self.config.margin;
        let (width, height) = surface.page_size();
        let pages = surface.page_count();
        let generated = format!(
            "Date de génération: {} à {}",
            format_date(now),
            format_time(now)
        );

        for page in 1..=pages {
            surface.set_page(page);

            surface.set_draw_color(palette.rule);
            surface.line(margin, height - 30.0, width - margin, height - 30.0);

            surface.set_font(8.0, FontWeight::Regular);
            surface.set_text_color(palette.muted);
            surface.text(&self.config.attribution, margin, height - 20.0);
            surface.text(&generated, margin, height - 15.0);
            surface.text(
                &format!("Page {page} / {pages}"),
                width - 35.0,
                height - 15.0,
            );
        }
    }

    fn quick<S, Tz>(
        &self,
        surface: &mut S,
        input: ValidatedInput<'_>,
        now: &DateTime<Tz>,
    ) -> Vec<SectionPlacement>
    where
        S: Surface + ?Sized,
        Tz: TimeZone,
    {
        let palette = &self.config.palette;
        let margin = self.config.margin;
        let (width, _) = surface.page_size();

        surface.set_fill_color(palette.header_band);
        surface.fill_rect(0.0, 0.0, width, QUICK_BAND_HEIGHT);

        surface.set_font(16.0, FontWeight::Bold);
        surface.set_text_color(palette.title);
        surface.text(QUICK_TITLE, margin, 25.0);

        surface.set_font(10.0, FontWeight::Regular);
        surface.set_text_color(Rgb::BLACK);
        surface.text(&format!("Date: {}", format_date(now)), margin, 35.0);
        surface.text(
            &format!("Localisation: {}", display_location(input)),
            SECOND_COLUMN_X,
            35.0,
        );

        let table = quick_table(input.result);
        let top = 45.0;
        let bottom = TableBuilder::new(&self.config.table).draw_table(
            surface,
            margin,
            top,
            &table,
            palette.results,
        );

        vec![SectionPlacement {
            title: QUICK_SECTION.to_owned(),
            page: surface.current_page(),
            top,
            bottom,
            rows: table.rows.len(),
        }]
    }
}

fn display_location<'i>(input: ValidatedInput<'i>) -> &'i str {
    input.params.location().unwrap_or(UNSPECIFIED_LOCATION)
}

fn plain_or_zero(value: Option<f64>) -> String {
    format_plain(value.filter(|v| v.is_finite()).unwrap_or(0.0))
}

fn count(value: Option<u32>) -> String {
    value.unwrap_or(0).to_string()
}

/// Rows of the "Données d'entrée" section.
pub fn input_table(input: ValidatedInput<'_>) -> TableSpec {
    let params = input.params;
    let roof = params
        .roof_height_m
        .filter(|h| h.is_finite())
        .map_or_else(|| PLACEHOLDER.to_owned(), format_plain);
    let priority = params.priority.unwrap_or_default();

    TableSpec::new(["Paramètre", "Valeur", "Unité"], vec![80.0, 50.0, 40.0])
        .row([
            "Consommation journalière".to_owned(),
            plain_or_zero(params.daily_energy_wh),
            "Wh".to_owned(),
        ])
        .row([
            "Puissance maximale".to_owned(),
            plain_or_zero(params.peak_power_w),
            "W".to_owned(),
        ])
        .row([
            "Jours d'autonomie".to_owned(),
            plain_or_zero(params.autonomy_days),
            "jours".to_owned(),
        ])
        .row([
            "Tension batterie".to_owned(),
            plain_or_zero(params.battery_voltage_v),
            "V".to_owned(),
        ])
        .row([
            "Irradiation solaire".to_owned(),
            plain_or_zero(params.irradiation),
            "kWh/m²/j".to_owned(),
        ])
        .row(["Hauteur vers le toit".to_owned(), roof, "m".to_owned()])
        .row([
            "Stratégie de sélection",
            SelectionPriority::label(priority),
            PLACEHOLDER,
        ])
}

/// Rows of the "Résultats du dimensionnement" section.
///
/// The cost row leaves the unit column empty since the formatted price carries its currency.
pub fn results_table(result: &SizingResult) -> TableSpec {
    let decimal = |value: Option<f64>| format_number(value.unwrap_or(0.0), 1);

    TableSpec::new(["Élément", "Valeur", "Unité"], vec![80.0, 50.0, 40.0])
        .row([
            "Puissance totale".to_owned(),
            decimal(result.total_power_w),
            "W".to_owned(),
        ])
        .row([
            "Capacité batterie".to_owned(),
            decimal(result.battery_capacity_ah),
            "Ah".to_owned(),
        ])
        .row([
            "Bilan énergétique annuel".to_owned(),
            format_energy(result.annual_energy_wh.unwrap_or(0.0)),
            String::new(),
        ])
        .row([
            "Coût total estimé".to_owned(),
            format_price(result.total_cost.unwrap_or(0.0)),
            String::new(),
        ])
        .row([
            "Nombre de panneaux".to_owned(),
            count(result.panel_count),
            "unités".to_owned(),
        ])
        .row([
            "Nombre de batteries".to_owned(),
            count(result.battery_count),
            "unités".to_owned(),
        ])
}

/// Rows of the "Équipements recommandés" section, one per filled slot.
///
/// Returns `None` when the result recommends no equipment at all.
pub fn equipment_table(input: ValidatedInput<'_>) -> Option<TableSpec> {
    let result = input.result;
    let equipment: &RecommendedEquipment = result.equipment.as_ref()?;
    let cable_length = result.effective_cable_length(input.params);
    let cable_text = if cable_length > 0.0 {
        format!("{} m", format_plain(cable_length))
    } else {
        PLACEHOLDER.to_owned()
    };

    let mut table = TableSpec::new(
        ["Type", "Modèle", "Référence", "Specs", "Prix", "Qté"],
        vec![25.0, 35.0, 30.0, 25.0, 30.0, 25.0],
    );

    for (slot, detail) in equipment.present() {
        let watts = |fallback: &str| {
            detail
                .power_w
                .filter(|w| *w != 0.0 && w.is_finite())
                .map_or_else(|| fallback.to_owned(), |w| format!("{} W", format_plain(w)))
        };
        let unit_price = format_price_in(detail.unit_price.unwrap_or(0.0), &detail.currency());

        let (specs, price, quantity) = match slot {
            EquipmentSlot::Panel => (watts(NOT_AVAILABLE), unit_price, count(result.panel_count)),
            EquipmentSlot::Battery => (
                detail
                    .capacity_ah
                    .filter(|ah| *ah != 0.0 && ah.is_finite())
                    .map_or_else(
                        || NOT_AVAILABLE.to_owned(),
                        |ah| format!("{} Ah", format_plain(ah)),
                    ),
                unit_price,
                count(result.battery_count),
            ),
            EquipmentSlot::Regulator => (watts("MPPT / PWM"), unit_price, "1".to_owned()),
            EquipmentSlot::Inverter => (watts(NOT_AVAILABLE), unit_price, "1".to_owned()),
            EquipmentSlot::Cable => (
                cable_text.clone(),
                format_price_in(result.effective_cable_price(input.params), &detail.currency()),
                cable_text.clone(),
            ),
        };

        table.push_row([
            slot.label().to_owned(),
            detail.model.clone().unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            detail
                .reference
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
            specs,
            price,
            quantity,
        ]);
    }

    (!table.rows.is_empty()).then_some(table)
}

/// Rows of the "Topologies" section describing how panels and batteries are wired.
///
/// Returns `None` when the result carries no wiring information.
pub fn topology_table(result: &SizingResult) -> Option<TableSpec> {
    fn or_placeholder(value: Option<u32>) -> String {
        value.map_or_else(|| PLACEHOLDER.to_owned(), |v| v.to_string())
    }

    fn row(
        label: &str,
        topology: Option<&String>,
        series: Option<u32>,
        parallel: Option<u32>,
        total: Option<u32>,
    ) -> Vec<String> {
        let configuration = topology.cloned().unwrap_or_else(|| {
            format!("{}S{}P", or_placeholder(series), or_placeholder(parallel))
        });
        vec![
            label.to_owned(),
            configuration,
            or_placeholder(series),
            or_placeholder(parallel),
            or_placeholder(total),
        ]
    }

    let mut table = TableSpec::new(
        ["Type", "Configuration", "Série", "Parallèle", "Total"],
        vec![35.0, 45.0, 25.0, 25.0, 25.0],
    );
    if result.has_pv_topology() {
        table.push_row(row(
            "Panneaux PV",
            result.pv_topology.as_ref(),
            result.pv_series,
            result.pv_parallel,
            result.panel_count,
        ));
    }
    if result.has_battery_topology() {
        table.push_row(row(
            "Batteries",
            result.battery_topology.as_ref(),
            result.battery_series,
            result.battery_parallel,
            result.battery_count,
        ));
    }

    (!table.rows.is_empty()).then_some(table)
}

/// The four headline rows of the quick report.
pub fn quick_table(result: &SizingResult) -> TableSpec {
    TableSpec::new(["Élément", "Valeur"], vec![100.0, 70.0])
        .row([
            "Puissance totale".to_owned(),
            format!("{:.1} W", result.total_power_w.unwrap_or(0.0)),
        ])
        .row([
            "Coût total".to_owned(),
            format_price(result.total_cost.unwrap_or(0.0)),
        ])
        .row([
            "Panneaux nécessaires".to_owned(),
            count(result.panel_count),
        ])
        .row([
            "Batteries nécessaires".to_owned(),
            count(result.battery_count),
        ])
}
