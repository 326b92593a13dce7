use chrono::{DateTime, FixedOffset};
use pretty_assertions::assert_eq;

use solar_report::format::format_price;
use solar_report::model::{EquipmentSlot, RecommendedEquipment, RequiredField, ValidationError};
use solar_report::notify::{CollectingNotifier, NoticeLevel};
use solar_report::report::{equipment_table, EQUIPMENT_SECTION, QUICK_SECTION, TOPOLOGY_SECTION};
use solar_report::sample::{sample_equipment, sample_input, sample_parameters};
use solar_report::sink::MemorySink;
use solar_report::surface::{DrawOp, RecordingSurface};
use solar_report::{
    ReportAssembler, ReportConfig, ReportError, ReportGenerator, ReportInput, ReportMode,
    SizingParameters, SizingResult,
};

fn generated_at() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-15T10:30:00+03:00").expect("timestamp")
}

fn config() -> ReportConfig {
    ReportConfig::default().with_embedded_fonts(false)
}

fn generator() -> ReportGenerator<CollectingNotifier, MemorySink> {
    ReportGenerator::new(config(), CollectingNotifier::new(), MemorySink::new())
}

fn assemble(input: &ReportInput, mode: ReportMode) -> Result<RecordingSurface, ValidationError> {
    let config = config();
    let mut surface = RecordingSurface::a4();
    ReportAssembler::new(&config).assemble(&mut surface, input, mode, &generated_at())?;
    Ok(surface)
}

fn without(params: &SizingParameters, fields: &[RequiredField]) -> SizingParameters {
    let mut params = params.clone();
    for field in fields {
        match field {
            RequiredField::DailyEnergy => params.daily_energy_wh = None,
            RequiredField::PeakPower => params.peak_power_w = None,
            RequiredField::AutonomyDays => params.autonomy_days = None,
            RequiredField::BatteryVoltage => params.battery_voltage_v = None,
            RequiredField::Irradiation => params.irradiation = None,
        }
    }
    params
}

#[test]
fn full_report_for_a_complete_sizing() {
    let generator = generator();
    let report = generator
        .generate_at(&sample_input(), ReportMode::Full, &generated_at())
        .expect("generated");

    assert!(report
        .filename
        .starts_with("dimensionnement-solaire-15-03-2024-antananarivo-"));
    assert!(report.filename.ends_with(".pdf"));
    assert!(report.sections.len() >= 3);
    assert_eq!(generator.sink().files().len(), 1);

    let levels: Vec<NoticeLevel> = generator
        .notifier()
        .notices()
        .into_iter()
        .map(|notice| notice.level)
        .collect();
    assert_eq!(
        levels,
        vec![NoticeLevel::Info, NoticeLevel::Success, NoticeLevel::Info]
    );
}

#[test]
fn missing_irradiation_is_rejected_before_saving() {
    let input = ReportInput::new(
        solar_report::sample::sample_result(),
        without(&sample_parameters(), &[RequiredField::Irradiation]),
    );
    let generator = generator();

    let err = generator
        .generate_at(&input, ReportMode::Full, &generated_at())
        .unwrap_err();
    assert!(matches!(
        err,
        ReportError::Validation(ValidationError::MissingFields(ref fields))
            if fields == &[RequiredField::Irradiation]
    ));
    assert!(generator.sink().is_empty());

    let notices = generator.notifier().notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("H_solaire"));
}

#[test]
fn every_missing_field_combination_draws_nothing() {
    let complete = sample_parameters();
    for mask in 1u32..32 {
        let fields: Vec<RequiredField> = RequiredField::ALL
            .into_iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, field)| field)
            .collect();
        let input = ReportInput::new(
            solar_report::sample::sample_result(),
            without(&complete, &fields),
        );

        for mode in [ReportMode::Full, ReportMode::Quick] {
            let config = config();
            let mut surface = RecordingSurface::a4();
            let outcome =
                ReportAssembler::new(&config).assemble(&mut surface, &input, mode, &generated_at());
            assert_eq!(
                outcome.unwrap_err(),
                ValidationError::MissingFields(fields.clone()),
                "mask {mask:#07b}"
            );
            assert!(surface.ops().is_empty(), "mask {mask:#07b} drew something");
        }

        let generator = generator();
        assert!(generator
            .generate_at(&input, ReportMode::Full, &generated_at())
            .is_err());
        assert!(generator.sink().is_empty());
        assert!(!generator.busy().is_busy());
    }
}

#[test]
fn missing_cable_leaves_four_equipment_rows() {
    let mut input = sample_input();
    if let Some(equipment) = input
        .result
        .as_mut()
        .and_then(|result| result.equipment.as_mut())
    {
        equipment.cable = None;
    }

    let config = config();
    let mut surface = RecordingSurface::a4();
    let report = ReportAssembler::new(&config)
        .assemble(&mut surface, &input, ReportMode::Full, &generated_at())
        .expect("assembled");

    let equipment = report.section(EQUIPMENT_SECTION).expect("equipment section");
    assert_eq!(equipment.rows, 4);
    assert!(!surface.texts().any(|text| text.starts_with("Câble")));
    assert!(report.section(TOPOLOGY_SECTION).is_some());
}

fn keep_slots(equipment: &RecommendedEquipment, slots: &[EquipmentSlot]) -> RecommendedEquipment {
    let pick = |slot: EquipmentSlot| {
        if slots.contains(&slot) {
            equipment.slot(slot).cloned()
        } else {
            None
        }
    };
    RecommendedEquipment {
        panel: pick(EquipmentSlot::Panel),
        battery: pick(EquipmentSlot::Battery),
        regulator: pick(EquipmentSlot::Regulator),
        inverter: pick(EquipmentSlot::Inverter),
        cable: pick(EquipmentSlot::Cable),
    }
}

#[test]
fn every_equipment_combination_lists_only_filled_slots() {
    let complete = sample_equipment();
    for mask in 0u32..32 {
        let slots: Vec<EquipmentSlot> = EquipmentSlot::ALL
            .into_iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, slot)| slot)
            .collect();
        let mut input = sample_input();
        if let Some(result) = input.result.as_mut() {
            result.equipment = Some(keep_slots(&complete, &slots));
        }

        let validated = input.validate().expect("valid input");
        let labels: Vec<String> = equipment_table(validated)
            .map(|table| table.rows.iter().map(|row| row[0].clone()).collect())
            .unwrap_or_default();
        let expected: Vec<String> = slots.iter().map(|slot| slot.label().to_owned()).collect();
        assert_eq!(labels, expected, "mask {mask:#07b}");

        let config = config();
        let mut surface = RecordingSurface::a4();
        let report = ReportAssembler::new(&config)
            .assemble(&mut surface, &input, ReportMode::Full, &generated_at())
            .expect("assembled");
        let section = report.section(EQUIPMENT_SECTION);
        assert_eq!(section.is_some(), !slots.is_empty(), "mask {mask:#07b}");
        if let Some(section) = section {
            assert_eq!(section.rows, slots.len(), "mask {mask:#07b}");
        }
    }
}

#[test]
fn quick_report_from_headline_figures_only() {
    let input = ReportInput::new(
        SizingResult {
            total_power_w: Some(820.0),
            total_cost: Some(6_687_500.0),
            panel_count: Some(2),
            battery_count: Some(4),
            ..SizingResult::default()
        },
        sample_parameters(),
    );
    let generator = generator();
    let report = generator
        .generate_at(&input, ReportMode::Quick, &generated_at())
        .expect("generated");

    assert!(report.filename.starts_with("dimensionnement-15-03-2024-"));
    assert!(!report.filename.starts_with("dimensionnement-solaire"));
    assert_eq!(report.sections.len(), 1);
    assert_eq!(report.sections[0].title, QUICK_SECTION);
    assert_eq!(report.sections[0].rows, 4);

    let surface = assemble(&input, ReportMode::Quick).expect("assembled");
    let texts: Vec<&str> = surface.texts().collect();
    for expected in [
        "Élément",
        "Valeur",
        "Puissance totale",
        "820.0 W",
        "6 687 500 Ar",
        "Panneaux nécessaires",
        "Batteries nécessaires",
    ] {
        assert!(texts.contains(&expected), "missing {expected:?} in {texts:?}");
    }
}

#[test]
fn prices_are_grouped_by_thousands() {
    assert_eq!(format_price(1_234_567.0), "1 234 567 Ar");
}

#[test]
fn assembling_twice_draws_the_same_operations() {
    for mode in [ReportMode::Full, ReportMode::Quick] {
        let first = assemble(&sample_input(), mode).expect("first").into_ops();
        let second = assemble(&sample_input(), mode).expect("second").into_ops();
        assert_eq!(first, second);
    }
}

#[test]
fn content_never_reaches_the_footer_band() {
    let config = config();
    let surface = assemble(&sample_input(), ReportMode::Full).expect("assembled");
    let footer_top = config.page_height - config.footer_reserve;

    for op in surface.ops() {
        if let DrawOp::FillRect { rect, .. } = op {
            assert!(
                rect.y + rect.height <= footer_top + f64::EPSILON,
                "{op:?} overlaps the footer"
            );
        }
    }
}

#[test]
fn footer_numbers_every_page() {
    let surface = assemble(&sample_input(), ReportMode::Full).expect("assembled");
    let pages = surface
        .ops()
        .iter()
        .map(DrawOp::page)
        .max()
        .expect("something drawn");
    for page in 1..=pages {
        let label = format!("Page {} / {}", page, pages);
        assert!(
            surface.ops().iter().any(|op| matches!(
                op,
                DrawOp::Text { page: p, text, .. } if *p == page && *text == label
            )),
            "missing {label}"
        );
    }
}
