//! A complete sizing for a small off-grid home near Antananarivo.
//!
//! Used by the `sample` command of the CLI and throughout the tests.

use crate::model::{
    EquipmentDetail, RecommendedEquipment, ReportInput, SelectionPriority, SizingParameters,
    SizingResult,
};

pub fn sample_parameters() -> SizingParameters {
    SizingParameters {
        daily_energy_wh: Some(1520.0),
        peak_power_w: Some(400.0),
        autonomy_days: Some(3.0),
        battery_voltage_v: Some(24.0),
        irradiation: Some(4.5),
        location: Some("Antananarivo".to_owned()),
        roof_height_m: Some(6.0),
        priority: Some(SelectionPriority::Cout),
    }
}

fn equipment(model: &str, reference: &str, brand: &str, unit_price: f64) -> EquipmentDetail {
    EquipmentDetail {
        model: Some(model.to_owned()),
        reference: Some(reference.to_owned()),
        brand: Some(brand.to_owned()),
        unit_price: Some(unit_price),
        currency: Some("MGA".to_owned()),
        ..EquipmentDetail::default()
    }
}

pub fn sample_equipment() -> RecommendedEquipment {
    RecommendedEquipment {
        panel: Some(EquipmentDetail {
            power_w: Some(410.0),
            vmp_v: Some(31.4),
            voc_v: Some(37.9),
            ..equipment("Mono 410", "PV-M410", "Sunlux", 450_000.0)
        }),
        battery: Some(EquipmentDetail {
            capacity_ah: Some(200.0),
            nominal_voltage_v: Some(12.0),
            ..equipment("Gel 200", "BAT-G200", "Voltra", 1_200_000.0)
        }),
        regulator: Some(EquipmentDetail {
            nominal_voltage_v: Some(24.0),
            ampacity_a: Some(40.0),
            ..equipment("MPPT 40A", "REG-M40", "Voltra", 350_000.0)
        }),
        inverter: Some(EquipmentDetail {
            power_w: Some(1000.0),
            nominal_voltage_v: Some(24.0),
            ..equipment("Pur Sinus 1000", "OND-1000", "Sunlux", 600_000.0)
        }),
        cable: Some(EquipmentDetail {
            section_mm2: Some(6.0),
            ampacity_a: Some(41.0),
            ..equipment("Câble solaire 6 mm²", "CAB-6", "Filtech", 2_500.0)
        }),
    }
}

pub fn sample_result() -> SizingResult {
    SizingResult {
        total_power_w: Some(820.0),
        battery_capacity_ah: Some(400.0),
        annual_energy_wh: Some(554_800.0),
        total_cost: Some(6_687_500.0),
        panel_count: Some(2),
        battery_count: Some(4),
        equipment: Some(sample_equipment()),
        pv_series: Some(1),
        pv_parallel: Some(2),
        pv_topology: Some("1S2P".to_owned()),
        battery_series: Some(2),
        battery_parallel: Some(2),
        battery_topology: Some("2S2P".to_owned()),
        cable_length_m: Some(15.0),
        cable_price: Some(37_500.0),
        sizing_id: Some(42),
    }
}

pub fn sample_input() -> ReportInput {
    ReportInput::new(sample_result(), sample_parameters())
}
