//! Sizing inputs and results as exchanged with the sizing API.
//!
//! Field names follow the backend's JSON contract so payloads can be deserialised directly.
//! Every numeric field is optional at the type level: the report renders absent results as
//! zero or a placeholder, while the five required inputs are checked up front by
//! [`ReportInput::validate`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::Currency;

/// Equipment selection strategy requested from the sizing API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPriority {
    /// Cheapest installation.
    #[default]
    Cout,
    /// Fewest components.
    Quantite,
}

impl SelectionPriority {
    /// Label shown in the report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cout => "Coût minimal",
            Self::Quantite => "Nombre minimal",
        }
    }
}

/// Parameters the user submitted to the sizing computation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizingParameters {
    /// Daily consumption in Wh.
    #[serde(rename = "E_jour", default)]
    pub daily_energy_wh: Option<f64>,
    /// Peak power in W.
    #[serde(rename = "P_max", default)]
    pub peak_power_w: Option<f64>,
    /// Days of autonomy.
    #[serde(rename = "N_autonomie", default)]
    pub autonomy_days: Option<f64>,
    /// Battery bank voltage in V.
    #[serde(rename = "V_batterie", default)]
    pub battery_voltage_v: Option<f64>,
    /// Daily solar irradiation in kWh/m²/day.
    #[serde(rename = "H_solaire", default)]
    pub irradiation: Option<f64>,
    /// Free-text location.
    #[serde(rename = "localisation", default)]
    pub location: Option<String>,
    /// Height from the battery room to the roof in m.
    #[serde(rename = "H_vers_toit", default)]
    pub roof_height_m: Option<f64>,
    #[serde(rename = "priorite_selection", default)]
    pub priority: Option<SelectionPriority>,
}

impl SizingParameters {
    /// Location trimmed of surrounding whitespace, `None` when blank.
    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }

    /// Value of a required field, if present.
    pub fn required(&self, field: RequiredField) -> Option<f64> {
        match field {
            RequiredField::DailyEnergy => self.daily_energy_wh,
            RequiredField::PeakPower => self.peak_power_w,
            RequiredField::AutonomyDays => self.autonomy_days,
            RequiredField::BatteryVoltage => self.battery_voltage_v,
            RequiredField::Irradiation => self.irradiation,
        }
    }
}

/// One recommended catalogue item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDetail {
    #[serde(rename = "modele", default)]
    pub model: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(rename = "marque", alias = "brand", default)]
    pub brand: Option<String>,
    #[serde(rename = "puissance_W", default)]
    pub power_w: Option<f64>,
    #[serde(rename = "capacite_Ah", default)]
    pub capacity_ah: Option<f64>,
    #[serde(rename = "tension_nominale_V", default)]
    pub nominal_voltage_v: Option<f64>,
    /// Unit price; per metre for cables.
    #[serde(rename = "prix_unitaire", default)]
    pub unit_price: Option<f64>,
    #[serde(rename = "devise", default)]
    pub currency: Option<String>,
    #[serde(rename = "section_mm2", default)]
    pub section_mm2: Option<f64>,
    #[serde(rename = "ampacite_A", default)]
    pub ampacity_a: Option<f64>,
    #[serde(rename = "vmp_V", default)]
    pub vmp_v: Option<f64>,
    #[serde(rename = "voc_V", default)]
    pub voc_v: Option<f64>,
}

impl EquipmentDetail {
    /// Currency of [`Self::unit_price`], ariary when unspecified.
    pub fn currency(&self) -> Currency {
        self.currency
            .as_deref()
            .map(Currency::from_code)
            .unwrap_or_default()
    }
}

/// The five equipment slots of a sizing result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquipmentSlot {
    Panel,
    Battery,
    Regulator,
    Inverter,
    Cable,
}

impl EquipmentSlot {
    /// All slots in report order.
    pub const ALL: [EquipmentSlot; 5] = [
        Self::Panel,
        Self::Battery,
        Self::Regulator,
        Self::Inverter,
        Self::Cable,
    ];

    /// Label used in the equipment table.
    pub fn label(self) -> &'static str {
        match self {
            Self::Panel => "Panneau",
            Self::Battery => "Batterie",
            Self::Regulator => "Régulateur",
            Self::Inverter => "Onduleur",
            Self::Cable => "Câble",
        }
    }
}

/// Equipment recommended by the sizing computation; any slot may be empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedEquipment {
    #[serde(rename = "panneau", default)]
    pub panel: Option<EquipmentDetail>,
    #[serde(rename = "batterie", default)]
    pub battery: Option<EquipmentDetail>,
    #[serde(rename = "regulateur", default)]
    pub regulator: Option<EquipmentDetail>,
    #[serde(rename = "onduleur", default)]
    pub inverter: Option<EquipmentDetail>,
    #[serde(rename = "cable", default)]
    pub cable: Option<EquipmentDetail>,
}

impl RecommendedEquipment {
    /// Returns the detail stored in `slot`.
    pub fn slot(&self, slot: EquipmentSlot) -> Option<&EquipmentDetail> {
        match slot {
            EquipmentSlot::Panel => self.panel.as_ref(),
            EquipmentSlot::Battery => self.battery.as_ref(),
            EquipmentSlot::Regulator => self.regulator.as_ref(),
            EquipmentSlot::Inverter => self.inverter.as_ref(),
            EquipmentSlot::Cable => self.cable.as_ref(),
        }
    }

    /// Iterates over the populated slots in report order.
    pub fn present(&self) -> impl Iterator<Item = (EquipmentSlot, &EquipmentDetail)> + '_ {
        EquipmentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.slot(slot).map(|detail| (slot, detail)))
    }
}

/// Outcome of the sizing computation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Installed PV power in W.
    #[serde(rename = "puissance_totale", default)]
    pub total_power_w: Option<f64>,
    /// Battery bank capacity in Ah.
    #[serde(rename = "capacite_batterie", default)]
    pub battery_capacity_ah: Option<f64>,
    /// Yearly energy balance in Wh.
    #[serde(rename = "bilan_energetique_annuel", default)]
    pub annual_energy_wh: Option<f64>,
    /// Estimated total cost in ariary.
    #[serde(rename = "cout_total", default)]
    pub total_cost: Option<f64>,
    #[serde(rename = "nombre_panneaux", default)]
    pub panel_count: Option<u32>,
    #[serde(rename = "nombre_batteries", default)]
    pub battery_count: Option<u32>,
    #[serde(rename = "equipements_recommandes", default)]
    pub equipment: Option<RecommendedEquipment>,

    #[serde(rename = "nb_pv_serie", default)]
    pub pv_series: Option<u32>,
    #[serde(rename = "nb_pv_parallele", default)]
    pub pv_parallel: Option<u32>,
    #[serde(rename = "topologie_pv", default)]
    pub pv_topology: Option<String>,
    #[serde(rename = "nb_batt_serie", default)]
    pub battery_series: Option<u32>,
    #[serde(rename = "nb_batt_parallele", default)]
    pub battery_parallel: Option<u32>,
    #[serde(rename = "topologie_batterie", default)]
    pub battery_topology: Option<String>,

    /// Cable length for the whole installation in m.
    #[serde(rename = "longueur_cable_global_m", default)]
    pub cable_length_m: Option<f64>,
    /// Price of the whole cable run.
    #[serde(rename = "prix_cable_global", default)]
    pub cable_price: Option<f64>,
    #[serde(rename = "dimensionnement_id", default)]
    pub sizing_id: Option<u64>,
}

impl SizingResult {
    /// Cable length used in the report.
    ///
    /// Prefers the backend value; otherwise estimates a round trip to the roof with a 20 %
    /// allowance, and falls back to zero when the roof height is unknown.
    pub fn effective_cable_length(&self, params: &SizingParameters) -> f64 {
        if let Some(length) = self.cable_length_m.filter(|l| l.is_finite()) {
            return length;
        }
        match params.roof_height_m.filter(|h| h.is_finite() && *h > 0.0) {
            Some(height) => (height * 2.0 * 1.2).round(),
            None => 0.0,
        }
    }

    /// Total price of the cable run.
    pub fn effective_cable_price(&self, params: &SizingParameters) -> f64 {
        if let Some(price) = self.cable_price.filter(|p| p.is_finite()) {
            return price;
        }
        let length = self.effective_cable_length(params);
        let unit_price = self
            .equipment
            .as_ref()
            .and_then(|equipment| equipment.cable.as_ref())
            .and_then(|cable| cable.unit_price)
            .filter(|p| p.is_finite());
        match unit_price {
            Some(unit_price) if length > 0.0 => unit_price * length,
            _ => 0.0,
        }
    }

    /// Whether the result describes the PV array wiring.
    pub fn has_pv_topology(&self) -> bool {
        self.pv_topology.is_some() || (self.pv_series.is_some() && self.pv_parallel.is_some())
    }

    /// Whether the result describes the battery bank wiring.
    pub fn has_battery_topology(&self) -> bool {
        self.battery_topology.is_some()
            || (self.battery_series.is_some() && self.battery_parallel.is_some())
    }
}

/// Data handed over by the caller for one report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    #[serde(default)]
    pub result: Option<SizingResult>,
    #[serde(rename = "inputData", default)]
    pub input_data: Option<SizingParameters>,
}

impl ReportInput {
    pub fn new(result: SizingResult, input_data: SizingParameters) -> Self {
        Self {
            result: Some(result),
            input_data: Some(input_data),
        }
    }

    /// Checks that everything the report needs is present.
    ///
    /// A required field counts as missing when it is absent, zero or not a finite number.
    pub fn validate(&self) -> Result<ValidatedInput<'_>, ValidationError> {
        let (Some(result), Some(params)) = (self.result.as_ref(), self.input_data.as_ref()) else {
            return Err(ValidationError::IncompleteData);
        };

        let missing: Vec<RequiredField> = RequiredField::ALL
            .into_iter()
            .filter(|field| {
                !params
                    .required(*field)
                    .is_some_and(|value| value.is_finite() && value != 0.0)
            })
            .collect();

        if missing.is_empty() {
            Ok(ValidatedInput { result, params })
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }
}

/// Borrowed view of a [`ReportInput`] that passed validation.
#[derive(Clone, Copy, Debug)]
pub struct ValidatedInput<'a> {
    pub result: &'a SizingResult,
    pub params: &'a SizingParameters,
}

/// The five inputs a report cannot be generated without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequiredField {
    DailyEnergy,
    PeakPower,
    AutonomyDays,
    BatteryVoltage,
    Irradiation,
}

impl RequiredField {
    pub const ALL: [RequiredField; 5] = [
        Self::DailyEnergy,
        Self::PeakPower,
        Self::AutonomyDays,
        Self::BatteryVoltage,
        Self::Irradiation,
    ];

    /// Name of the field in the API payload.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::DailyEnergy => "E_jour",
            Self::PeakPower => "P_max",
            Self::AutonomyDays => "N_autonomie",
            Self::BatteryVoltage => "V_batterie",
            Self::Irradiation => "H_solaire",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|field| field.api_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reasons a report input is rejected before rendering.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The sizing result or the input parameters are absent altogether.
    #[error("Données incomplètes pour la génération du PDF")]
    IncompleteData,
    /// Some required input fields are absent or zero.
    #[error("Données manquantes: {}", join_fields(.0))]
    MissingFields(Vec<RequiredField>),
}
