//! Column metadata and unit inference.

use serde::{Deserialize, Serialize};

/// Kind of values held by a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every present value is a finite number.
    Numeric,
    /// Free text or labels.
    Categorical,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
}

/// Metadata for a single dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column header exactly as it appears in the file.
    pub name: String,
    /// Zero-based position in the file.
    pub position: usize,
    /// Numeric or categorical.
    pub kind: ColumnKind,
    /// Unit hint for numeric columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Number of rows with a present value.
    pub present_count: usize,
}

impl ColumnMeta {
    /// Whether the column can be aggregated as a metric.
    pub fn is_metric(&self) -> bool {
        self.kind.is_numeric()
    }

    /// Unit string, or an empty string when none is known.
    pub fn unit_or_empty(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }
}

/// Infer a unit from an OWID-style column name.
///
/// Rules are checked in order; the first match wins.
pub fn infer_unit(column: &str) -> Option<String> {
    let name = column.to_lowercase();

    let unit = if name.starts_with("share_") || name.contains("_share_") || name.ends_with("_pct") {
        "%"
    } else if name.contains("temperature_change") {
        "°C"
    } else if name.ends_with("_per_gdp") {
        "kg per international-$"
    } else if name.ends_with("_per_unit_energy") {
        "kg per kWh"
    } else if name == "energy_per_capita" {
        "kWh per person"
    } else if name == "energy_per_gdp" {
        "kWh per international-$"
    } else if name == "primary_energy_consumption" {
        "TWh"
    } else if name.contains("_per_capita") {
        if is_co2_equivalent(&name) {
            "tonnes CO2e per person"
        } else {
            "tonnes per person"
        }
    } else if is_co2_equivalent(&name) {
        "million tonnes CO2e"
    } else if name.contains("co2") {
        "million tonnes"
    } else if name == "population" {
        "people"
    } else if name == "gdp" {
        "international-$"
    } else {
        return None;
    };

    Some(unit.to_string())
}

fn is_co2_equivalent(name: &str) -> bool {
    name.contains("methane") || name.contains("nitrous_oxide") || name.contains("ghg")
}
