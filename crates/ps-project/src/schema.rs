//! Configuration document definitions.
//!
//! Three documents describe a run: the pack (geometry, busbars, electrical
//! limits), the drive (calendar-driven duty cycle) and the simulation
//! settings. Field names follow the files produced by the pack and drive
//! builders, hence the mixed casing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackDoc {
    pub meta: PackMetaDef,
    pub cells: Vec<CellDef>,
    /// Nominal cell capacity (Ah)
    pub capacity: f64,
    #[serde(rename = "columbic_efficiency")]
    pub coulombic_efficiency: f64,
    pub connection_type: String,
    /// Parallel interconnect resistance (Ω)
    #[serde(rename = "R_p")]
    pub r_p: f64,
    /// Series interconnect resistance (Ω)
    #[serde(rename = "R_s")]
    pub r_s: f64,
    pub voltage_limits: VoltageLimitsDef,
    pub masses: MassesDef,
}

impl PackDoc {
    /// Cells needed to fill every layer grid.
    pub fn grid_cell_count(&self) -> usize {
        self.meta.layers.iter().map(|l| l.n_rows * l.n_cols).sum()
    }

    /// Total cell mass of the pack (kg).
    pub fn total_cell_mass_kg(&self) -> f64 {
        self.cells.len() as f64 * self.masses.cell
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackMetaDef {
    pub layers: Vec<LayerDef>,
    #[serde(rename = "formFactor", default)]
    pub form_factor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerDef {
    #[serde(default)]
    pub grid_type: String,
    pub n_rows: usize,
    pub n_cols: usize,
    pub pitch_x: f64,
    pub pitch_y: f64,
    #[serde(default)]
    pub z_center: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CellDef {
    #[serde(default)]
    pub dims: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VoltageLimitsDef {
    pub cell_upper: f64,
    #[serde(default)]
    pub cell_lower: Option<f64>,
    pub module_upper: f64,
    #[serde(default)]
    pub module_lower: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MassesDef {
    pub cell: f64,
    pub jellyroll: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveDoc {
    /// Initial SOC of every cell (%)
    #[serde(deserialize_with = "number_or_string")]
    pub starting_soc: f64,
    pub sub_cycles: Vec<SubCycleDef>,
    pub drive_cycles: Vec<DriveCycleDef>,
    #[serde(default)]
    pub calendar_rules: Vec<CalendarRuleDef>,
    #[serde(default)]
    pub default_drive_cycle_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubCycleDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
    /// One of `A`, `W`, `C`, `V`; anything else is skipped when flattening.
    pub unit: String,
    #[serde(deserialize_with = "number_or_string")]
    pub value: f64,
    /// Duration of one repetition (s)
    pub duration: f64,
    #[serde(default = "one")]
    pub repetitions: u32,
    #[serde(default)]
    pub is_dynamic: bool,
}

impl StepDef {
    pub fn total_duration(&self) -> f64 {
        self.duration * self.repetitions as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveCycleDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub segments: Vec<SegmentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDef {
    pub sub_cycle_id: String,
    #[serde(default = "one")]
    pub repetitions: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Weekday,
    Date,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRuleDef {
    /// Comma-separated month numbers, e.g. `"1,2,3"`
    pub months: String,
    pub filter_type: FilterType,
    /// Comma-separated weekdays (`"Mon,Tue"`) or days of month (`"1,15"`)
    pub days_or_dates: String,
    pub drive_cycle_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimDoc {
    /// First calendar day, `YYYY-MM-DD`
    pub start_date: String,
    pub num_days: u32,
    /// Tick length for dynamic drive steps (s)
    pub dynamic_dt_s: f64,
    /// Voltage used to turn power steps into current (V)
    pub nominal_voltage: f64,
    /// Steps per history chunk
    pub chunk_size: usize,
    pub limiter: LimiterDef,
    pub parallel_groups: bool,
    pub initial: InitialDef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_tables: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for SimDoc {
    fn default() -> Self {
        Self {
            start_date: "2025-01-01".to_string(),
            num_days: 365,
            dynamic_dt_s: 60.0,
            nominal_voltage: 3.7,
            chunk_size: 1000,
            limiter: LimiterDef::default(),
            parallel_groups: false,
            initial: InitialDef::default(),
            parameter_tables: None,
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimiterDef {
    pub enabled: bool,
    pub iterations: usize,
}

impl Default for LimiterDef {
    fn default() -> Self {
        Self {
            enabled: true,
            iterations: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialDef {
    pub temperature_k: f64,
    pub soh: f64,
    pub dcir_aging_factor: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OverrideDef>,
}

impl Default for InitialDef {
    fn default() -> Self {
        Self {
            temperature_k: 300.0,
            soh: 1.0,
            dcir_aging_factor: 1.0,
            overrides: Vec::new(),
        }
    }
}

/// Per-cell initial condition; unset fields keep the pack-wide value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OverrideDef {
    /// 1-based global cell index
    pub cell: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcir_aging_factor: Option<f64>,
}

fn one() -> u32 {
    1
}

/// Builders emit some numbers as strings (`"value": "2.5"`).
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, found {s:?}"))),
    }
}
