//! Document validation.

use std::collections::HashSet;

use chrono::NaiveDate;
use ps_topology::ConnectionType;

use crate::schema::{CalendarRuleDef, DriveDoc, FilterType, PackDoc, SimDoc};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be non-negative"))
    }
}

pub fn validate_pack(pack: &PackDoc) -> Result<(), ValidationError> {
    if pack.meta.layers.is_empty() {
        return Err(invalid("meta.layers", "[]", "at least one layer is required"));
    }
    for (i, layer) in pack.meta.layers.iter().enumerate() {
        if layer.n_rows == 0 || layer.n_cols == 0 {
            return Err(invalid(
                format!("meta.layers[{i}]"),
                format!("{}x{}", layer.n_rows, layer.n_cols),
                "grid must have at least one row and column",
            ));
        }
        non_negative(&format!("meta.layers[{i}].pitch_x"), layer.pitch_x)?;
        non_negative(&format!("meta.layers[{i}].pitch_y"), layer.pitch_y)?;
    }

    let needed = pack.grid_cell_count();
    if pack.cells.len() < needed {
        return Err(invalid(
            "cells",
            pack.cells.len(),
            &format!("layer grids need {needed} cells"),
        ));
    }

    positive("capacity", pack.capacity)?;
    if !(pack.coulombic_efficiency > 0.0 && pack.coulombic_efficiency <= 1.0) {
        return Err(invalid(
            "columbic_efficiency",
            pack.coulombic_efficiency,
            "must be in (0, 1]",
        ));
    }
    non_negative("R_p", pack.r_p)?;
    non_negative("R_s", pack.r_s)?;

    pack.connection_type
        .parse::<ConnectionType>()
        .map_err(|_| ValidationError::Unsupported {
            feature: format!("connection_type {}", pack.connection_type),
            reason: "expected row_series_column_parallel or row_parallel_column_series"
                .to_string(),
        })?;

    let limits = &pack.voltage_limits;
    positive("voltage_limits.cell_upper", limits.cell_upper)?;
    if let Some(lower) = limits.cell_lower {
        if !(lower.is_finite() && lower < limits.cell_upper) {
            return Err(invalid(
                "voltage_limits.cell_lower",
                lower,
                "must be below cell_upper",
            ));
        }
    }
    if let Some(lower) = limits.module_lower {
        if !(lower.is_finite() && lower < limits.module_upper) {
            return Err(invalid(
                "voltage_limits.module_lower",
                lower,
                "must be below module_upper",
            ));
        }
    }

    non_negative("masses.cell", pack.masses.cell)?;
    non_negative("masses.jellyroll", pack.masses.jellyroll)?;
    Ok(())
}

pub fn validate_drive(drive: &DriveDoc) -> Result<(), ValidationError> {
    if !(0.0..=100.0).contains(&drive.starting_soc) {
        return Err(invalid("startingSoc", drive.starting_soc, "must be within 0..=100 %"));
    }

    let mut sub_ids = HashSet::new();
    for sub in &drive.sub_cycles {
        if !sub_ids.insert(sub.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: sub.id.clone(),
                context: "subCycles".to_string(),
            });
        }
        for (i, step) in sub.steps.iter().enumerate() {
            let field = format!("subCycles[{}].steps[{i}]", sub.id);
            if !step.value.is_finite() {
                return Err(invalid(format!("{field}.value"), step.value, "must be finite"));
            }
            non_negative(&format!("{field}.duration"), step.duration)?;
        }
    }

    if drive.drive_cycles.is_empty() {
        return Err(invalid("driveCycles", "[]", "at least one drive cycle is required"));
    }
    let mut cycle_ids = HashSet::new();
    for cycle in &drive.drive_cycles {
        if !cycle_ids.insert(cycle.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: cycle.id.clone(),
                context: "driveCycles".to_string(),
            });
        }
        for segment in &cycle.segments {
            if !sub_ids.contains(segment.sub_cycle_id.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: segment.sub_cycle_id.clone(),
                    context: format!("driveCycles[{}].segments", cycle.id),
                });
            }
        }
    }

    for (i, rule) in drive.calendar_rules.iter().enumerate() {
        validate_rule(i, rule)?;
        if !cycle_ids.contains(rule.drive_cycle_id.trim()) {
            return Err(ValidationError::MissingReference {
                id: rule.drive_cycle_id.clone(),
                context: format!("calendarRules[{i}].driveCycleId"),
            });
        }
    }
    Ok(())
}

fn validate_rule(index: usize, rule: &CalendarRuleDef) -> Result<(), ValidationError> {
    let field = format!("calendarRules[{index}]");
    let months = parse_list::<u32>(&rule.months)
        .ok_or_else(|| invalid(format!("{field}.months"), &rule.months, "expected numbers"))?;
    if let Some(m) = months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(invalid(format!("{field}.months"), m, "month must be 1..=12"));
    }

    if rule.filter_type == FilterType::Weekday {
        for day in rule.days_or_dates.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            if weekday_abbrev(day).is_none() {
                return Err(invalid(
                    format!("{field}.daysOrDates"),
                    day,
                    "expected a weekday such as Mon",
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_sim(sim: &SimDoc) -> Result<(), ValidationError> {
    parse_start_date(&sim.start_date)?;
    positive("dynamic_dt_s", sim.dynamic_dt_s)?;
    positive("nominal_voltage", sim.nominal_voltage)?;
    if sim.chunk_size == 0 {
        return Err(invalid("chunk_size", 0, "must be at least 1"));
    }
    if sim.limiter.enabled && sim.limiter.iterations == 0 {
        return Err(invalid("limiter.iterations", 0, "must be at least 1"));
    }

    let initial = &sim.initial;
    positive("initial.temperature_k", initial.temperature_k)?;
    if !(initial.soh > 0.0 && initial.soh <= 1.0) {
        return Err(invalid("initial.soh", initial.soh, "must be in (0, 1]"));
    }
    non_negative("initial.dcir_aging_factor", initial.dcir_aging_factor)?;
    for o in &initial.overrides {
        let field = format!("initial.overrides[cell {}]", o.cell);
        if let Some(soc) = o.soc {
            if !(0.0..=1.0).contains(&soc) {
                return Err(invalid(format!("{field}.soc"), soc, "must be within 0..=1"));
            }
        }
        if let Some(t) = o.temperature_k {
            positive(&format!("{field}.temperature_k"), t)?;
        }
        if let Some(soh) = o.soh {
            if !(soh > 0.0 && soh <= 1.0) {
                return Err(invalid(format!("{field}.soh"), soh, "must be in (0, 1]"));
            }
        }
        if let Some(f) = o.dcir_aging_factor {
            non_negative(&format!("{field}.dcir_aging_factor"), f)?;
        }
    }
    Ok(())
}

pub(crate) fn parse_start_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| invalid("start_date", s, "expected YYYY-MM-DD"))
}

/// Comma-separated list, blanks ignored. `None` if any entry fails to parse.
pub(crate) fn parse_list<T: std::str::FromStr>(s: &str) -> Option<Vec<T>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse().ok())
        .collect()
}

/// Normalise `mon`, `MON`, `Monday` to `Mon`.
pub(crate) fn weekday_abbrev(s: &str) -> Option<&'static str> {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let lower = s.trim().to_ascii_lowercase();
    DAYS.iter()
        .copied()
        .find(|d| lower.len() >= 3 && lower.starts_with(&d.to_ascii_lowercase()))
}
