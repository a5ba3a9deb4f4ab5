//! Drive-cycle flattening: calendar rules to a module current time series.
//!
//! Every calendar day from the start date picks one drive cycle, expands its
//! segments and steps into `(t, I)` samples and pads the rest of the day
//! with idle current.

use chrono::{Datelike, Days, NaiveDate};
use ps_core::constants::SECONDS_PER_DAY;
use ps_core::{DriveProfile, WarnOnce};

use crate::ProjectResult;
use crate::schema::{
    CalendarRuleDef, DriveCycleDef, DriveDoc, FilterType, PackDoc, SimDoc, StepDef,
};
use crate::validate::{ValidationError, parse_list, parse_start_date, weekday_abbrev};

/// Calendar and unit-conversion settings for flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenOptions {
    pub start_date: NaiveDate,
    pub num_days: u32,
    /// Voltage for power steps (V)
    pub nominal_voltage: f64,
    /// Cell capacity for C-rate steps (Ah)
    pub capacity_ah: f64,
    /// Tick length for dynamic steps (s)
    pub dynamic_dt_s: f64,
}

impl FlattenOptions {
    pub fn from_docs(pack: &PackDoc, sim: &SimDoc) -> ProjectResult<Self> {
        Ok(Self {
            start_date: parse_start_date(&sim.start_date)?,
            num_days: sim.num_days,
            nominal_voltage: sim.nominal_voltage,
            capacity_ah: pack.capacity,
            dynamic_dt_s: sim.dynamic_dt_s,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepUnit {
    Amps,
    Watts,
    CRate,
    Volts,
}

impl StepUnit {
    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(StepUnit::Amps),
            "W" => Some(StepUnit::Watts),
            "C" => Some(StepUnit::CRate),
            "V" => Some(StepUnit::Volts),
            _ => None,
        }
    }
}

enum DayFilter {
    Weekdays(Vec<&'static str>),
    Dates(Vec<u32>),
}

struct Rule<'a> {
    months: Vec<u32>,
    filter: DayFilter,
    cycle_id: &'a str,
}

impl<'a> Rule<'a> {
    fn compile(index: usize, def: &'a CalendarRuleDef) -> ProjectResult<Self> {
        let months = parse_list(&def.months).ok_or_else(|| ValidationError::InvalidValue {
            field: format!("calendarRules[{index}].months"),
            value: def.months.clone(),
            reason: "expected numbers".to_string(),
        })?;
        let entries = def.days_or_dates.split(',').map(str::trim);
        let filter = match def.filter_type {
            FilterType::Weekday => DayFilter::Weekdays(entries.filter_map(weekday_abbrev).collect()),
            // non-numeric entries never match a date
            FilterType::Date => DayFilter::Dates(entries.filter_map(|d| d.parse().ok()).collect()),
        };
        Ok(Self {
            months,
            filter,
            cycle_id: def.drive_cycle_id.trim(),
        })
    }

    fn matches(&self, date: NaiveDate) -> bool {
        if !self.months.contains(&date.month()) {
            return false;
        }
        match &self.filter {
            DayFilter::Weekdays(days) => {
                let today = date.format("%a").to_string();
                days.iter().any(|d| *d == today)
            }
            DayFilter::Dates(dates) => dates.contains(&date.day()),
        }
    }
}

/// Accumulates samples, dropping any that would not advance time.
///
/// A sample's current holds from its own time until the next sample. The
/// open last sample stays at 0 A until the next interval claims it.
struct Samples {
    time: Vec<f64>,
    current: Vec<f64>,
}

impl Samples {
    fn now(&self) -> f64 {
        self.time.last().copied().unwrap_or(0.0)
    }

    fn advance(&mut self, dt: f64, current: f64) {
        let start = self.now();
        let t = start + dt;
        if t > start {
            if let Some(last) = self.current.last_mut() {
                *last = current;
            }
            self.time.push(t);
            self.current.push(0.0);
        }
    }
}

/// Expand `drive` over `options.num_days` calendar days.
///
/// The profile starts at 0 s and ends with a 0 A sample at the horizon; the
/// current of sample `k` drives the interval up to sample `k + 1`. Voltage steps and unknown units are
/// skipped with a one-time warning each, as are days whose drive cycle or
/// segments reference something that does not exist.
pub fn flatten_drive(
    drive: &DriveDoc,
    options: &FlattenOptions,
    warnings: &mut WarnOnce,
) -> ProjectResult<DriveProfile> {
    let rules = drive
        .calendar_rules
        .iter()
        .enumerate()
        .map(|(i, r)| Rule::compile(i, r))
        .collect::<ProjectResult<Vec<_>>>()?;

    let default_cycle = drive
        .default_drive_cycle_id
        .as_deref()
        .and_then(|id| find_cycle(drive, id))
        .or_else(|| drive.drive_cycles.first());

    let mut samples = Samples {
        time: vec![0.0],
        current: vec![0.0],
    };

    for day in 0..options.num_days {
        let Some(date) = options.start_date.checked_add_days(Days::new(day as u64)) else {
            break;
        };
        let day_start = samples.now();

        let cycle = match rules.iter().find(|r| r.matches(date)) {
            Some(rule) => find_cycle(drive, rule.cycle_id),
            None => default_cycle,
        };
        let Some(cycle) = cycle else {
            warnings.warn("missing-cycle", || {
                format!("no drive cycle for {date}, skipping day")
            });
            continue;
        };

        expand_cycle(drive, cycle, options, warnings, &mut samples);

        let idle = day_start + SECONDS_PER_DAY - samples.now();
        if idle > 0.0 {
            samples.advance(idle, 0.0);
        }
    }

    tracing::debug!(
        days = options.num_days,
        samples = samples.time.len(),
        "flattened drive profile"
    );
    Ok(DriveProfile::new(samples.time, samples.current)?)
}

fn find_cycle<'d>(drive: &'d DriveDoc, id: &str) -> Option<&'d DriveCycleDef> {
    drive.drive_cycles.iter().find(|c| c.id == id)
}

fn expand_cycle(
    drive: &DriveDoc,
    cycle: &DriveCycleDef,
    options: &FlattenOptions,
    warnings: &mut WarnOnce,
    samples: &mut Samples,
) {
    for segment in &cycle.segments {
        let Some(sub) = drive.sub_cycles.iter().find(|s| s.id == segment.sub_cycle_id) else {
            warnings.warn(&format!("missing-subcycle:{}", segment.sub_cycle_id), || {
                format!("unknown sub-cycle {}, skipping segment", segment.sub_cycle_id)
            });
            continue;
        };
        for _ in 0..segment.repetitions {
            for step in &sub.steps {
                expand_step(step, options, warnings, samples);
            }
        }
    }
}

fn expand_step(
    step: &StepDef,
    options: &FlattenOptions,
    warnings: &mut WarnOnce,
    samples: &mut Samples,
) {
    let total = step.total_duration();
    if total == 0.0 {
        return;
    }

    let current = match StepUnit::parse(&step.unit) {
        Some(StepUnit::Amps) => step.value,
        Some(StepUnit::Watts) => step.value / options.nominal_voltage,
        Some(StepUnit::CRate) => step.value * options.capacity_ah,
        Some(StepUnit::Volts) => {
            warnings.warn("unit:V", || {
                "skipping constant-voltage drive step (not supported)".to_string()
            });
            return;
        }
        None => {
            warnings.warn("unit:unknown", || {
                format!("unknown drive step unit {:?}, skipping", step.unit)
            });
            return;
        }
    };

    if step.is_dynamic {
        let dt = options.dynamic_dt_s;
        let ticks = (total / dt).floor() as u64;
        for _ in 0..ticks {
            samples.advance(dt, current);
        }
        let remainder = total % dt;
        if remainder > 0.0 {
            samples.advance(remainder, current);
        }
    } else {
        samples.advance(total, current);
    }
}
