//! SOH-bucketed parameter provider.

use std::fmt;

use ps_core::WarnOnce;

use crate::ecm::{EcmParams, Mode};
use crate::table::EcmTable;

/// Lower bound of the plausible cell OCV window (V).
pub const OCV_PLAUSIBLE_MIN: f64 = 2.5;
/// Upper bound of the plausible cell OCV window (V).
pub const OCV_PLAUSIBLE_MAX: f64 = 4.2;

/// Discrete SOH bucket. Datasets step between buckets; there is no blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SohBucket {
    /// SOH ≥ 0.9
    High,
    /// 0.8 ≤ SOH < 0.9
    Mid,
    /// SOH < 0.8
    Low,
}

impl SohBucket {
    pub fn from_soh(soh: f64) -> Self {
        if soh >= 0.9 {
            SohBucket::High
        } else if soh >= 0.8 {
            SohBucket::Mid
        } else {
            SohBucket::Low
        }
    }
}

/// Charge and discharge tables for one SOH bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct SohDataset {
    pub charge: EcmTable,
    pub discharge: EcmTable,
}

impl SohDataset {
    pub fn reference() -> Self {
        Self {
            charge: EcmTable::reference(),
            discharge: EcmTable::reference(),
        }
    }

    pub fn table(&self, mode: Mode) -> &EcmTable {
        match mode {
            Mode::Charge => &self.charge,
            Mode::Discharge => &self.discharge,
        }
    }
}

/// Non-fatal findings about a lookup. Logged, never raised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamAdvisory {
    /// Lookup point outside the table; value was extrapolated.
    OutOfRange { soc: f64, temp_c: f64 },
    /// A parameter came out negative.
    Negative { name: &'static str, value: f64 },
    /// OCV outside the plausible single-cell window.
    ImplausibleOcv { ocv: f64 },
}

impl ParamAdvisory {
    /// De-duplication key: one warning per advisory kind and parameter.
    pub fn key(&self) -> String {
        match self {
            ParamAdvisory::OutOfRange { .. } => "params:out-of-range".to_string(),
            ParamAdvisory::Negative { name, .. } => format!("params:negative:{name}"),
            ParamAdvisory::ImplausibleOcv { .. } => "params:implausible-ocv".to_string(),
        }
    }
}

impl fmt::Display for ParamAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamAdvisory::OutOfRange { soc, temp_c } => write!(
                f,
                "lookup outside table at SOC={soc:.4}, T={temp_c:.2}°C, extrapolating"
            ),
            ParamAdvisory::Negative { name, value } => {
                write!(f, "{name} is negative ({value:.4})")
            }
            ParamAdvisory::ImplausibleOcv { ocv } => write!(
                f,
                "OCV ({ocv:.4} V) outside expected range [{OCV_PLAUSIBLE_MIN}, {OCV_PLAUSIBLE_MAX}] V"
            ),
        }
    }
}

/// Injected provider owning all parameter tables for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterProvider {
    high: SohDataset,
    mid: SohDataset,
    low: SohDataset,
}

impl ParameterProvider {
    pub fn new(high: SohDataset, mid: SohDataset, low: SohDataset) -> Self {
        Self { high, mid, low }
    }

    /// Same dataset for every SOH bucket.
    pub fn uniform(dataset: SohDataset) -> Self {
        Self {
            high: dataset.clone(),
            mid: dataset.clone(),
            low: dataset,
        }
    }

    /// Reference cell tables in all buckets.
    pub fn reference() -> Self {
        Self::uniform(SohDataset::reference())
    }

    pub fn dataset(&self, bucket: SohBucket) -> &SohDataset {
        match bucket {
            SohBucket::High => &self.high,
            SohBucket::Mid => &self.mid,
            SohBucket::Low => &self.low,
        }
    }

    /// Interpolated, aging-scaled parameters. Pure; never logs.
    pub fn lookup(
        &self,
        soc: f64,
        temp_c: f64,
        mode: Mode,
        soh: f64,
        aging_factor: f64,
    ) -> EcmParams {
        self.dataset(SohBucket::from_soh(soh))
            .table(mode)
            .interpolate(soc, temp_c)
            .with_aging(aging_factor)
    }

    /// Like [`lookup`](Self::lookup), logging advisories once per kind.
    pub fn lookup_checked(
        &self,
        soc: f64,
        temp_c: f64,
        mode: Mode,
        soh: f64,
        aging_factor: f64,
        warnings: &mut WarnOnce,
    ) -> EcmParams {
        let table = self.dataset(SohBucket::from_soh(soh)).table(mode);
        let params = table.interpolate(soc, temp_c).with_aging(aging_factor);
        let in_range = table.contains(soc, temp_c);
        check(&params, soc, temp_c, in_range, |advisory| {
            warnings.warn(&advisory.key(), || {
                format!("{advisory} at SOC={soc:.4}, T={temp_c:.2}°C ({mode})")
            });
        });
        params
    }
}

/// Run the advisory checks on a looked-up parameter set.
pub fn check(
    params: &EcmParams,
    soc: f64,
    temp_c: f64,
    in_range: bool,
    mut report: impl FnMut(ParamAdvisory),
) {
    if !in_range {
        report(ParamAdvisory::OutOfRange { soc, temp_c });
    }
    for (name, value) in EcmParams::NAMES.iter().zip(params.as_array()) {
        if value < 0.0 {
            report(ParamAdvisory::Negative { name, value });
        }
    }
    if params.ocv < OCV_PLAUSIBLE_MIN || params.ocv > OCV_PLAUSIBLE_MAX {
        report(ParamAdvisory::ImplausibleOcv { ocv: params.ocv });
    }
}
