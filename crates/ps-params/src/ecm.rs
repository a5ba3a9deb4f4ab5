//! Equivalent-circuit parameter set and current direction.

use std::fmt;

/// Operating mode, selected from the sign of the module current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Charge,
    Discharge,
}

impl Mode {
    /// Negative current charges the cell; zero and positive discharge it.
    pub fn from_current(current_a: f64) -> Self {
        if current_a < 0.0 {
            Mode::Charge
        } else {
            Mode::Discharge
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Charge => "CHARGE",
            Mode::Discharge => "DISCHARGE",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-order Thevenin model parameters for one cell at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EcmParams {
    /// Open-circuit voltage (V)
    pub ocv: f64,
    /// Series resistance (Ω)
    pub r0: f64,
    /// First RC branch resistance (Ω)
    pub r1: f64,
    /// Second RC branch resistance (Ω)
    pub r2: f64,
    /// First RC branch capacitance (F)
    pub c1: f64,
    /// Second RC branch capacitance (F)
    pub c2: f64,
}

impl EcmParams {
    pub(crate) const NAMES: [&'static str; 6] = ["OCV", "R0", "R1", "R2", "C1", "C2"];

    pub(crate) fn from_array(v: [f64; 6]) -> Self {
        Self {
            ocv: v[0],
            r0: v[1],
            r1: v[2],
            r2: v[3],
            c1: v[4],
            c2: v[5],
        }
    }

    pub(crate) fn as_array(&self) -> [f64; 6] {
        [self.ocv, self.r0, self.r1, self.r2, self.c1, self.c2]
    }

    /// Scale the three resistances by a DCIR aging factor.
    pub fn with_aging(mut self, aging_factor: f64) -> Self {
        self.r0 *= aging_factor;
        self.r1 *= aging_factor;
        self.r2 *= aging_factor;
        self
    }

    pub fn tau1(&self) -> f64 {
        self.r1 * self.c1
    }

    pub fn tau2(&self) -> f64 {
        self.r2 * self.c2
    }
}
