//! Recorded signal catalogue.

use std::fmt;
use std::str::FromStr;

use crate::ResultsError;

/// Whether a signal has one value per cell or one per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalShape {
    PerCell,
    PerStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Soc,
    Vterm,
    Ocv,
    ICell,
    VRc1,
    VRc2,
    VR0,
    R0,
    R1,
    R2,
    C1,
    C2,
    Qgen,
    Qirrev,
    Qrev,
    EnergyThroughput,
    QgenCumulative,
    Dt,
    IModule,
    VModule,
}

impl Signal {
    /// Per-cell signals in storage order.
    pub const CELL: [Signal; 17] = [
        Signal::Soc,
        Signal::Vterm,
        Signal::Ocv,
        Signal::ICell,
        Signal::VRc1,
        Signal::VRc2,
        Signal::VR0,
        Signal::R0,
        Signal::R1,
        Signal::R2,
        Signal::C1,
        Signal::C2,
        Signal::Qgen,
        Signal::Qirrev,
        Signal::Qrev,
        Signal::EnergyThroughput,
        Signal::QgenCumulative,
    ];

    /// Per-step signals in storage order.
    pub const STEP: [Signal; 3] = [Signal::Dt, Signal::IModule, Signal::VModule];

    pub fn all() -> impl Iterator<Item = Signal> {
        Self::CELL.into_iter().chain(Self::STEP)
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::Soc => "SOC",
            Signal::Vterm => "Vterm",
            Signal::Ocv => "OCV",
            Signal::ICell => "I_cell",
            Signal::VRc1 => "V_RC1",
            Signal::VRc2 => "V_RC2",
            Signal::VR0 => "V_R0",
            Signal::R0 => "R0",
            Signal::R1 => "R1",
            Signal::R2 => "R2",
            Signal::C1 => "C1",
            Signal::C2 => "C2",
            Signal::Qgen => "Qgen",
            Signal::Qirrev => "Qirrev",
            Signal::Qrev => "Qrev",
            Signal::EnergyThroughput => "energy_throughput",
            Signal::QgenCumulative => "Qgen_cumulative",
            Signal::Dt => "dt",
            Signal::IModule => "I_module",
            Signal::VModule => "V_module",
        }
    }

    pub fn shape(self) -> SignalShape {
        match self {
            Signal::Dt | Signal::IModule | Signal::VModule => SignalShape::PerStep,
            _ => SignalShape::PerCell,
        }
    }

    /// Position within [`Signal::CELL`] or [`Signal::STEP`].
    pub(crate) fn slot(self) -> usize {
        match self.shape() {
            SignalShape::PerCell => Self::CELL.iter().position(|s| *s == self),
            SignalShape::PerStep => Self::STEP.iter().position(|s| *s == self),
        }
        .unwrap_or(0)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = ResultsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signal::all()
            .find(|sig| sig.name() == s)
            .ok_or_else(|| ResultsError::UnknownSignal(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for sig in Signal::all() {
            assert_eq!(sig.name().parse::<Signal>().unwrap(), sig);
        }
        assert!("Vcell".parse::<Signal>().is_err());
    }

    #[test]
    fn slots_are_dense() {
        for (i, sig) in Signal::CELL.iter().enumerate() {
            assert_eq!(sig.slot(), i);
            assert_eq!(sig.shape(), SignalShape::PerCell);
        }
        for (i, sig) in Signal::STEP.iter().enumerate() {
            assert_eq!(sig.slot(), i);
        }
    }
}
