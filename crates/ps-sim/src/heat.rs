//! Reversible (entropic) heat models.

/// Reversible heat rate of one cell (W). Positive values heat the cell.
pub trait ReversibleHeat: Send + Sync {
    fn heat(&self, temperature_k: f64, current: f64, soc: f64) -> f64;
}

/// No entropic contribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReversibleHeat;

impl ReversibleHeat for NoReversibleHeat {
    fn heat(&self, _temperature_k: f64, _current: f64, _soc: f64) -> f64 {
        0.0
    }
}

/// `Q = T · (−I) · dU/dT` with the entropy coefficient fitted per electrode
/// as a function of its lithium stoichiometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyCoefficientHeat;

// Electrode stoichiometry at 0 % and 100 % SOC.
const X_POS_0: f64 = 0.2567;
const X_POS_100: f64 = 0.9072;
const X_NEG_0: f64 = 0.0279;
const X_NEG_100: f64 = 0.9014;

// Negative electrode fit (mV/K).
const A0_N: f64 = -0.1112;
const A1_N: f64 = 0.0;
const A2_N: f64 = 0.3561;
const B1_N: f64 = 0.4955;
const B2_N: f64 = 0.08309;
const C0_N: f64 = 0.02914;
const C1_N: f64 = 0.1122;
const C2_N: f64 = 0.004616;
const D1_N: f64 = 63.9;

// Positive electrode fit (mV/K).
const A1_P: f64 = 0.04006;
const A2_P: f64 = -0.06656;
const B1_P: f64 = 0.2828;
const B2_P: f64 = 0.8032;
const C1_P: f64 = 0.0009855;
const C2_P: f64 = 0.02179;

fn gaussian(x: f64, center: f64, width: f64) -> f64 {
    (-(x - center).powi(2) / width).exp()
}

impl EntropyCoefficientHeat {
    /// Cell entropy coefficient dU/dT (V/K) at `soc`, clamped to [0, 1].
    pub fn entropy_coefficient(&self, soc: f64) -> f64 {
        let soc = soc.clamp(0.0, 1.0);
        let x_pos = soc * (X_POS_100 - X_POS_0) + X_POS_0;
        let x_neg = soc * (X_NEG_100 - X_NEG_0) + X_NEG_0;

        let du_pos = (A1_P * gaussian(x_pos, B1_P, C1_P) + A2_P * gaussian(x_pos, B2_P, C2_P))
            / 1000.0;
        let du_neg = (A0_N * x_neg
            + C0_N
            + A2_N * gaussian(x_neg, B2_N, C2_N)
            + A1_N
                * ((D1_N * (x_neg - (B1_N - C1_N))).tanh()
                    - (D1_N * (x_neg - (B1_N + C1_N))).tanh()))
            / 1000.0;

        du_pos - du_neg
    }
}

impl ReversibleHeat for EntropyCoefficientHeat {
    fn heat(&self, temperature_k: f64, current: f64, soc: f64) -> f64 {
        temperature_k * (-current) * self.entropy_coefficient(soc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_current_gives_zero_heat() {
        assert_eq!(EntropyCoefficientHeat.heat(300.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn heat_flips_with_current_direction() {
        let h = EntropyCoefficientHeat;
        let q_dis = h.heat(298.15, 2.0, 0.4);
        let q_chg = h.heat(298.15, -2.0, 0.4);
        assert!((q_dis + q_chg).abs() < 1e-15);
        assert!(q_dis.is_finite());
    }

    #[test]
    fn soc_is_clamped() {
        let h = EntropyCoefficientHeat;
        assert_eq!(h.entropy_coefficient(1.3), h.entropy_coefficient(1.0));
        assert_eq!(h.entropy_coefficient(-0.2), h.entropy_coefficient(0.0));
    }

    #[test]
    fn coefficient_at_empty_cell() {
        // x_pos = 0.2567, x_neg = 0.0279
        let x_pos: f64 = 0.2567;
        let x_neg: f64 = 0.0279;
        let pos = (0.04006 * (-(x_pos - 0.2828).powi(2) / 0.0009855).exp()
            - 0.06656 * (-(x_pos - 0.8032).powi(2) / 0.02179).exp())
            / 1000.0;
        let neg = (-0.1112 * x_neg + 0.02914 + 0.3561 * (-(x_neg - 0.08309).powi(2) / 0.004616).exp())
            / 1000.0;
        assert!((EntropyCoefficientHeat.entropy_coefficient(0.0) - (pos - neg)).abs() < 1e-15);
    }
}
