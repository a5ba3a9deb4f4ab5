//! SOC×temperature parameter tables with bilinear interpolation.

use crate::ecm::EcmParams;
use crate::error::{ParamsError, ParamsResult};

/// Temperature nodes (°C) of the reference tables.
pub const REFERENCE_TEMPERATURES_C: [f64; 6] = [5.0, 15.0, 25.0, 35.0, 45.0, 55.0];

/// One mode's six parameter grids, packed as a single interpolator.
///
/// All six parameters share the SOC and temperature axes, so the bracketing
/// cell is located once per lookup and all six values are blended together.
/// Outside the axes the edge cell is extended linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct EcmTable {
    soc: Vec<f64>,
    temp_c: Vec<f64>,
    /// Row-major: `values[i_soc * temp_c.len() + i_temp]`
    values: Vec<[f64; 6]>,
}

impl EcmTable {
    /// Build a table from axes and grid points in row-major order
    /// (SOC outer, temperature inner).
    pub fn new(soc: Vec<f64>, temp_c: Vec<f64>, values: Vec<EcmParams>) -> ParamsResult<Self> {
        check_axis(&soc, "soc")?;
        check_axis(&temp_c, "temperature")?;

        let expected = soc.len() * temp_c.len();
        if values.len() != expected {
            return Err(ParamsError::ShapeMismatch {
                expected,
                found: values.len(),
            });
        }

        let n_temp = temp_c.len();
        let mut packed = Vec::with_capacity(expected);
        for (flat, params) in values.iter().enumerate() {
            let arr = params.as_array();
            for (k, v) in arr.iter().enumerate() {
                if !v.is_finite() {
                    return Err(ParamsError::NonFinite {
                        what: EcmParams::NAMES[k],
                        soc_index: flat / n_temp,
                        temp_index: flat % n_temp,
                    });
                }
            }
            packed.push(arr);
        }

        Ok(Self {
            soc,
            temp_c,
            values: packed,
        })
    }

    /// Build a table by evaluating `f(soc, temp_c)` on every grid node.
    pub fn from_fn(
        soc: Vec<f64>,
        temp_c: Vec<f64>,
        f: impl Fn(f64, f64) -> EcmParams,
    ) -> ParamsResult<Self> {
        let mut values = Vec::with_capacity(soc.len() * temp_c.len());
        for &s in &soc {
            for &t in &temp_c {
                values.push(f(s, t));
            }
        }
        Self::new(soc, temp_c, values)
    }

    /// Reference cell: 11 SOC nodes, six temperatures, linear OCV from 2.5 V
    /// to 4.2 V and constant resistances/capacitances.
    pub fn reference() -> Self {
        let soc: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let mut values = Vec::with_capacity(soc.len() * REFERENCE_TEMPERATURES_C.len());
        for &s in &soc {
            for _ in REFERENCE_TEMPERATURES_C {
                values.push(EcmParams {
                    ocv: 2.5 + s * 1.7,
                    r0: 0.02,
                    r1: 0.01,
                    r2: 0.01,
                    c1: 1000.0,
                    c2: 10_000.0,
                });
            }
        }
        Self {
            soc,
            temp_c: REFERENCE_TEMPERATURES_C.to_vec(),
            values: values.iter().map(EcmParams::as_array).collect(),
        }
    }

    pub fn soc_axis(&self) -> &[f64] {
        &self.soc
    }

    pub fn temperature_axis(&self) -> &[f64] {
        &self.temp_c
    }

    /// True if (soc, temp_c) lies inside the grid bounds.
    pub fn contains(&self, soc: f64, temp_c: f64) -> bool {
        within(&self.soc, soc) && within(&self.temp_c, temp_c)
    }

    /// Bilinear interpolation, linear extrapolation beyond the axes.
    pub fn interpolate(&self, soc: f64, temp_c: f64) -> EcmParams {
        let n_temp = self.temp_c.len();
        let (i0, i1, ws) = bracket(&self.soc, soc);
        let (j0, j1, wt) = bracket(&self.temp_c, temp_c);

        let v00 = &self.values[i0 * n_temp + j0];
        let v01 = &self.values[i0 * n_temp + j1];
        let v10 = &self.values[i1 * n_temp + j0];
        let v11 = &self.values[i1 * n_temp + j1];

        let mut out = [0.0; 6];
        for k in 0..6 {
            let low = v00[k] + wt * (v01[k] - v00[k]);
            let high = v10[k] + wt * (v11[k] - v10[k]);
            out[k] = low + ws * (high - low);
        }
        EcmParams::from_array(out)
    }
}

fn check_axis(axis: &[f64], name: &'static str) -> ParamsResult<()> {
    if axis.is_empty() {
        return Err(ParamsError::EmptyAxis { axis: name });
    }
    for (i, pair) in axis.windows(2).enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(ParamsError::UnsortedAxis {
                axis: name,
                index: i + 1,
            });
        }
    }
    if let Some(index) = axis.iter().position(|v| !v.is_finite()) {
        return Err(ParamsError::UnsortedAxis { axis: name, index });
    }
    Ok(())
}

fn within(axis: &[f64], x: f64) -> bool {
    match (axis.first(), axis.last()) {
        (Some(lo), Some(hi)) => x >= *lo && x <= *hi,
        _ => false,
    }
}

/// Bracketing node indices and the (possibly out-of-[0,1]) blend weight.
///
/// Single-node axes are constant along that dimension.
fn bracket(axis: &[f64], x: f64) -> (usize, usize, f64) {
    let n = axis.len();
    if n < 2 {
        return (0, 0, 0.0);
    }
    let upper = axis.partition_point(|a| *a <= x);
    let i0 = upper.saturating_sub(1).min(n - 2);
    let i1 = i0 + 1;
    let w = (x - axis[i0]) / (axis[i1] - axis[i0]);
    (i0, i1, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_table() -> EcmTable {
        // OCV = 3 + soc + 0.01*T, R0 = 0.01 + 0.0001*T
        EcmTable::from_fn(vec![0.0, 0.5, 1.0], vec![0.0, 20.0, 40.0], |s, t| EcmParams {
            ocv: 3.0 + s + 0.01 * t,
            r0: 0.01 + 0.0001 * t,
            r1: 0.005,
            r2: 0.005,
            c1: 500.0,
            c2: 5000.0,
        })
        .unwrap()
    }

    #[test]
    fn reproduces_grid_nodes() {
        let table = linear_table();
        let p = table.interpolate(0.5, 20.0);
        assert!((p.ocv - 3.7).abs() < 1e-12);
        assert!((p.r0 - 0.012).abs() < 1e-12);
    }

    #[test]
    fn interpolates_between_nodes() {
        let table = linear_table();
        let p = table.interpolate(0.25, 30.0);
        assert!((p.ocv - (3.0 + 0.25 + 0.3)).abs() < 1e-12);
        assert!((p.r0 - 0.013).abs() < 1e-12);
    }

    #[test]
    fn extrapolates_linearly_outside_grid() {
        let table = linear_table();
        let p = table.interpolate(1.2, 60.0);
        assert!((p.ocv - (3.0 + 1.2 + 0.6)).abs() < 1e-9);
        let q = table.interpolate(-0.1, -10.0);
        assert!((q.ocv - (3.0 - 0.1 - 0.1)).abs() < 1e-9);
        assert!(!table.contains(1.2, 60.0));
        assert!(table.contains(0.3, 10.0));
    }

    #[test]
    fn reference_matches_mock_cell() {
        let table = EcmTable::reference();
        let p = table.interpolate(0.8, 26.85);
        assert!((p.ocv - (2.5 + 0.8 * 1.7)).abs() < 1e-12);
        assert!((p.r0 - 0.02).abs() < 1e-15);
        assert!((p.c2 - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_shapes() {
        let err = EcmTable::new(vec![0.0, 1.0], vec![25.0], vec![EcmParams::default()]);
        assert!(matches!(err, Err(ParamsError::ShapeMismatch { expected: 2, found: 1 })));

        let err = EcmTable::new(vec![1.0, 0.0], vec![25.0], vec![EcmParams::default(); 2]);
        assert!(matches!(err, Err(ParamsError::UnsortedAxis { axis: "soc", .. })));

        let err = EcmTable::new(vec![], vec![25.0], vec![]);
        assert!(matches!(err, Err(ParamsError::EmptyAxis { axis: "soc" })));
    }

    #[test]
    fn single_temperature_node_is_constant_in_temperature() {
        let table = EcmTable::from_fn(vec![0.0, 1.0], vec![25.0], |s, _| EcmParams {
            ocv: 3.0 + s,
            ..EcmParams::default()
        })
        .unwrap();
        let a = table.interpolate(0.5, -20.0);
        let b = table.interpolate(0.5, 80.0);
        assert_eq!(a, b);
        assert!((a.ocv - 3.5).abs() < 1e-12);
    }
}
