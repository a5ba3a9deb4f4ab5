//! User-supplied ECM parameter tables.
//!
//! A table file holds one dataset per SOH bucket, each with a charge and a
//! discharge table. Grids are indexed `[soc][temperature]`. A missing
//! `soh_mid` bucket falls back to `soh_high`, a missing `soh_low` to the mid
//! one.

use ps_params::{EcmParams, EcmTable, ParameterProvider, ParamsError, SohDataset};
use serde::{Deserialize, Serialize};

use crate::ProjectResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterTablesDoc {
    #[serde(rename = "soh_high")]
    pub high: DatasetDef,
    #[serde(rename = "soh_mid", default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<DatasetDef>,
    #[serde(rename = "soh_low", default, skip_serializing_if = "Option::is_none")]
    pub low: Option<DatasetDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetDef {
    pub charge: TableDef,
    pub discharge: TableDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDef {
    pub soc: Vec<f64>,
    #[serde(rename = "temperatures_c")]
    pub temperature_c: Vec<f64>,
    pub ocv: Vec<Vec<f64>>,
    pub r0: Vec<Vec<f64>>,
    pub r1: Vec<Vec<f64>>,
    pub r2: Vec<Vec<f64>>,
    pub c1: Vec<Vec<f64>>,
    pub c2: Vec<Vec<f64>>,
}

impl TableDef {
    pub fn to_table(&self) -> Result<EcmTable, ParamsError> {
        let (n_soc, n_temp) = (self.soc.len(), self.temperature_c.len());
        let expected = n_soc * n_temp;
        let grids = [&self.ocv, &self.r0, &self.r1, &self.r2, &self.c1, &self.c2];
        for grid in grids {
            let found: usize = grid.iter().map(Vec::len).sum();
            if grid.len() != n_soc || grid.iter().any(|row| row.len() != n_temp) {
                return Err(ParamsError::ShapeMismatch { expected, found });
            }
        }

        let mut values = Vec::with_capacity(expected);
        for i in 0..n_soc {
            for j in 0..n_temp {
                values.push(EcmParams {
                    ocv: self.ocv[i][j],
                    r0: self.r0[i][j],
                    r1: self.r1[i][j],
                    r2: self.r2[i][j],
                    c1: self.c1[i][j],
                    c2: self.c2[i][j],
                });
            }
        }
        EcmTable::new(self.soc.clone(), self.temperature_c.clone(), values)
    }
}

impl DatasetDef {
    pub fn to_dataset(&self) -> Result<SohDataset, ParamsError> {
        Ok(SohDataset {
            charge: self.charge.to_table()?,
            discharge: self.discharge.to_table()?,
        })
    }
}

impl ParameterTablesDoc {
    pub fn to_provider(&self) -> ProjectResult<ParameterProvider> {
        let high = self.high.to_dataset()?;
        let mid = match &self.mid {
            Some(d) => d.to_dataset()?,
            None => high.clone(),
        };
        let low = match &self.low {
            Some(d) => d.to_dataset()?,
            None => mid.clone(),
        };
        Ok(ParameterProvider::new(high, mid, low))
    }
}
