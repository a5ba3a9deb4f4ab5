//! ECM parameter provider for packsim.
//!
//! Given a cell's SOC, temperature, SOH, aging factor and the current
//! direction, returns the six equivalent-circuit parameters by bilinear
//! interpolation over SOC×temperature tables. Tables are grouped into three
//! SOH buckets and two modes; each table is validated and packed once when
//! the provider is built.

pub mod ecm;
pub mod error;
pub mod provider;
pub mod table;

pub use ecm::{EcmParams, Mode};
pub use error::{ParamsError, ParamsResult};
pub use provider::{
    OCV_PLAUSIBLE_MAX, OCV_PLAUSIBLE_MIN, ParamAdvisory, ParameterProvider, SohBucket,
    SohDataset,
};
pub use table::{EcmTable, REFERENCE_TEMPERATURES_C};
