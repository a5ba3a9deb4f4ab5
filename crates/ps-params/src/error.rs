//! Error types for parameter table construction.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("Axis {axis} must not be empty")]
    EmptyAxis { axis: &'static str },

    #[error("Axis {axis} must be strictly increasing (at index {index})")]
    UnsortedAxis { axis: &'static str, index: usize },

    #[error("Table shape mismatch: expected {expected} grid points, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("Non-finite table value for {what} at SOC node {soc_index}, temperature node {temp_index}")]
    NonFinite {
        what: &'static str,
        soc_index: usize,
        temp_index: usize,
    },
}

pub type ParamsResult<T> = Result<T, ParamsError>;
