use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Profile has {times} time samples but {currents} current samples")]
    ProfileLength { times: usize, currents: usize },

    #[error("Profile time is not strictly increasing at sample {index} ({time_s} s)")]
    ProfileTimeOrder { index: usize, time_s: f64 },
}
