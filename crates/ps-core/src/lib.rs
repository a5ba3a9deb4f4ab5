//! ps-core: stable foundation for packsim.
//!
//! Contains:
//! - units (uom SI temperature/time/charge helpers)
//! - numeric (finite checks, fixed-decimal rounding)
//! - ids (compact cell and group identifiers)
//! - profile (module current time series)
//! - dedup (warn-once log de-duplication)
//! - timing (opt-in accumulating timers)
//! - error (shared error types)

pub mod dedup;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod profile;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use dedup::WarnOnce;
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use profile::DriveProfile;
pub use units::*;
