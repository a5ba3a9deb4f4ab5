// ps-core/src/units.rs

use uom::si::f64::{
    ElectricCharge as UomElectricCharge, Energy as UomEnergy,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Charge = UomElectricCharge;
pub type Energy = UomEnergy;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn ah(v: f64) -> Charge {
    use uom::si::electric_charge::ampere_hour;
    Charge::new::<ampere_hour>(v)
}

/// Absolute temperature in degrees Celsius (lookup tables are indexed in °C).
#[inline]
pub fn celsius(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

/// Charge in coulombs (ampere-seconds).
#[inline]
pub fn coulombs(q: Charge) -> f64 {
    use uom::si::electric_charge::coulomb;
    q.get::<coulomb>()
}

/// Joules to kilowatt-hours.
#[inline]
pub fn kwh_from_joules(j: f64) -> f64 {
    use uom::si::energy::{joule, kilowatt_hour};
    Energy::new::<joule>(j).get::<kilowatt_hour>()
}

pub mod constants {
    /// Seconds per calendar day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
}
