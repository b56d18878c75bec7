//! Physical quantities used in energy accounting.
//!
//! Each type wraps a single non-negative magnitude in a fixed unit (watts,
//! seconds, kilowatt-hours, kg CO2e per kWh). Negative magnitudes are
//! physically impossible inputs and are rejected at construction.

use std::ops::{Add, AddAssign};
use std::time::Duration;

use thiserror::Error;

/// Errors from quantity construction.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("Negative magnitude for {quantity}: {value}")]
    NegativeMagnitude { quantity: &'static str, value: f64 },
}

fn non_negative(quantity: &'static str, value: f64) -> Result<f64, UnitError> {
    // NaN fails the comparison and is rejected with the same error.
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(UnitError::NegativeMagnitude { quantity, value })
    }
}

/// Instantaneous electrical power in watts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Power {
    watts: f64,
}

impl Power {
    pub fn from_watts(watts: f64) -> Result<Self, UnitError> {
        Ok(Self {
            watts: non_negative("power (W)", watts)?,
        })
    }

    /// NVML reports device draw in milliwatts.
    pub fn from_milliwatts(milliwatts: f64) -> Result<Self, UnitError> {
        Ok(Self {
            watts: non_negative("power (mW)", milliwatts)? / 1_000.0,
        })
    }

    pub fn watts(&self) -> f64 {
        self.watts
    }
}

/// A wall-clock time span in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Time {
    seconds: f64,
}

impl Time {
    pub fn from_seconds(seconds: f64) -> Result<Self, UnitError> {
        Ok(Self {
            seconds: non_negative("time (s)", seconds)?,
        })
    }

    /// `Duration` is non-negative by construction, so this cannot fail.
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            seconds: duration.as_secs_f64(),
        }
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

/// Electrical energy in kilowatt-hours.
///
/// The only arithmetic exposed is addition: the tracker accumulates one
/// sample per scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Energy {
    kwh: f64,
}

impl Energy {
    pub fn from_kwh(kwh: f64) -> Result<Self, UnitError> {
        Ok(Self {
            kwh: non_negative("energy (kWh)", kwh)?,
        })
    }

    /// Rectangle-rule sample: instantaneous power held constant over `time`.
    ///
    /// `watts × seconds / 3_600_000` converts watt-seconds to kilowatt-hours.
    /// Both inputs are non-negative by construction, so the product is too.
    pub fn from_power_and_time(power: Power, time: Time) -> Self {
        Self {
            kwh: power.watts() * time.seconds() / 3_600_000.0,
        }
    }

    pub fn kwh(&self) -> f64 {
        self.kwh
    }
}

impl Add for Energy {
    type Output = Energy;

    fn add(self, rhs: Energy) -> Energy {
        Energy {
            kwh: self.kwh + rhs.kwh,
        }
    }
}

impl AddAssign for Energy {
    fn add_assign(&mut self, rhs: Energy) {
        self.kwh += rhs.kwh;
    }
}

/// CO2-equivalent mass emitted per kilowatt-hour of energy.
///
/// Emission-factor tables mix kg/kWh and g/kWh figures; both constructors
/// normalize to kg/kWh (kg = g / 1000).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct EmissionFactor {
    kg_per_kwh: f64,
}

impl EmissionFactor {
    pub fn from_kg_per_kwh(kg_per_kwh: f64) -> Result<Self, UnitError> {
        Ok(Self {
            kg_per_kwh: non_negative("emission factor (kg/kWh)", kg_per_kwh)?,
        })
    }

    pub fn from_g_per_kwh(g_per_kwh: f64) -> Result<Self, UnitError> {
        Ok(Self {
            kg_per_kwh: non_negative("emission factor (g/kWh)", g_per_kwh)? / 1_000.0,
        })
    }

    pub fn kg_per_kwh(&self) -> f64 {
        self.kg_per_kwh
    }

    /// Estimated emissions in kg CO2e for the given energy. Exact
    /// floating-point multiply; rounding is left to display code.
    pub fn emissions_for(&self, energy: Energy) -> f64 {
        self.kg_per_kwh * energy.kwh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_and_time_to_kwh() {
        // watts × seconds / 3_600_000 across a spread of magnitudes
        for (watts, seconds) in [(0.0, 10.0), (100.0, 5.0), (250.0, 15.0), (1_000.0, 3_600.0)] {
            let energy = Energy::from_power_and_time(
                Power::from_watts(watts).unwrap(),
                Time::from_seconds(seconds).unwrap(),
            );
            assert_eq!(energy.kwh(), watts * seconds / 3_600_000.0);
        }
    }

    #[test]
    fn test_negative_magnitudes_rejected() {
        assert!(Power::from_watts(-1.0).is_err());
        assert!(Power::from_milliwatts(-0.5).is_err());
        assert!(Time::from_seconds(-10.0).is_err());
        assert!(Energy::from_kwh(-0.1).is_err());
        assert!(EmissionFactor::from_kg_per_kwh(-0.3).is_err());
        assert!(Energy::from_kwh(f64::NAN).is_err());
    }

    #[test]
    fn test_energy_addition() {
        let mut total = Energy::default();
        total += Energy::from_kwh(1.5).unwrap();
        let sum = total + Energy::from_kwh(0.5).unwrap();
        assert_eq!(sum.kwh(), 2.0);
        assert_eq!(total.kwh(), 1.5);
    }

    #[test]
    fn test_milliwatt_conversion() {
        let power = Power::from_milliwatts(250_000.0).unwrap();
        assert_eq!(power.watts(), 250.0);
    }

    #[test]
    fn test_emission_factor_units() {
        let from_g = EmissionFactor::from_g_per_kwh(475.0).unwrap();
        let from_kg = EmissionFactor::from_kg_per_kwh(0.475).unwrap();
        assert_eq!(from_g.kg_per_kwh(), from_kg.kg_per_kwh());

        let energy = Energy::from_kwh(10.0).unwrap();
        assert!((from_kg.emissions_for(energy) - 4.75).abs() < 1e-12);
    }
}
