use chrono::NaiveDateTime;

use crate::devices::baseload::LoadProfile;
use crate::devices::load::LoadClass;
use crate::devices::solar::{SolarProfile, TemperatureProfile};
use crate::error::{Error, Result};

use super::TimeSeries;

/// The interval series shared by every device in a circuit.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    /// PV irradiance in per unit of the array's rating.
    pub irradiance: TimeSeries,
    /// Ambient temperature in degrees C.
    pub temperature: TimeSeries,
    loadshapes: [TimeSeries; 3],
}

impl ProfileSet {
    pub fn new(irradiance: TimeSeries, temperature: TimeSeries, loadshapes: [TimeSeries; 3]) -> Self {
        Self {
            irradiance,
            temperature,
            loadshapes,
        }
    }

    /// Profiles that hold the same values at every interval.
    pub fn constant(irradiance: f64, temperature_c: f64, load_multiplier: f64) -> Self {
        Self {
            irradiance: TimeSeries::constant("irradiance", irradiance),
            temperature: TimeSeries::constant("temperature", temperature_c),
            loadshapes: [
                TimeSeries::constant("lshape_1", load_multiplier),
                TimeSeries::constant("lshape_2", load_multiplier),
                TimeSeries::constant("lshape_3", load_multiplier),
            ],
        }
    }

    /// Seeded synthetic profiles covering `n` intervals of `step_minutes`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Profile` if `n` is zero or `step_minutes` does not
    /// divide a day into at least 24 intervals.
    pub fn synthetic(n: usize, step_minutes: u32, seed: u64) -> Result<Self> {
        if step_minutes == 0 || 1440 % step_minutes != 0 || 1440 / step_minutes < 24 {
            return Err(Error::profile(
                "synthetic",
                format!("step of {step_minutes} minutes must divide a day into >= 24 intervals"),
            ));
        }
        let steps_per_day = (1440 / step_minutes) as usize;
        let start = NaiveDateTime::default();
        let series = |name: &str, values: Vec<f64>| {
            TimeSeries::from_values(name, start, step_minutes, values)
        };

        let irradiance = SolarProfile::new(steps_per_day, 0.9, 0.25, seed).generate(n);
        let temperature = TemperatureProfile::new(25.0, 8.0, steps_per_day).generate(n);
        let residential = LoadProfile::residential(steps_per_day, seed.wrapping_add(1)).generate(n);
        let commercial = LoadProfile::commercial(steps_per_day, seed.wrapping_add(2)).generate(n);
        let industrial = LoadProfile::industrial(steps_per_day, seed.wrapping_add(3)).generate(n);

        Ok(Self {
            irradiance: series("irradiance", irradiance)?,
            temperature: series("temperature", temperature)?,
            loadshapes: [
                series("lshape_1", residential)?,
                series("lshape_2", commercial)?,
                series("lshape_3", industrial)?,
            ],
        })
    }

    pub fn loadshape(&self, class: LoadClass) -> &TimeSeries {
        &self.loadshapes[class.index()]
    }

    /// Replaces the multiplier series used by loads of `class`.
    pub fn set_loadshape(&mut self, class: LoadClass, series: TimeSeries) {
        self.loadshapes[class.index()] = series;
    }

    /// Number of intervals before the irradiance profile repeats.
    pub fn len(&self) -> usize {
        self.irradiance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.irradiance.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_covers_requested_intervals() {
        let set = ProfileSet::synthetic(96 * 2, 15, 42).unwrap();
        assert_eq!(set.len(), 192);
        assert_eq!(set.temperature.len(), 192);
        assert_eq!(set.loadshape(LoadClass::Industrial).len(), 192);
    }

    #[test]
    fn synthetic_rejects_odd_steps() {
        assert!(ProfileSet::synthetic(10, 0, 1).is_err());
        assert!(ProfileSet::synthetic(10, 7, 1).is_err());
        assert!(ProfileSet::synthetic(10, 120, 1).is_err());
        assert!(ProfileSet::synthetic(0, 15, 1).is_err());
    }

    #[test]
    fn constant_profiles_repeat_forever() {
        let set = ProfileSet::constant(0.8, 25.0, 1.0);
        assert_eq!(set.irradiance.value_at(12345), 0.8);
        assert_eq!(set.loadshape(LoadClass::Commercial).value_at(7), 1.0);
    }
}
