use serde::{Deserialize, Serialize};

use super::types::{BusPower, Device, DeviceContext};

/// Which of the three loadshapes drives a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadClass {
    Residential,
    Commercial,
    Industrial,
}

impl LoadClass {
    /// Class for the load at `position` in definition order.
    ///
    /// Classes repeat in the pattern residential, commercial, industrial,
    /// industrial.
    pub fn for_position(position: usize) -> Self {
        match position % 4 {
            0 => Self::Residential,
            1 => Self::Commercial,
            _ => Self::Industrial,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Residential => 0,
            Self::Commercial => 1,
            Self::Industrial => 2,
        }
    }

    /// Loadshape name used in circuit commands (`lshape_1` .. `lshape_3`).
    pub fn shape_name(self) -> &'static str {
        match self {
            Self::Residential => "lshape_1",
            Self::Commercial => "lshape_2",
            Self::Industrial => "lshape_3",
        }
    }

    pub fn from_shape_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lshape_1" | "residential" => Some(Self::Residential),
            "lshape_2" | "commercial" => Some(Self::Commercial),
            "lshape_3" | "industrial" => Some(Self::Industrial),
            _ => None,
        }
    }
}

/// A constant-power load scaled by its loadshape and the circuit load multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub name: String,
    pub bus: String,
    /// Nominal active demand (kW).
    pub kw: f64,
    /// Nominal reactive demand (kvar).
    pub kvar: f64,
    pub class: LoadClass,
    pub enabled: bool,
    /// Global multiplier applied on top of the loadshape.
    pub load_mult: f64,
}

impl Load {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, kw: f64, kvar: f64, class: LoadClass) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            kw,
            kvar,
            class,
            enabled: true,
            load_mult: 1.0,
        }
    }
}

impl Device for Load {
    fn bus(&self) -> &str {
        &self.bus
    }

    fn power(&self, context: &DeviceContext<'_>) -> BusPower {
        if !self.enabled {
            return BusPower::default();
        }
        let m = context.profiles.loadshape(self.class).value_at(context.interval) * self.load_mult;
        BusPower::new(self.kw * m, self.kvar * m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSet;

    #[test]
    fn class_pattern_repeats_every_four_loads() {
        let classes: Vec<LoadClass> = (0..8).map(LoadClass::for_position).collect();
        assert_eq!(
            classes,
            vec![
                LoadClass::Residential,
                LoadClass::Commercial,
                LoadClass::Industrial,
                LoadClass::Industrial,
                LoadClass::Residential,
                LoadClass::Commercial,
                LoadClass::Industrial,
                LoadClass::Industrial,
            ]
        );
    }

    #[test]
    fn shape_names_round_trip() {
        for class in [LoadClass::Residential, LoadClass::Commercial, LoadClass::Industrial] {
            assert_eq!(LoadClass::from_shape_name(class.shape_name()), Some(class));
        }
        assert_eq!(LoadClass::from_shape_name("LSHAPE_2"), Some(LoadClass::Commercial));
        assert_eq!(LoadClass::from_shape_name("lshape_9"), None);
    }

    #[test]
    fn power_scales_with_shape_and_multiplier() {
        let profiles = ProfileSet::constant(0.0, 25.0, 0.5);
        let mut load = Load::new("s1", "b1", 100.0, 40.0, LoadClass::Residential);
        load.load_mult = 1.25;
        let p = load.power(&DeviceContext::new(3, &profiles));
        assert!((p.kw - 62.5).abs() < 1e-12);
        assert!((p.kvar - 25.0).abs() < 1e-12);
    }

    #[test]
    fn disabled_load_draws_nothing() {
        let profiles = ProfileSet::constant(0.0, 25.0, 1.0);
        let mut load = Load::new("s1", "b1", 100.0, 40.0, LoadClass::Industrial);
        load.enabled = false;
        assert_eq!(load.power(&DeviceContext::new(0, &profiles)), BusPower::default());
    }
}
