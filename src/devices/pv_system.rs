use crate::profile::XyCurve;

use super::types::{BusPower, Device, DeviceContext};

/// A grid-tied PV array with a smart inverter.
///
/// Active output follows irradiance and temperature:
/// `Pdc = Pmpp * irradiance * pt_curve(T)`, `Pac = Pdc * eff(Pdc / kVA)`,
/// capped at the inverter rating. The inverter switches on when `Pdc`
/// reaches `pct_cutin` percent of kVA and off when it drops below
/// `pct_cutout`.
///
/// Reactive output is the commanded setpoint, clamped to `+/- kvar_max`
/// when injected into the network. It does not depend on the inverter
/// on/off state.
#[derive(Debug, Clone)]
pub struct PvSystem {
    pub name: String,
    pub bus: String,
    /// Inverter rating (kVA).
    pub kva: f64,
    /// Array maximum-power-point rating at 1 pu irradiance and 25 C (kW).
    pub pmpp: f64,
    /// Symmetric reactive power limit (kvar).
    pub kvar_max: f64,
    pub pct_cutin: f64,
    pub pct_cutout: f64,
    /// Base irradiance multiplying the irradiance profile.
    pub irradiance_scale: f64,
    pub efficiency: XyCurve,
    pub power_temperature: XyCurve,
    kvar_setpoint: f64,
    inverter_on: bool,
}

impl PvSystem {
    /// Creates a PV system with the default efficiency and temperature curves.
    ///
    /// # Arguments
    ///
    /// * `name` - Element name, e.g. `pv890`
    /// * `bus` - Connection bus
    /// * `kva` - Inverter rating
    /// * `pmpp` - Array rating
    /// * `kvar_max` - Reactive limit, applied symmetrically
    pub fn new(name: impl Into<String>, bus: impl Into<String>, kva: f64, pmpp: f64, kvar_max: f64) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            kva: kva.max(0.0),
            pmpp: pmpp.max(0.0),
            kvar_max: kvar_max.abs(),
            pct_cutin: 0.0,
            pct_cutout: 0.0,
            irradiance_scale: 1.0,
            efficiency: XyCurve::pv_efficiency(),
            power_temperature: XyCurve::pv_power_temperature(),
            kvar_setpoint: 0.0,
            inverter_on: false,
        }
    }

    /// DC output before the inverter (kW).
    pub fn dc_kw(&self, context: &DeviceContext<'_>) -> f64 {
        let irradiance = context.profiles.irradiance.value_at(context.interval) * self.irradiance_scale;
        let temperature = context.profiles.temperature.value_at(context.interval);
        (self.pmpp * irradiance * self.power_temperature.value(temperature)).max(0.0)
    }

    /// Updates the inverter on/off state for the interval in `context`.
    pub fn update_inverter(&mut self, context: &DeviceContext<'_>) {
        if self.kva <= 0.0 {
            self.inverter_on = false;
            return;
        }
        let pct = 100.0 * self.dc_kw(context) / self.kva;
        if self.inverter_on {
            if pct < self.pct_cutout {
                self.inverter_on = false;
            }
        } else if pct >= self.pct_cutin {
            self.inverter_on = true;
        }
    }

    /// AC active output (kW) for the interval in `context`.
    pub fn ac_kw(&self, context: &DeviceContext<'_>) -> f64 {
        if !self.inverter_on || self.kva <= 0.0 {
            return 0.0;
        }
        let pdc = self.dc_kw(context);
        (pdc * self.efficiency.value(pdc / self.kva)).min(self.kva)
    }

    /// Commands a reactive power setpoint (kvar, positive injects).
    pub fn set_kvar(&mut self, kvar: f64) {
        self.kvar_setpoint = kvar;
    }

    /// The commanded reactive setpoint.
    pub fn kvar(&self) -> f64 {
        self.kvar_setpoint
    }

    /// Reactive power actually injected into the network.
    pub fn injected_kvar(&self) -> f64 {
        self.kvar_setpoint.clamp(-self.kvar_max, self.kvar_max)
    }

    pub fn is_on(&self) -> bool {
        self.inverter_on
    }

    /// Returns the inverter to its power-up state: off, zero kvar.
    pub fn reset(&mut self) {
        self.kvar_setpoint = 0.0;
        self.inverter_on = false;
    }
}

impl Device for PvSystem {
    fn bus(&self) -> &str {
        &self.bus
    }

    /// Negative: the array injects both P and Q.
    fn power(&self, context: &DeviceContext<'_>) -> BusPower {
        BusPower::new(-self.ac_kw(context), -self.injected_kvar())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSet;

    fn pv() -> PvSystem {
        PvSystem::new("pv890", "890", 550.0, 500.0, 242.0)
    }

    #[test]
    fn full_sun_at_25c_hits_high_efficiency() {
        let profiles = ProfileSet::constant(1.0, 25.0, 1.0);
        let ctx = DeviceContext::new(0, &profiles);
        let mut pv = pv();
        pv.update_inverter(&ctx);
        assert!(pv.is_on());
        assert!((pv.dc_kw(&ctx) - 500.0).abs() < 1e-9);
        // eff(500/550) interpolated between 0.9 -> 0.97 and 1.0 -> 0.99
        let eff = 0.97 + (500.0 / 550.0 - 0.9) * 0.2;
        assert!((pv.ac_kw(&ctx) - 500.0 * eff).abs() < 1e-9);
    }

    #[test]
    fn hot_panels_derate() {
        let cool = ProfileSet::constant(1.0, 25.0, 1.0);
        let hot = ProfileSet::constant(1.0, 50.0, 1.0);
        let pv = pv();
        let a = pv.dc_kw(&DeviceContext::new(0, &cool));
        let b = pv.dc_kw(&DeviceContext::new(0, &hot));
        assert!((b / a - 0.75).abs() < 1e-9);
    }

    #[test]
    fn inverter_stays_off_below_cutin() {
        let dark = ProfileSet::constant(0.01, 25.0, 1.0);
        let mut pv = pv();
        pv.pct_cutin = 5.0;
        pv.pct_cutout = 5.0;
        let ctx = DeviceContext::new(0, &dark);
        pv.update_inverter(&ctx);
        assert!(!pv.is_on());
        assert_eq!(pv.ac_kw(&ctx), 0.0);
    }

    #[test]
    fn cutout_hysteresis() {
        let mut pv = pv();
        pv.pct_cutin = 10.0;
        pv.pct_cutout = 2.0;
        let bright = ProfileSet::constant(0.5, 25.0, 1.0);
        let dim = ProfileSet::constant(0.05, 25.0, 1.0);
        pv.update_inverter(&DeviceContext::new(0, &dim));
        assert!(!pv.is_on(), "5% of rating is below the 10% cut-in");
        pv.update_inverter(&DeviceContext::new(0, &bright));
        assert!(pv.is_on());
        pv.update_inverter(&DeviceContext::new(0, &dim));
        assert!(pv.is_on(), "5% of rating is above the 2% cut-out");
    }

    #[test]
    fn injected_kvar_is_clamped_but_setpoint_is_reported() {
        let mut pv = pv();
        pv.set_kvar(300.0);
        assert_eq!(pv.kvar(), 300.0);
        assert_eq!(pv.injected_kvar(), 242.0);
        pv.set_kvar(-500.0);
        assert_eq!(pv.injected_kvar(), -242.0);
    }

    #[test]
    fn kvar_flows_at_night() {
        let night = ProfileSet::constant(0.0, 15.0, 1.0);
        let mut pv = pv();
        pv.set_kvar(50.0);
        let ctx = DeviceContext::new(0, &night);
        pv.update_inverter(&ctx);
        let p = pv.power(&ctx);
        assert_eq!(p.kw, 0.0);
        assert_eq!(p.kvar, -50.0);
    }

    #[test]
    fn reset_clears_setpoint() {
        let mut pv = pv();
        pv.set_kvar(10.0);
        pv.reset();
        assert_eq!(pv.kvar(), 0.0);
        assert!(!pv.is_on());
    }
}
