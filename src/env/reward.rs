//! Penalty-based reward for PV reactive-power control.
//!
//! Every function here is pure: it sees only device and bus measurements
//! and never touches the simulator.

use serde::{Deserialize, Serialize};

/// Which penalty terms make up the reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardVariant {
    /// Nameplate + standard-limit + voltage terms.
    #[default]
    Full,
    /// Voltage term only. The other terms are still evaluated so that
    /// violations are counted.
    VoltageOnly,
}

/// Reward constants. Kept per scenario; the 34-bus and 123-bus harnesses
/// do not share all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    pub variant: RewardVariant,
    /// Lower edge of the operating voltage band (pu).
    pub v_min: f64,
    /// Upper edge of the operating voltage band (pu).
    pub v_max: f64,
    /// Reactive capability required by the interconnection standard, as a
    /// fraction of rated kVA.
    pub standard_fraction: f64,
    /// Penalty added when the voltage leaves the band.
    pub voltage_limit_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            variant: RewardVariant::Full,
            v_min: 0.95,
            v_max: 1.05,
            standard_fraction: 0.44,
            voltage_limit_penalty: 1.0,
        }
    }
}

/// Individual terms of one reward evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RewardBreakdown {
    pub nameplate: f64,
    pub standard: f64,
    pub voltage: f64,
    pub total: f64,
    /// The standard-limit term was negative.
    pub q_violation: bool,
    /// The voltage was outside the band.
    pub voltage_violation: bool,
}

/// `0` when `|q|` fits in the inverter's remaining capability
/// `sqrt(s^2 - p^2)`, else `-1`. Headroom is 0 when `p` exceeds `s`.
pub fn nameplate_penalty(s: f64, p: f64, q: f64) -> f64 {
    let headroom = (s * s - p * p).max(0.0).sqrt();
    if q.abs() <= headroom { 0.0 } else { -1.0 }
}

/// `0` when `|q| <= fraction * s`, else the squared excess, negated.
pub fn standard_limit_penalty(s: f64, q: f64, fraction: f64) -> f64 {
    let limit = fraction * s.abs();
    let excess = q.abs() - limit;
    if excess <= 0.0 { 0.0 } else { -(excess * excess) }
}

/// Squared deviation from 1 pu, plus `limit_penalty` outside `[v_min, v_max]`.
pub fn voltage_penalty(v: f64, v_min: f64, v_max: f64, limit_penalty: f64) -> f64 {
    let deviation = -(v - 1.0).powi(2);
    if outside_band(v, v_min, v_max) {
        deviation - limit_penalty
    } else {
        deviation
    }
}

/// `-1` for every voltage outside `[v_min, v_max]`.
pub fn band_count_penalty(voltages: &[f64], v_min: f64, v_max: f64) -> f64 {
    -(voltages.iter().filter(|v| outside_band(**v, v_min, v_max)).count() as f64)
}

fn outside_band(v: f64, v_min: f64, v_max: f64) -> bool {
    v < v_min || v > v_max
}

impl RewardConfig {
    /// Scores one step.
    ///
    /// # Arguments
    ///
    /// * `s` - PV rated kVA
    /// * `p` - PV active output (kW)
    /// * `q` - PV reactive setpoint (kvar)
    /// * `v` - Bus voltage at the PV (pu)
    pub fn evaluate(&self, s: f64, p: f64, q: f64, v: f64) -> RewardBreakdown {
        let nameplate = nameplate_penalty(s, p, q);
        let standard = standard_limit_penalty(s, q, self.standard_fraction);
        let voltage = voltage_penalty(v, self.v_min, self.v_max, self.voltage_limit_penalty);
        let total = match self.variant {
            RewardVariant::Full => nameplate + standard + voltage,
            RewardVariant::VoltageOnly => voltage,
        };
        RewardBreakdown {
            nameplate,
            standard,
            voltage,
            total,
            q_violation: standard < 0.0,
            voltage_violation: outside_band(v, self.v_min, self.v_max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_reactive_terms() {
        assert_eq!(nameplate_penalty(66.0, 50.0, 40.0), 0.0);
        let standard = standard_limit_penalty(66.0, 40.0, 0.44);
        assert!((standard + 120.1216).abs() < 1e-9, "{standard}");
    }

    #[test]
    fn worked_example_voltage_term() {
        let v = voltage_penalty(1.06, 0.95, 1.05, 1.0);
        assert!((v + 1.0036).abs() < 1e-12, "{v}");
    }

    #[test]
    fn band_edges_are_inside() {
        assert!((voltage_penalty(1.05, 0.95, 1.05, 1.0) + 0.0025).abs() < 1e-12);
        assert!((voltage_penalty(0.95, 0.95, 1.05, 1.0) + 0.0025).abs() < 1e-12);
        assert_eq!(voltage_penalty(1.0, 0.95, 1.05, 1.0), 0.0);
    }

    #[test]
    fn nameplate_penalty_is_binary() {
        assert_eq!(nameplate_penalty(66.0, 50.0, 43.0), 0.0);
        assert_eq!(nameplate_penalty(66.0, 50.0, -44.0), -1.0);
        // No headroom when P exceeds S
        assert_eq!(nameplate_penalty(50.0, 60.0, 0.0), 0.0);
        assert_eq!(nameplate_penalty(50.0, 60.0, 1.0), -1.0);
    }

    #[test]
    fn standard_limit_is_symmetric() {
        let pos = standard_limit_penalty(66.0, 40.0, 0.44);
        let neg = standard_limit_penalty(66.0, -40.0, 0.44);
        assert_eq!(pos, neg);
        assert_eq!(standard_limit_penalty(66.0, 29.04, 0.44), 0.0);
    }

    #[test]
    fn band_count() {
        assert_eq!(band_count_penalty(&[1.0, 0.94, 1.06, 1.05], 0.95, 1.05), -2.0);
        assert_eq!(band_count_penalty(&[], 0.95, 1.05), 0.0);
    }

    #[test]
    fn voltage_only_still_counts_violations() {
        let config = RewardConfig {
            variant: RewardVariant::VoltageOnly,
            ..RewardConfig::default()
        };
        let r = config.evaluate(66.0, 50.0, 40.0, 1.06);
        assert!((r.total + 1.0036).abs() < 1e-12);
        assert!(r.q_violation);
        assert!(r.voltage_violation);
        assert!(r.standard < 0.0);
    }

    #[test]
    fn full_variant_sums_terms() {
        let r = RewardConfig::default().evaluate(66.0, 50.0, 40.0, 1.06);
        assert!((r.total - (r.nameplate + r.standard + r.voltage)).abs() < 1e-12);
        assert!((r.total + 121.1252).abs() < 1e-9);
    }

    #[test]
    fn limit_penalty_is_configurable() {
        let config = RewardConfig {
            voltage_limit_penalty: 5.0,
            ..RewardConfig::default()
        };
        let r = config.evaluate(66.0, 0.0, 0.0, 0.9);
        assert!((r.voltage + 5.01).abs() < 1e-12);
    }
}
