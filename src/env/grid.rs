//! Seam between environments and the power-flow simulator.

use crate::circuit::Circuit;
use crate::error::Result;

/// PV quantities read back after a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvReading {
    /// Active output (kW).
    pub kw: f64,
    /// Reactive setpoint (kvar).
    pub kvar: f64,
    /// Rated kVA.
    pub kva: f64,
}

/// What a PV control environment needs from the simulator.
pub trait GridSimulator {
    /// Restarts from a clean state at `start_index`: zero kvar setpoints,
    /// normal switch states, one solve.
    fn flat_start(&mut self, start_index: usize) -> Result<()>;

    /// Solves the current interval, then moves to the next one.
    fn advance(&mut self) -> Result<()>;

    /// Interval of the last solution.
    fn solved_interval(&self) -> Result<usize>;

    fn bus_voltage_pu(&self, bus: &str) -> Result<f64>;

    fn pv_reading(&self, pv: &str) -> Result<PvReading>;

    fn set_pv_kvar(&mut self, pv: &str, kvar: f64) -> Result<()>;
}

/// Additional switching access for restoration environments.
pub trait SwitchableGrid: GridSimulator {
    fn switch_names(&self) -> Vec<String>;

    fn set_switch(&mut self, name: &str, closed: bool) -> Result<()>;

    fn switch_closed(&self, name: &str) -> Result<bool>;

    fn restore_normal_switches(&mut self);

    /// True when the closed lines form a radial network.
    fn is_radial(&self) -> bool;

    /// Solves the current interval without advancing.
    fn solve(&mut self) -> Result<()>;

    /// Voltages of energised buses above `threshold_pu`.
    fn energized_voltages(&self, threshold_pu: f64) -> Result<Vec<f64>>;

    fn line_kw(&self, name: &str) -> Result<f64>;

    fn head_kw(&self) -> Result<f64>;

    fn served_load_kw(&self) -> Result<f64>;
}

impl GridSimulator for Circuit {
    fn flat_start(&mut self, start_index: usize) -> Result<()> {
        self.reset_pvs();
        self.restore_normal_switches();
        self.set_interval(start_index);
        Circuit::solve(self)
    }

    fn advance(&mut self) -> Result<()> {
        Circuit::solve(self)?;
        self.finish_time_step();
        Ok(())
    }

    fn solved_interval(&self) -> Result<usize> {
        Ok(self.solution()?.interval)
    }

    fn bus_voltage_pu(&self, bus: &str) -> Result<f64> {
        self.bus_pu_voltage(bus)
    }

    fn pv_reading(&self, pv: &str) -> Result<PvReading> {
        Ok(PvReading {
            kw: self.pv_kw(pv)?,
            kvar: self.pv_kvar(pv)?,
            kva: self.pv_kva_rated(pv)?,
        })
    }

    fn set_pv_kvar(&mut self, pv: &str, kvar: f64) -> Result<()> {
        Circuit::set_pv_kvar(self, pv, kvar)
    }
}

impl SwitchableGrid for Circuit {
    fn switch_names(&self) -> Vec<String> {
        Circuit::switch_names(self).into_iter().map(String::from).collect()
    }

    fn set_switch(&mut self, name: &str, closed: bool) -> Result<()> {
        Circuit::set_switch(self, name, closed)
    }

    fn switch_closed(&self, name: &str) -> Result<bool> {
        Circuit::switch_closed(self, name)
    }

    fn restore_normal_switches(&mut self) {
        Circuit::restore_normal_switches(self);
    }

    fn is_radial(&self) -> bool {
        self.check_radial().is_ok()
    }

    fn solve(&mut self) -> Result<()> {
        Circuit::solve(self)
    }

    fn energized_voltages(&self, threshold_pu: f64) -> Result<Vec<f64>> {
        Circuit::energized_voltages(self, threshold_pu)
    }

    fn line_kw(&self, name: &str) -> Result<f64> {
        Circuit::line_kw(self, name)
    }

    fn head_kw(&self) -> Result<f64> {
        Circuit::head_kw(self)
    }

    fn served_load_kw(&self) -> Result<f64> {
        Circuit::served_load_kw(self)
    }
}
