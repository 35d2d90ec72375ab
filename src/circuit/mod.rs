//! Distribution circuit: feeder topology, devices, command language and
//! power-flow solution.

pub mod clock;
pub mod command;
pub mod feeder;
pub mod presets;
pub mod solver;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::devices::{BusPower, Device, DeviceContext, Load, LoadClass, PvSystem};
use crate::error::{Error, Result};
use crate::profile::{ProfileSet, XyCurve};

use clock::{SolutionClock, SolveMode};
use command::{Command, ElementClass, Property, bus_name, parse_list, parse_step_minutes};
use feeder::FeederModel;
use solver::{Branch, Solution, SolverSettings, Topology};

/// Properties accepted on PV systems and loads but not modelled.
const IGNORED_PROPERTIES: &[&str] = &[
    "phases", "kv", "pf", "conn", "model", "tdaily", "temperature", "vminpu", "vmaxpu", "yearly",
];

#[derive(Debug, Clone)]
struct Line {
    name: String,
    branch: Branch,
    switch: bool,
    normally_open: bool,
}

/// Solution plus the device outputs it was computed with.
#[derive(Debug, Clone)]
pub struct CircuitSolution {
    pub flow: Solution,
    /// AC output of each PV system (kW), in definition order.
    pub pv_kw: Vec<f64>,
    /// Demand of loads on energised buses (kW).
    pub served_kw: f64,
    /// Demand of all enabled loads (kW).
    pub demand_kw: f64,
    pub interval: usize,
}

/// A solvable distribution circuit driven by text commands.
///
/// Start from [`Circuit::new`], then `compile` a feeder, add devices with
/// `new`, configure the solution with `set` and call `solve`.
///
/// `controlmode` and `maxcontroliter` are validated and stored so existing
/// scripts run unchanged; the solver has no control loop that reads them.
#[derive(Debug, Clone)]
pub struct Circuit {
    feeder_name: Option<String>,
    base_kva: f64,
    source: usize,
    source_pu: f64,
    bus_names: Vec<String>,
    bus_index: HashMap<String, usize>,
    lines: Vec<Line>,
    loads: Vec<Load>,
    pvs: Vec<PvSystem>,
    curves: HashMap<String, XyCurve>,
    profiles: ProfileSet,
    clock: SolutionClock,
    load_mult: f64,
    settings: SolverSettings,
    voltage_bases: Vec<f64>,
    control_mode: String,
    max_control_iter: usize,
    last_element: Option<(ElementClass, String)>,
    solution: Option<CircuitSolution>,
}

impl Circuit {
    /// An empty circuit whose devices will read `profiles`.
    pub fn new(profiles: ProfileSet) -> Self {
        Self {
            feeder_name: None,
            base_kva: 1000.0,
            source: 0,
            source_pu: 1.0,
            bus_names: Vec::new(),
            bus_index: HashMap::new(),
            lines: Vec::new(),
            loads: Vec::new(),
            pvs: Vec::new(),
            curves: HashMap::new(),
            profiles,
            clock: SolutionClock::new(60),
            load_mult: 1.0,
            settings: SolverSettings::default(),
            voltage_bases: Vec::new(),
            control_mode: "static".into(),
            max_control_iter: 10,
            last_element: None,
            solution: None,
        }
    }

    /// Parses and applies one command line.
    ///
    /// # Errors
    ///
    /// Returns the parse error or the error raised while applying it.
    pub fn command(&mut self, line: &str) -> Result<()> {
        self.command_in(line, None)
    }

    /// Applies every line of `script`; stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing command's error.
    pub fn run_script(&mut self, script: &str) -> Result<()> {
        self.run_script_in(script, None)
    }

    fn run_script_in(&mut self, script: &str, base_dir: Option<&Path>) -> Result<()> {
        for line in script.lines() {
            self.command_in(line, base_dir)?;
        }
        Ok(())
    }

    fn command_in(&mut self, line: &str, base_dir: Option<&Path>) -> Result<()> {
        let Some(cmd) = Command::parse(line)? else {
            return Ok(());
        };
        self.apply(cmd, base_dir)
    }

    /// Applies an already parsed command.
    ///
    /// # Errors
    ///
    /// Returns `Error::Command` for invalid values, `Error::UnknownElement`
    /// for missing targets, and solver errors from `solve`.
    pub fn apply(&mut self, cmd: Command, base_dir: Option<&Path>) -> Result<()> {
        match cmd {
            Command::Clear => {
                let profiles = self.profiles.clone();
                *self = Self::new(profiles);
                Ok(())
            }
            Command::Compile(target) => {
                let model = match presets::builtin(&target) {
                    Some(model) => model,
                    None => FeederModel::from_toml_file(&resolve(base_dir, Path::new(&target)))?,
                };
                self.install(model);
                Ok(())
            }
            Command::Redirect(path) => {
                let path = resolve(base_dir, &path);
                let script = fs::read_to_string(&path).map_err(|source| Error::ReadFile {
                    path: path.clone(),
                    source,
                })?;
                let dir = path.parent().map(Path::to_path_buf);
                self.run_script_in(&script, dir.as_deref())
            }
            Command::Set(props) => props.iter().try_for_each(|(k, v)| self.set_option(k, v)),
            Command::CalcVoltageBases => {
                self.require_compiled("calcvoltagebases")?;
                debug!(bases = ?self.voltage_bases, "voltage bases set");
                Ok(())
            }
            Command::Solve => self.solve(),
            Command::New {
                class,
                name,
                properties,
            } => {
                self.create(class, &name)?;
                self.last_element = Some((class, name.clone()));
                self.edit(class, &name, &properties)
            }
            Command::Edit {
                class,
                name,
                properties,
            } => {
                self.edit(class, &name, &properties)?;
                self.last_element = Some((class, name));
                Ok(())
            }
            Command::More(properties) => {
                let (class, name) = self
                    .last_element
                    .clone()
                    .ok_or_else(|| Error::command("~", "no element to continue"))?;
                self.edit(class, &name, &properties)
            }
        }
    }

    fn install(&mut self, model: FeederModel) {
        let profiles = self.profiles.clone();
        *self = Self {
            clock: self.clock.clone(),
            settings: self.settings,
            ..Self::new(profiles)
        };

        self.bus_names = model.bus_names();
        self.bus_index = self
            .bus_names
            .iter()
            .enumerate()
            .map(|(i, b)| (b.clone(), i))
            .collect();
        self.source = self.bus_index[&model.source_bus.to_ascii_lowercase()];
        self.base_kva = model.base_kva;
        self.source_pu = model.source_pu;

        self.lines = model
            .lines
            .iter()
            .map(|l| Line {
                name: l.name.to_ascii_lowercase(),
                branch: Branch {
                    from: self.bus_index[&l.from.to_ascii_lowercase()],
                    to: self.bus_index[&l.to.to_ascii_lowercase()],
                    r: l.r_pu,
                    x: l.x_pu,
                    closed: !l.normally_open,
                },
                switch: l.switch,
                normally_open: l.normally_open,
            })
            .collect();

        self.loads = model
            .loads
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let class = l
                    .shape
                    .as_deref()
                    .and_then(LoadClass::from_shape_name)
                    .unwrap_or_else(|| LoadClass::for_position(i));
                Load::new(l.name.to_ascii_lowercase(), l.bus.to_ascii_lowercase(), l.kw, l.kvar, class)
            })
            .collect();

        debug!(
            feeder = %model.name,
            buses = self.bus_names.len(),
            lines = self.lines.len(),
            loads = self.loads.len(),
            "compiled feeder"
        );
        self.feeder_name = Some(model.name);
    }

    fn require_compiled(&self, what: &str) -> Result<()> {
        if self.feeder_name.is_none() {
            return Err(Error::command(what, "no feeder compiled"));
        }
        Ok(())
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        let ctx = format!("set {key}={value}");
        match key {
            "mode" => {
                let mode = match value.to_ascii_lowercase().as_str() {
                    "snapshot" | "snap" => SolveMode::Snapshot,
                    "daily" | "duty" | "yearly" => SolveMode::Daily,
                    other => return Err(Error::command(ctx, format!("unknown mode \"{other}\""))),
                };
                self.clock.set_mode(mode);
            }
            "number" => self.clock.set_number(parse_usize(&ctx, value)?),
            "stepsize" | "h" => {
                let minutes = parse_step_minutes(value).map_err(|m| Error::command(&ctx, m))?;
                self.clock.set_step_minutes(minutes);
            }
            "hour" => self.clock.set_hour(parse_f64(&ctx, value)?),
            "loadmult" => {
                let mult = parse_f64(&ctx, value)?;
                if mult < 0.0 {
                    return Err(Error::command(ctx, "loadmult must be >= 0"));
                }
                self.load_mult = mult;
                self.loads.iter_mut().for_each(|l| l.load_mult = mult);
            }
            "controlmode" => {
                let mode = value.to_ascii_lowercase();
                if !["off", "static", "event", "time"].contains(&mode.as_str()) {
                    return Err(Error::command(ctx, format!("unknown control mode \"{mode}\"")));
                }
                self.control_mode = mode;
            }
            "voltagebases" => {
                self.voltage_bases = parse_list(value).map_err(|m| Error::command(&ctx, m))?;
            }
            "maxcontroliter" => self.max_control_iter = parse_usize(&ctx, value)?,
            "maxiterations" => self.settings.max_iterations = parse_usize(&ctx, value)?.max(1),
            "tolerance" => self.settings.tolerance = parse_f64(&ctx, value)?.abs(),
            _ => return Err(Error::command(ctx, format!("unknown option \"{key}\""))),
        }
        Ok(())
    }

    fn create(&mut self, class: ElementClass, name: &str) -> Result<()> {
        let exists = match class {
            ElementClass::PvSystem => self.pvs.iter().any(|p| p.name == name),
            ElementClass::Load => self.loads.iter().any(|l| l.name == name),
            ElementClass::XyCurve => self.curves.contains_key(name),
            ElementClass::SwtControl => {
                return Err(Error::command(
                    format!("new swtcontrol.{name}"),
                    "switches are defined by the feeder",
                ));
            }
        };
        if exists {
            return Err(Error::command(
                format!("new {}.{name}", class.as_str()),
                "element already exists",
            ));
        }
        match class {
            ElementClass::PvSystem => self.pvs.push(PvSystem::new(name, "", 0.0, 0.0, 0.0)),
            ElementClass::Load => {
                let class = LoadClass::for_position(self.loads.len());
                let mut load = Load::new(name, "", 0.0, 0.0, class);
                load.load_mult = self.load_mult;
                self.loads.push(load);
            }
            ElementClass::XyCurve => {
                self.curves.insert(name.to_string(), XyCurve::pv_efficiency());
            }
            ElementClass::SwtControl => {}
        }
        Ok(())
    }

    fn edit(&mut self, class: ElementClass, name: &str, properties: &[Property]) -> Result<()> {
        let ctx = format!("{}.{name}", class.as_str());
        match class {
            ElementClass::PvSystem => {
                let idx = self.pv_index(name)?;
                for (k, v) in properties {
                    self.edit_pv(idx, &ctx, k, v)?;
                }
            }
            ElementClass::Load => {
                let idx = self
                    .loads
                    .iter()
                    .position(|l| l.name == name)
                    .ok_or_else(|| unknown("load", name))?;
                for (k, v) in properties {
                    edit_load(&mut self.loads[idx], &ctx, k, v)?;
                }
            }
            ElementClass::SwtControl => {
                for (k, v) in properties {
                    match k.as_str() {
                        "action" | "state" | "normal" => {
                            let closed = match v.to_ascii_lowercase().as_str() {
                                "open" | "o" => false,
                                "close" | "closed" | "c" => true,
                                other => {
                                    return Err(Error::command(&ctx, format!("unknown switch action \"{other}\"")));
                                }
                            };
                            self.set_switch(name, closed)?;
                        }
                        "lock" | "delay" => {}
                        _ => return Err(Error::command(&ctx, format!("unknown property \"{k}\""))),
                    }
                }
            }
            ElementClass::XyCurve => self.edit_curve(name, &ctx, properties)?,
        }
        Ok(())
    }

    fn edit_pv(&mut self, idx: usize, ctx: &str, key: &str, value: &str) -> Result<()> {
        let curve = |curves: &HashMap<String, XyCurve>| {
            curves
                .get(&value.to_ascii_lowercase())
                .cloned()
                .ok_or_else(|| unknown("xycurve", value))
        };
        let pv = &mut self.pvs[idx];
        match key {
            "bus1" => pv.bus = bus_name(value),
            "kva" => pv.kva = parse_f64(ctx, value)?.max(0.0),
            "pmpp" => pv.pmpp = parse_f64(ctx, value)?.max(0.0),
            "kvarmax" | "kvarmaxabs" => pv.kvar_max = parse_f64(ctx, value)?.abs(),
            "%cutin" => pv.pct_cutin = parse_f64(ctx, value)?,
            "%cutout" => pv.pct_cutout = parse_f64(ctx, value)?,
            "irradiance" => pv.irradiance_scale = parse_f64(ctx, value)?.max(0.0),
            "kvar" => pv.set_kvar(parse_f64(ctx, value)?),
            "effcurve" => {
                let c = curve(&self.curves)?;
                self.pvs[idx].efficiency = c;
            }
            "p-tcurve" => {
                let c = curve(&self.curves)?;
                self.pvs[idx].power_temperature = c;
            }
            "daily" => {}
            k if IGNORED_PROPERTIES.contains(&k) => {}
            _ => return Err(Error::command(ctx, format!("unknown property \"{key}\""))),
        }
        Ok(())
    }

    fn edit_curve(&mut self, name: &str, ctx: &str, properties: &[Property]) -> Result<()> {
        let mut xs = None;
        let mut ys = None;
        for (k, v) in properties {
            match k.as_str() {
                "npts" => {
                    parse_usize(ctx, v)?;
                }
                "xarray" => xs = Some(parse_list(v).map_err(|m| Error::command(ctx, m))?),
                "yarray" => ys = Some(parse_list(v).map_err(|m| Error::command(ctx, m))?),
                _ => return Err(Error::command(ctx, format!("unknown property \"{k}\""))),
            }
        }
        if xs.is_none() && ys.is_none() {
            return Ok(());
        }
        let (Some(xs), Some(ys)) = (xs, ys) else {
            return Err(Error::command(ctx, "xarray and yarray must be given together"));
        };
        let curve = XyCurve::new(xs, ys)?;
        self.curves.insert(name.to_string(), curve);
        Ok(())
    }

    /// Solves the power flow at the current interval.
    ///
    /// In daily mode with `number > 1` the clock advances between solves
    /// and the last solution is kept.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownElement` for devices on missing buses,
    /// `Error::MeshedTopology` for loops and `Error::NotConverged` when the
    /// sweep fails.
    pub fn solve(&mut self) -> Result<()> {
        self.require_compiled("solve")?;
        for k in 0..self.clock.number() {
            if k > 0 {
                self.clock.tick();
            }
            self.solve_interval()?;
        }
        Ok(())
    }

    fn solve_interval(&mut self) -> Result<()> {
        let interval = self.clock.interval();
        let profiles = &self.profiles;
        let ctx = DeviceContext::new(interval, profiles);

        let mut bus_power = vec![BusPower::default(); self.bus_names.len()];
        let mut demand_kw = 0.0;
        let mut load_buses = Vec::with_capacity(self.loads.len());
        for load in &self.loads {
            let bus = lookup(&self.bus_index, load.bus())?;
            let p = load.power(&ctx);
            bus_power[bus] += p;
            demand_kw += p.kw;
            load_buses.push((bus, p.kw));
        }
        for pv in &mut self.pvs {
            pv.update_inverter(&ctx);
            let bus = lookup(&self.bus_index, pv.bus())?;
            bus_power[bus] += pv.power(&ctx);
        }
        let injections: Vec<(f64, f64)> = bus_power
            .iter()
            .map(|p| (p.kw / self.base_kva, p.kvar / self.base_kva))
            .collect();

        let branches: Vec<Branch> = self.lines.iter().map(|l| l.branch).collect();
        let topology = Topology::build(self.bus_names.len(), self.source, &branches, &self.bus_names)?;
        let flow = solver::solve(&topology, &branches, &injections, self.source_pu, &self.settings)
            .inspect_err(|e| warn!(interval, error = %e, "power flow failed"))?;

        let served_kw = load_buses
            .iter()
            .filter(|(bus, _)| topology.is_energized(*bus))
            .map(|(_, kw)| kw)
            .sum();
        let pv_kw = self.pvs.iter().map(|pv| pv.ac_kw(&ctx)).collect();

        self.solution = Some(CircuitSolution {
            flow,
            pv_kw,
            served_kw,
            demand_kw,
            interval,
        });
        Ok(())
    }

    /// Moves the clock to the next interval (daily mode).
    pub fn finish_time_step(&mut self) {
        self.clock.tick();
    }

    pub fn solution(&self) -> Result<&CircuitSolution> {
        self.solution.as_ref().ok_or(Error::NotSolved)
    }

    /// Voltage magnitude of `bus` in per unit; phase suffixes are ignored.
    pub fn bus_pu_voltage(&self, bus: &str) -> Result<f64> {
        let idx = lookup(&self.bus_index, &bus_name(bus))?;
        Ok(self.solution()?.flow.v_pu[idx])
    }

    /// Voltage magnitudes of every bus, in [`Circuit::bus_names`] order.
    pub fn all_bus_mag_pu(&self) -> Result<&[f64]> {
        Ok(&self.solution()?.flow.v_pu)
    }

    /// Voltages of energised buses above `threshold_pu`.
    pub fn energized_voltages(&self, threshold_pu: f64) -> Result<Vec<f64>> {
        let sol = &self.solution()?.flow;
        Ok(sol
            .v_pu
            .iter()
            .zip(&sol.energized)
            .filter(|(v, on)| **on && **v > threshold_pu)
            .map(|(v, _)| *v)
            .collect())
    }

    pub fn bus_names(&self) -> &[String] {
        &self.bus_names
    }

    pub fn feeder_name(&self) -> Option<&str> {
        self.feeder_name.as_deref()
    }

    pub fn pv_names(&self) -> Vec<&str> {
        self.pvs.iter().map(|p| p.name.as_str()).collect()
    }

    fn pv_index(&self, name: &str) -> Result<usize> {
        let name = name.to_ascii_lowercase();
        self.pvs
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| unknown("pvsystem", &name))
    }

    pub fn pv(&self, name: &str) -> Result<&PvSystem> {
        Ok(&self.pvs[self.pv_index(name)?])
    }

    /// AC active output of a PV system at the last solution (kW).
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownElement` for a missing PV and
    /// `Error::NotSolved` when the PV was added after the last solve.
    pub fn pv_kw(&self, name: &str) -> Result<f64> {
        let idx = self.pv_index(name)?;
        self.solution()?.pv_kw.get(idx).copied().ok_or(Error::NotSolved)
    }

    /// Commanded reactive power of a PV system (kvar).
    pub fn pv_kvar(&self, name: &str) -> Result<f64> {
        Ok(self.pv(name)?.kvar())
    }

    pub fn pv_kva_rated(&self, name: &str) -> Result<f64> {
        Ok(self.pv(name)?.kva)
    }

    pub fn set_pv_kvar(&mut self, name: &str, kvar: f64) -> Result<()> {
        let idx = self.pv_index(name)?;
        self.pvs[idx].set_kvar(kvar);
        Ok(())
    }

    /// Returns every PV system to zero kvar with its inverter off.
    pub fn reset_pvs(&mut self) {
        self.pvs.iter_mut().for_each(PvSystem::reset);
    }

    /// Switch names in feeder definition order.
    pub fn switch_names(&self) -> Vec<&str> {
        self.lines.iter().filter(|l| l.switch).map(|l| l.name.as_str()).collect()
    }

    fn switch_index(&self, name: &str) -> Result<usize> {
        let name = name.to_ascii_lowercase();
        self.lines
            .iter()
            .position(|l| l.switch && l.name == name)
            .ok_or_else(|| unknown("switch", &name))
    }

    pub fn set_switch(&mut self, name: &str, closed: bool) -> Result<()> {
        let idx = self.switch_index(name)?;
        self.lines[idx].branch.closed = closed;
        Ok(())
    }

    pub fn switch_closed(&self, name: &str) -> Result<bool> {
        Ok(self.lines[self.switch_index(name)?].branch.closed)
    }

    /// Puts every switch back in its normal state.
    pub fn restore_normal_switches(&mut self) {
        for line in self.lines.iter_mut().filter(|l| l.switch) {
            line.branch.closed = !line.normally_open;
        }
    }

    /// Checks that the closed lines form a radial network.
    ///
    /// # Errors
    ///
    /// Returns `Error::MeshedTopology` naming a bus on the loop.
    pub fn check_radial(&self) -> Result<()> {
        let branches: Vec<Branch> = self.lines.iter().map(|l| l.branch).collect();
        Topology::build(self.bus_names.len(), self.source, &branches, &self.bus_names).map(|_| ())
    }

    /// Sending-end active flow of a line at the last solution (kW).
    pub fn line_kw(&self, name: &str) -> Result<f64> {
        let name = name.to_ascii_lowercase();
        let idx = self
            .lines
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| unknown("line", &name))?;
        Ok(self.solution()?.flow.p_send[idx] * self.base_kva)
    }

    /// Active power drawn from the source at the last solution (kW).
    pub fn head_kw(&self) -> Result<f64> {
        Ok(self.solution()?.flow.p_source * self.base_kva)
    }

    pub fn served_load_kw(&self) -> Result<f64> {
        Ok(self.solution()?.served_kw)
    }

    pub fn interval(&self) -> usize {
        self.clock.interval()
    }

    pub fn set_interval(&mut self, interval: usize) {
        self.clock.set_interval(interval);
    }

    pub fn clock(&self) -> &SolutionClock {
        &self.clock
    }

    pub fn load_mult(&self) -> f64 {
        self.load_mult
    }

    pub fn voltage_bases(&self) -> &[f64] {
        &self.voltage_bases
    }

    pub fn control_mode(&self) -> &str {
        &self.control_mode
    }

    pub fn max_control_iter(&self) -> usize {
        self.max_control_iter
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }
}

fn edit_load(load: &mut Load, ctx: &str, key: &str, value: &str) -> Result<()> {
    match key {
        "bus1" => load.bus = bus_name(value),
        "kw" => load.kw = parse_f64(ctx, value)?,
        "kvar" => load.kvar = parse_f64(ctx, value)?,
        "pf" => {
            let pf = parse_f64(ctx, value)?;
            if !(pf > 0.0 && pf <= 1.0) {
                return Err(Error::command(ctx, "pf must be in (0, 1]"));
            }
            load.kvar = load.kw * pf.acos().tan();
        }
        "daily" => {
            load.class = LoadClass::from_shape_name(value)
                .ok_or_else(|| Error::command(ctx, format!("unknown loadshape \"{value}\"")))?;
        }
        "enabled" => {
            load.enabled = match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" => true,
                "false" | "no" | "n" => false,
                other => return Err(Error::command(ctx, format!("expected true/false, got \"{other}\""))),
            };
        }
        k if IGNORED_PROPERTIES.contains(&k) => {}
        _ => return Err(Error::command(ctx, format!("unknown property \"{key}\""))),
    }
    Ok(())
}

fn lookup(index: &HashMap<String, usize>, bus: &str) -> Result<usize> {
    index.get(bus).copied().ok_or_else(|| unknown("bus", bus))
}

fn unknown(kind: &'static str, name: &str) -> Error {
    Error::UnknownElement {
        kind,
        name: name.to_string(),
    }
}

fn parse_f64(ctx: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::command(ctx, format!("expected a number, got \"{value}\"")))
}

fn parse_usize(ctx: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|_| Error::command(ctx, format!("expected a whole number, got \"{value}\"")))
}

fn resolve(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
