use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// A radial distribution feeder in per unit on `base_kva`.
///
/// Buses are implied by the line endpoints and the source bus. Lines
/// flagged as switches can be opened and closed at run time; a switch with
/// `normally_open = true` is a tie.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeederModel {
    pub name: String,
    /// Three-phase power base (kVA).
    pub base_kva: f64,
    pub source_bus: String,
    /// Substation voltage held at the source bus (pu).
    #[serde(default = "default_source_pu")]
    pub source_pu: f64,
    #[serde(default, rename = "line")]
    pub lines: Vec<LineDef>,
    #[serde(default, rename = "load")]
    pub loads: Vec<LoadDef>,
}

fn default_source_pu() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineDef {
    pub name: String,
    pub from: String,
    pub to: String,
    pub r_pu: f64,
    pub x_pu: f64,
    #[serde(default)]
    pub switch: bool,
    #[serde(default)]
    pub normally_open: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadDef {
    pub name: String,
    pub bus: String,
    pub kw: f64,
    pub kvar: f64,
    /// Loadshape name (`lshape_1` .. `lshape_3`); assigned by position when absent.
    #[serde(default)]
    pub shape: Option<String>,
}

impl LineDef {
    pub fn new(name: &str, from: &str, to: &str, r_pu: f64, x_pu: f64) -> Self {
        Self {
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            r_pu,
            x_pu,
            switch: false,
            normally_open: false,
        }
    }

    /// A near-zero impedance switch.
    pub fn switch(name: &str, from: &str, to: &str, normally_open: bool) -> Self {
        Self {
            switch: true,
            normally_open,
            ..Self::new(name, from, to, 1e-5, 1e-5)
        }
    }
}

impl LoadDef {
    pub fn new(name: &str, bus: &str, kw: f64, kvar: f64) -> Self {
        Self {
            name: name.to_string(),
            bus: bus.to_string(),
            kw,
            kvar,
            shape: None,
        }
    }
}

impl FeederModel {
    /// Reads a feeder from a TOML file and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadFile`, `Error::Toml`, or the validation error.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a feeder from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Toml` for malformed input or the validation error.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let model: Self = toml::from_str(s)?;
        model.validate()?;
        Ok(model)
    }

    /// Bus names in first-seen order, source first.
    pub fn bus_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let all = std::iter::once(&self.source_bus)
            .chain(self.lines.iter().flat_map(|l| [&l.from, &l.to]));
        for bus in all {
            let bus = bus.to_ascii_lowercase();
            if seen.insert(bus.clone()) {
                names.push(bus);
            }
        }
        names
    }

    /// Checks ratings, names and references.
    ///
    /// # Errors
    ///
    /// Returns `Error::Command` naming the first offending element.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(Error::command(format!("compile {}", self.name), message));
        if !(self.base_kva > 0.0) {
            return fail("base_kva must be > 0".into());
        }
        if !(self.source_pu > 0.5 && self.source_pu < 1.5) {
            return fail(format!("source_pu {} outside (0.5, 1.5)", self.source_pu));
        }
        let mut names = HashSet::new();
        for line in &self.lines {
            if !names.insert(line.name.to_ascii_lowercase()) {
                return fail(format!("duplicate line \"{}\"", line.name));
            }
            if line.from.eq_ignore_ascii_case(&line.to) {
                return fail(format!("line \"{}\" connects bus \"{}\" to itself", line.name, line.from));
            }
            if line.r_pu < 0.0 || line.x_pu < 0.0 {
                return fail(format!("line \"{}\" has negative impedance", line.name));
            }
            if line.normally_open && !line.switch {
                return fail(format!("line \"{}\" is normally open but not a switch", line.name));
            }
        }
        let buses: HashSet<String> = self.bus_names().into_iter().collect();
        let mut load_names = HashSet::new();
        for load in &self.loads {
            if !load_names.insert(load.name.to_ascii_lowercase()) {
                return fail(format!("duplicate load \"{}\"", load.name));
            }
            if !buses.contains(&load.bus.to_ascii_lowercase()) {
                return fail(format!("load \"{}\" on unknown bus \"{}\"", load.name, load.bus));
            }
        }
        Ok(())
    }
}
