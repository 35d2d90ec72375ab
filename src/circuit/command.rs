//! Parser for the textual circuit command language.
//!
//! One command per line, case-insensitive verbs and property names:
//!
//! ```text
//! clear
//! compile ieee34
//! redirect scripts/setup.dss
//! set mode=daily number=1 stepsize=15m voltagebases=[69, 24.9, 4.16, 0.48]
//! new pvsystem.pv890 bus1=890 kva=550 pmpp=500 kvarmax=242
//! ~ %cutin=0.01 %cutout=0.01
//! pvsystem.pv890.kvar=25
//! edit swtcontrol.sw3 action=open
//! solve
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Element classes addressable by `new`, `edit` and property assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    PvSystem,
    Load,
    SwtControl,
    XyCurve,
}

impl ElementClass {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "pvsystem" => Some(Self::PvSystem),
            "load" => Some(Self::Load),
            "swtcontrol" | "switch" => Some(Self::SwtControl),
            "xycurve" => Some(Self::XyCurve),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PvSystem => "pvsystem",
            Self::Load => "load",
            Self::SwtControl => "swtcontrol",
            Self::XyCurve => "xycurve",
        }
    }
}

/// A lower-cased property name with its raw value.
pub type Property = (String, String);

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Drops the compiled feeder and every added element.
    Clear,
    /// Loads a feeder: a built-in name or a TOML feeder file.
    Compile(String),
    /// Runs every command in a script file.
    Redirect(PathBuf),
    Set(Vec<Property>),
    CalcVoltageBases,
    Solve,
    New {
        class: ElementClass,
        name: String,
        properties: Vec<Property>,
    },
    Edit {
        class: ElementClass,
        name: String,
        properties: Vec<Property>,
    },
    /// `~` line extending the previous `new` or `edit`.
    More(Vec<Property>),
}

impl Command {
    /// Parses one line. Blank lines and comments (`!` or `//`) yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Command` for unknown verbs, element classes or
    /// malformed `key=value` pairs.
    pub fn parse(line: &str) -> Result<Option<Self>, Error> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let fail = |message: String| Error::command(line, message);

        if let Some(rest) = line.strip_prefix('~') {
            return properties(rest).map(Command::More).map_err(fail);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "clear" | "clearall" => Ok(Command::Clear),
            "solve" => Ok(Command::Solve),
            "calcv" | "calcvoltagebases" => Ok(Command::CalcVoltageBases),
            "compile" => {
                let target = unquote(rest);
                if target.is_empty() {
                    return Err(fail("compile needs a feeder name or path".into()));
                }
                Ok(Command::Compile(target.to_string()))
            }
            "redirect" => {
                let target = unquote(rest);
                if target.is_empty() {
                    return Err(fail("redirect needs a script path".into()));
                }
                Ok(Command::Redirect(PathBuf::from(target)))
            }
            "set" => {
                let props = properties(rest).map_err(fail)?;
                if props.is_empty() {
                    return Err(fail("set needs at least one key=value".into()));
                }
                Ok(Command::Set(props))
            }
            "new" | "edit" => {
                let (target, rest) = match rest.split_once(char::is_whitespace) {
                    Some((t, r)) => (t, r),
                    None => (rest, ""),
                };
                let (class, name) = element(target).map_err(fail)?;
                let properties = properties(rest).map_err(fail)?;
                if verb.eq_ignore_ascii_case("new") {
                    Ok(Command::New {
                        class,
                        name,
                        properties,
                    })
                } else {
                    Ok(Command::Edit {
                        class,
                        name,
                        properties,
                    })
                }
            }
            _ => property_assignment(line).map_err(fail),
        }
    }
}

/// `<class>.<name>.<property>=<value>`
fn property_assignment(line: &str) -> Result<Command, String> {
    let (lhs, value) = line
        .split_once('=')
        .ok_or_else(|| format!("unknown command \"{line}\""))?;
    let mut parts = lhs.trim().splitn(3, '.');
    let (Some(class), Some(name), Some(property)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("unknown command \"{line}\""));
    };
    let class = ElementClass::parse(class).ok_or_else(|| format!("unknown element class \"{class}\""))?;
    Ok(Command::Edit {
        class,
        name: name.to_ascii_lowercase(),
        properties: vec![(property.to_ascii_lowercase(), unquote(value.trim()).to_string())],
    })
}

fn element(target: &str) -> Result<(ElementClass, String), String> {
    let (class, name) = target
        .split_once('.')
        .ok_or_else(|| format!("expected <class>.<name>, got \"{target}\""))?;
    let class = ElementClass::parse(class).ok_or_else(|| format!("unknown element class \"{class}\""))?;
    if name.is_empty() {
        return Err("element name is empty".into());
    }
    Ok((class, name.to_ascii_lowercase()))
}

fn properties(rest: &str) -> Result<Vec<Property>, String> {
    tokens(rest)
        .into_iter()
        .map(|tok| {
            let (k, v) = tok
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got \"{tok}\""))?;
            let k = k.trim();
            if k.is_empty() {
                return Err(format!("missing key in \"{tok}\""));
            }
            Ok((k.to_ascii_lowercase(), unquote(v.trim()).to_string()))
        })
        .collect()
}

/// Splits on whitespace outside brackets and quotes.
fn tokens(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut depth = 0_usize;
    let mut quoted = false;
    for c in s.chars() {
        match c {
            '"' | '\'' => {
                quoted = !quoted;
                cur.push(c);
            }
            '[' | '(' if !quoted => {
                depth += 1;
                cur.push(c);
            }
            ']' | ')' if !quoted => {
                depth = depth.saturating_sub(1);
                cur.push(c);
            }
            c if c.is_whitespace() && depth == 0 && !quoted => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for (open, close) in [('"', '"'), ('\'', '\'')] {
        if s.len() >= 2 && s.starts_with(open) && s.ends_with(close) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn strip_comment(line: &str) -> &str {
    let cut = [line.find('!'), line.find("//")].into_iter().flatten().min();
    match cut {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Parses a number list such as `[69, 24.9 4.16]` or `(0.1 0.2)`.
pub fn parse_list(raw: &str) -> Result<Vec<f64>, String> {
    raw.trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')'])
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| format!("bad number \"{s}\" in list")))
        .collect()
}

/// Parses a step size: `15m`, `1h`, `900s`, or a bare number of seconds.
///
/// Returns whole minutes.
pub fn parse_step_minutes(raw: &str) -> Result<u32, String> {
    let raw = raw.trim().to_ascii_lowercase();
    let (num, scale) = if let Some(n) = raw.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = raw.strip_suffix('h') {
        (n, 3600.0)
    } else if let Some(n) = raw.strip_suffix('s') {
        (n, 1.0)
    } else {
        (raw.as_str(), 1.0)
    };
    let seconds = num
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("bad step size \"{raw}\""))?
        * scale;
    if seconds < 60.0 || (seconds % 60.0).abs() > 1e-9 {
        return Err(format!("step size \"{raw}\" must be a positive whole number of minutes"));
    }
    Ok((seconds / 60.0) as u32)
}

/// Bus name without a phase suffix: `71.1` becomes `71`.
pub fn bus_name(raw: &str) -> String {
    raw.split('.').next().unwrap_or(raw).to_ascii_lowercase()
}
