//! Detection options and the parameters derived from them

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::error::{Error, Result};

/// Result file name used when no input name is known
pub const DEFAULT_RESULT_FILE: &str = "transforms.dat";

/// Largest accepted spread of per-field rotation estimates, in radians
pub const MAX_ANGLE_VARIATION: f64 = 1.0;

/// Which motion search to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Algorithm {
    /// Exhaustive whole-frame translation search
    BruteForce,
    /// Field-based search with rotation estimate
    Fields,
}

impl Algorithm {
    pub fn id(self) -> u8 {
        match self {
            Algorithm::BruteForce => 0,
            Algorithm::Fields => 1,
        }
    }
}

impl From<Algorithm> for u8 {
    fn from(algo: Algorithm) -> u8 {
        algo.id()
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Algorithm::BruteForce),
            1 => Ok(Algorithm::Fields),
            other => Err(Error::config("algo", format!("unknown algorithm {}", other))),
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Fields
    }
}

/// User-facing detection options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizeOptions {
    /// How shaky the footage is, 1 (little) to 10 (strong)
    pub shakiness: u32,
    /// How many fields vote, 1 (few) to 15 (many)
    pub accuracy: u32,
    /// Initial step of the coarse search
    pub stepsize: u32,
    pub algo: Algorithm,
    /// Fields with a lower contrast are ignored, 0 to 1
    pub mincontrast: f64,
    /// Debug overlay level, 0 to 2
    pub show: u32,
    /// Keep matches that hit the search boundary
    pub allowmax: bool,
    /// Where the transform stream goes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PathBuf>,
    /// Match fields on the rayon pool
    pub parallel: bool,
}

impl Default for StabilizeOptions {
    fn default() -> Self {
        StabilizeOptions {
            shakiness: 4,
            accuracy: 4,
            stepsize: 4,
            algo: Algorithm::Fields,
            mincontrast: 0.3,
            show: 0,
            allowmax: false,
            result: None,
            parallel: false,
        }
    }
}

impl StabilizeOptions {
    /// Clamp the dials into range and fix inconsistent combinations
    pub fn normalize(&mut self) {
        self.shakiness = self.shakiness.clamp(1, 10);
        self.accuracy = self.accuracy.clamp(1, 15);
        if self.accuracy < self.shakiness / 2 {
            warn!(
                "accuracy should not be lower than shakiness/2, raising it to {}",
                self.shakiness / 2
            );
            self.accuracy = self.shakiness / 2;
        }
        if self.accuracy > 9 && self.stepsize > 4 {
            warn!("for high accuracy use a lower stepsize, setting it to 4");
            self.stepsize = 4;
        }
    }

    /// Reject values that cannot be corrected
    pub fn validate(&self) -> Result<()> {
        if self.stepsize < 1 {
            return Err(Error::config("stepsize", "must be at least 1"));
        }
        if self.show > 2 {
            return Err(Error::config("show", format!("must be 0, 1 or 2, got {}", self.show)));
        }
        if !(0.0..=1.0).contains(&self.mincontrast) {
            return Err(Error::config(
                "mincontrast",
                format!("must be within 0..1, got {}", self.mincontrast),
            ));
        }
        Ok(())
    }

    /// Destination of the transform stream, defaulting to
    /// `<input file name>.trf`
    pub fn result_path(&self, input: Option<&Path>) -> PathBuf {
        if let Some(result) = &self.result {
            return result.clone();
        }
        match input.and_then(|p| p.file_name()) {
            Some(name) => {
                let mut name = name.to_os_string();
                name.push(".trf");
                PathBuf::from(name)
            }
            None => PathBuf::from(DEFAULT_RESULT_FILE),
        }
    }

    /// Load options from a JSON document
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let options = serde_json::from_str(&json)?;
        Ok(options)
    }

    /// Save options as pretty-printed JSON
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply every pair of a `key=value:key=value` option string on top of
    /// the current values
    pub fn apply(&mut self, s: &str) -> Result<()> {
        for item in s.split(':').map(str::trim).filter(|item| !item.is_empty()) {
            match item.split_once('=') {
                Some((key, value)) => self.set(key.trim(), value.trim())?,
                None => self.set(item, "1")?,
            }
        }
        Ok(())
    }

    /// Apply one `key=value` pair
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "shakiness" => self.shakiness = parse_value("shakiness", value)?,
            "accuracy" => self.accuracy = parse_value("accuracy", value)?,
            "stepsize" => self.stepsize = parse_value("stepsize", value)?,
            "algo" => self.algo = Algorithm::try_from(parse_value::<u8>("algo", value)?)?,
            "mincontrast" => self.mincontrast = parse_value("mincontrast", value)?,
            "show" => self.show = parse_value("show", value)?,
            "allowmax" => self.allowmax = parse_flag("allowmax", value)?,
            "parallel" => self.parallel = parse_flag("parallel", value)?,
            "result" => {
                if value.is_empty() {
                    return Err(Error::config("result", "empty path"));
                }
                self.result = Some(PathBuf::from(value));
            }
            other => {
                return Err(Error::config("options", format!("unknown option '{}'", other)));
            }
        }
        Ok(())
    }
}

/// Parses `shakiness=5:accuracy=9:result=out.trf` over the defaults
///
/// A bare flag name (`allowmax`) means `allowmax=1`.
impl FromStr for StabilizeOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut options = StabilizeOptions::default();
        options.apply(s)?;
        Ok(options)
    }
}

fn parse_value<T: FromStr>(param: &'static str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(param, format!("cannot parse '{}'", value)))
}

fn parse_flag(param: &'static str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(param, format!("cannot parse '{}'", other))),
    }
}

/// Parameters the estimator runs with for one frame geometry
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizeParams {
    pub width: usize,
    pub height: usize,
    pub shakiness: u32,
    pub accuracy: u32,
    pub step_size: usize,
    pub algo: Algorithm,
    pub min_contrast: f64,
    pub show: u32,
    pub allow_max: bool,
    pub parallel: bool,
    /// Search radius in pixels
    pub max_shift: usize,
    /// Side of a measurement field in pixels
    pub field_size: usize,
    pub max_angle_variation: f64,
}

impl StabilizeParams {
    /// Derive sizes from normalized `options` for a `width` x `height` frame
    pub fn derive(options: &StabilizeOptions, width: usize, height: usize) -> Self {
        let min_dim = width.min(height);
        let shakiness = options.shakiness as usize;
        let max_shift = (min_dim * shakiness / 40).max(4);
        let field_size = (min_dim / 6).min(min_dim * shakiness / 40).max(4);

        StabilizeParams {
            width,
            height,
            shakiness: options.shakiness,
            accuracy: options.accuracy,
            step_size: options.stepsize as usize,
            algo: options.algo,
            min_contrast: options.mincontrast,
            show: options.show,
            allow_max: options.allowmax,
            parallel: options.parallel,
            max_shift,
            field_size,
            max_angle_variation: MAX_ANGLE_VARIATION,
        }
    }

    /// Number of fields that vote, out of `field_count`
    pub fn max_fields(&self, field_count: usize) -> usize {
        self.accuracy as usize * field_count / 15
    }
}
