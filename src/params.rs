//! Runtime parameter record and hot-reload commands.
//!
//! `Params` is seeded from the worker's command line plus compiled defaults
//! and owned by the worker; the only mutation path after startup is a
//! [`Command`] applied between blocks, so every stage observes a consistent
//! snapshot for the entirety of any block. Only the correction-chain
//! coefficients are hot-reloadable; filter design, decimation factor and
//! smoothing windows require a worker restart driven by the control plane.

use crate::error::{Error, Result};

/// Documented cap on polynomial coefficient sequences.
pub const MAX_COEFFS: usize = 10;

/// Mutable configuration consumed by all pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub sampling_frequency: f64,
    pub target_rate_hz: f64,
    pub lpf_cutoff_hz: f64,
    /// Ravg window length at the decimated rate.
    pub movavg_r: usize,
    /// Per-channel smoothing window length at the ADC rate.
    pub movavg_ch: usize,

    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Logarithm base for the ratio stage; must be > 1.
    pub k: f64,
    pub b: f64,

    /// y1 numerator coefficients, highest order first.
    pub y1_num: Vec<f64>,
    /// y1 denominator coefficients, highest order first.
    pub y1_den: Vec<f64>,
    pub y2_coeffs: Vec<f64>,
    pub y3_coeffs: Vec<f64>,

    /// Affine output gain: `yt = e * y3 + f`.
    pub e: f64,
    pub f: f64,

    /// Rectify ratio operands before the logarithm.
    pub r_abs: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            sampling_frequency: 100_000.0,
            target_rate_hz: 10.0,
            lpf_cutoff_hz: 2_500.0,
            movavg_r: 5,
            movavg_ch: 1,
            alpha: 1.0,
            beta: 1.0,
            gamma: 1.0,
            k: 10.0,
            b: 0.0,
            y1_num: vec![1.0, 0.0],
            y1_den: vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            y2_coeffs: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            y3_coeffs: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            e: 1.0,
            f: 0.0,
            r_abs: true,
        }
    }
}

impl Params {
    /// Integer decimation factor derived from the rates.
    pub fn decim(&self) -> usize {
        (self.sampling_frequency / self.target_rate_hz).floor() as usize
    }

    /// Validate every startup invariant; any violation is fatal.
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_frequency > 0.0) {
            return Err(Error::config("sampling_frequency must be positive"));
        }
        if !(self.target_rate_hz > 0.0) {
            return Err(Error::config("target_rate_hz must be positive"));
        }
        if self.decim() < 1 {
            return Err(Error::config(format!(
                "target_rate_hz {} exceeds sampling_frequency {}",
                self.target_rate_hz, self.sampling_frequency
            )));
        }
        if !(self.lpf_cutoff_hz > 0.0) {
            return Err(Error::config("lpf_cutoff_hz must be positive"));
        }
        if self.movavg_r == 0 || self.movavg_ch == 0 {
            return Err(Error::config("moving-average windows must be positive"));
        }
        if !(self.k > 1.0) {
            return Err(Error::config("log base k must be greater than 1"));
        }
        for (name, coeffs) in [
            ("y1_num", &self.y1_num),
            ("y1_den", &self.y1_den),
            ("y2_coeffs", &self.y2_coeffs),
            ("y3_coeffs", &self.y3_coeffs),
        ] {
            if coeffs.is_empty() || coeffs.len() > MAX_COEFFS {
                return Err(Error::config(format!(
                    "{} must have 1 to {} coefficients",
                    name, MAX_COEFFS
                )));
            }
            if coeffs.iter().any(|c| !c.is_finite()) {
                return Err(Error::config(format!("{} contains non-finite values", name)));
            }
        }
        Ok(())
    }

    /// Apply a hot-reload command. Idempotent: applying the same command
    /// twice leaves the record unchanged after the first application.
    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Y1Den(coeffs) => self.y1_den = coeffs,
            Command::Y2Coeffs(coeffs) => self.y2_coeffs = coeffs,
            Command::Y3Coeffs(coeffs) => self.y3_coeffs = coeffs,
            Command::YtCoeffs { e, f } => {
                self.e = e;
                self.f = f;
            }
        }
    }
}

/// A parsed hot-reload command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Y1Den(Vec<f64>),
    Y2Coeffs(Vec<f64>),
    Y3Coeffs(Vec<f64>),
    YtCoeffs { e: f64, f: f64 },
}

impl Command {
    /// Parse one command line: a key followed by comma-separated decimals.
    ///
    /// Returns `None` for anything that must be silently dropped: unknown
    /// keys, malformed or non-finite numbers, empty or oversized coefficient
    /// lists, and a `yt_coeffs` list that is not exactly two entries.
    pub fn parse(line: &str) -> Option<Command> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let key = parts.next()?;
        let tail = parts.next()?.trim();
        if tail.is_empty() {
            return None;
        }

        let mut values = Vec::new();
        for token in tail.split(',') {
            let v: f64 = token.trim().parse().ok()?;
            if !v.is_finite() {
                return None;
            }
            values.push(v);
        }
        if values.is_empty() || values.len() > MAX_COEFFS {
            return None;
        }

        match key {
            "y1_den" => Some(Command::Y1Den(values)),
            "y2_coeffs" => Some(Command::Y2Coeffs(values)),
            "y3_coeffs" => Some(Command::Y3Coeffs(values)),
            "yt_coeffs" => {
                if values.len() == 2 {
                    Some(Command::YtCoeffs {
                        e: values[0],
                        f: values[1],
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_decim() {
        let mut params = Params::default();
        params.sampling_frequency = 100.0;
        params.target_rate_hz = 10.0;
        assert_eq!(params.decim(), 10);
        params.target_rate_hz = 30.0;
        assert_eq!(params.decim(), 3);
    }

    #[test]
    fn test_target_rate_above_fs_rejected() {
        let mut params = Params::default();
        params.sampling_frequency = 10.0;
        params.target_rate_hz = 100.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_k_must_exceed_one() {
        let mut params = Params::default();
        params.k = 1.0;
        assert!(params.validate().is_err());
        params.k = 0.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_coeff_cap_enforced() {
        let mut params = Params::default();
        params.y2_coeffs = vec![1.0; 11];
        assert!(params.validate().is_err());
        params.y2_coeffs = vec![];
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_parse_y2() {
        let cmd = Command::parse("y2_coeffs 0,0,0,0,2,0").unwrap();
        assert_eq!(cmd, Command::Y2Coeffs(vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0]));
    }

    #[test]
    fn test_parse_yt_two_entries() {
        let cmd = Command::parse("yt_coeffs 1.5,-0.25").unwrap();
        assert_eq!(cmd, Command::YtCoeffs { e: 1.5, f: -0.25 });
        // Any other arity is dropped
        assert_eq!(Command::parse("yt_coeffs 1.0"), None);
        assert_eq!(Command::parse("yt_coeffs 1,2,3"), None);
    }

    #[test]
    fn test_parse_whitespace_tolerant() {
        let cmd = Command::parse("  y1_den  1.0, 2.0 , 3.0 ").unwrap();
        assert_eq!(cmd, Command::Y1Den(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("y2_coeffs"), None);
        assert_eq!(Command::parse("y2_coeffs "), None);
        assert_eq!(Command::parse("unknown_key 1,2"), None);
        assert_eq!(Command::parse("y2_coeffs 1,abc"), None);
        assert_eq!(Command::parse("y2_coeffs 1,,2"), None);
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert_eq!(Command::parse("y2_coeffs NaN"), None);
        assert_eq!(Command::parse("y2_coeffs inf,1"), None);
        assert_eq!(Command::parse("y1_den -inf"), None);
    }

    #[test]
    fn test_parse_rejects_oversized() {
        assert_eq!(Command::parse("y1_den 1,2,3,4,5,6,7,8,9,10,11"), None);
        assert!(Command::parse("y1_den 1,2,3,4,5,6,7,8,9,10").is_some());
    }

    #[test]
    fn test_apply_idempotent() {
        let mut once = Params::default();
        once.apply(Command::parse("y1_den 1,2,3").unwrap());

        let mut twice = Params::default();
        twice.apply(Command::parse("y1_den 1,2,3").unwrap());
        twice.apply(Command::parse("y1_den 1,2,3").unwrap());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_touches_only_its_field() {
        let mut params = Params::default();
        let before = params.clone();
        params.apply(Command::YtCoeffs { e: 3.0, f: 1.0 });
        assert_eq!(params.y1_den, before.y1_den);
        assert_eq!(params.y2_coeffs, before.y2_coeffs);
        assert_eq!(params.e, 3.0);
        assert_eq!(params.f, 1.0);
    }
}
