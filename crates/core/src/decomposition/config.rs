//! Initial state configuration and error type of the deadwood subsystem

use serde::{Deserialize, Serialize};

/// Initial deadwood state of a resource unit.
///
/// The standing part is loaded entirely into the medium diameter class; the
/// branch/coarse-root carbon is split evenly over the five rotating baskets,
/// assuming the initial necromass is uniformly distributed across the 5-year
/// decay cohorts. The pool decomposition rate of both initial pools is the
/// young refractory rate shared with the soil model, i.e. standing wood
/// starts out decaying like fresh refractory litter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnagConfig {
    /// Initial standing woody debris carbon (kg C/ha), medium class
    pub swd_carbon: f64,
    /// C:N ratio of the initial standing pool
    pub swd_cn_ratio: f64,
    /// Decay rate (ksw) of the initial standing pool (1/yr)
    pub swd_decomp_rate: f64,
    /// Number of stems in the initial standing pool
    pub swd_count: f64,
    /// Half-life (yrs) of the initial standing pool
    pub swd_half_life: f64,
    /// Initial branch/coarse-root carbon (kg C/ha), all five baskets together
    pub other_carbon: f64,
    /// C:N ratio of the initial branch/coarse-root pool
    pub other_cn_ratio: f64,
    /// Decomposition rate of young refractory litter (1/yr), shared with the
    /// soil model
    pub young_refractory_decomp_rate: f64,
}

impl Default for SnagConfig {
    fn default() -> Self {
        SnagConfig {
            swd_carbon: 0.0,
            swd_cn_ratio: 50.0,
            swd_decomp_rate: 0.0,
            swd_count: 0.0,
            swd_half_life: 0.0,
            other_carbon: 0.0,
            other_cn_ratio: 50.0,
            young_refractory_decomp_rate: 0.0,
        }
    }
}

impl SnagConfig {
    /// Validate once at setup time. Missing or inconsistent fields reject the
    /// whole configuration instead of being silently defaulted.
    ///
    /// # Errors
    /// Returns [`SnagError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), SnagError> {
        for (what, value) in [
            ("swd_carbon", self.swd_carbon),
            ("swd_count", self.swd_count),
            ("other_carbon", self.other_carbon),
            ("swd_decomp_rate", self.swd_decomp_rate),
            ("young_refractory_decomp_rate", self.young_refractory_decomp_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SnagError::InvalidConfig(format!(
                    "{what} must be >= 0, got {value}"
                )));
            }
        }
        for (what, value) in [
            ("swd_cn_ratio", self.swd_cn_ratio),
            ("other_cn_ratio", self.other_cn_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SnagError::InvalidConfig(format!(
                    "{what} must be > 0, got {value}"
                )));
            }
        }
        // A populated standing pool without a fall half-life would divide by
        // zero in the annual transition; reject it here, not in year N.
        if (self.swd_carbon > 0.0 || self.swd_count > 0.0) && self.swd_half_life <= 0.0 {
            return Err(SnagError::InvalidConfig(format!(
                "swd_half_life must be > 0 for a non-empty initial standing pool, got {}",
                self.swd_half_life
            )));
        }
        if !self.swd_half_life.is_finite() || self.swd_half_life < 0.0 {
            return Err(SnagError::InvalidConfig(format!(
                "swd_half_life must be finite and >= 0, got {}",
                self.swd_half_life
            )));
        }
        Ok(())
    }
}

/// Errors of the deadwood subsystem: invalid configuration at setup time or
/// a violated caller contract on a routing/removal call.
#[derive(Debug, Clone, PartialEq)]
pub enum SnagError {
    /// `setup()` was called before the diameter thresholds were established
    ThresholdsNotSet,
    /// Diameter class thresholds are non-positive or inverted
    InvalidThresholds { lower: f64, upper: f64 },
    /// A configuration field failed validation
    InvalidConfig(String),
    /// A fraction argument was outside [0, 1] (or a fraction pair summed
    /// above 1)
    FractionOutOfRange { what: &'static str, value: f64 },
}

impl std::fmt::Display for SnagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnagError::ThresholdsNotSet => {
                write!(f, "diameter thresholds not set before setup")
            }
            SnagError::InvalidThresholds { lower, upper } => {
                write!(f, "invalid diameter thresholds: lower={lower}, upper={upper}")
            }
            SnagError::InvalidConfig(msg) => write!(f, "invalid snag configuration: {msg}"),
            SnagError::FractionOutOfRange { what, value } => {
                write!(f, "fraction out of range: {what}={value}")
            }
        }
    }
}

impl std::error::Error for SnagError {}
