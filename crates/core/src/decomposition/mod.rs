//! Deadwood decomposition: the snag engine, its configuration, and the
//! climate modifier driving all decay rates

pub(crate) mod climate_modifier;
pub mod config;
pub mod snag;

pub use config::{SnagConfig, SnagError};
pub use snag::{SizeClass, Snag, SnagSnapshot, SwdClass, SwdClassSnapshot};

/// Public re-exports of the climate modifier pieces for validation testing
pub mod climate_modifier_validation {
    pub use super::climate_modifier::{temperature_modifier, water_modifier};
}
