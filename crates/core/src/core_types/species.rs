//! Species decomposition traits
//!
//! The deadwood subsystem only sees a narrow slice of a species definition:
//! the C:N ratios of the biomass compartments and the decomposition constants
//! that govern how this species' necromass decays and falls.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::decomposition::SnagError;

/// Decomposition-relevant species parameters.
///
/// Rates are annual fractional rates; `kyl` drives the labile (foliage/fine
/// root) litter, `kyr` the refractory (woody) litter, and `ksw` the standing
/// stems. `snag_half_life` is the expected time (years) for a standing cohort
/// of this species to fall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
    /// C:N ratio of foliage biomass
    pub cn_foliage: f64,
    /// C:N ratio of fine-root biomass
    pub cn_fineroot: f64,
    /// C:N ratio of woody biomass (stem, branch, coarse root)
    pub cn_wood: f64,
    /// Decomposition rate of labile litter (1/yr)
    pub snag_kyl: f64,
    /// Decomposition rate of refractory woody litter (1/yr)
    pub snag_kyr: f64,
    /// Decomposition rate of standing woody debris (1/yr)
    pub snag_ksw: f64,
    /// Half-life of standing snags (yrs)
    pub snag_half_life: f64,
}

impl Species {
    /// Validated constructor. C:N ratios and the half-life must be strictly
    /// positive; decomposition rates must be non-negative.
    ///
    /// # Errors
    /// Returns [`SnagError::InvalidConfig`] when a parameter is out of range.
    pub fn new(
        name: impl Into<String>,
        cn_foliage: f64,
        cn_fineroot: f64,
        cn_wood: f64,
        snag_kyl: f64,
        snag_kyr: f64,
        snag_ksw: f64,
        snag_half_life: f64,
    ) -> Result<Self, SnagError> {
        let species = Species {
            name: name.into(),
            cn_foliage,
            cn_fineroot,
            cn_wood,
            snag_kyl,
            snag_kyr,
            snag_ksw,
            snag_half_life,
        };
        species.validate()?;
        Ok(species)
    }

    fn validate(&self) -> Result<(), SnagError> {
        for (what, value) in [
            ("cn_foliage", self.cn_foliage),
            ("cn_fineroot", self.cn_fineroot),
            ("cn_wood", self.cn_wood),
            ("snag_half_life", self.snag_half_life),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SnagError::InvalidConfig(format!(
                    "species '{}': {what} must be > 0, got {value}",
                    self.name
                )));
            }
        }
        for (what, value) in [
            ("snag_kyl", self.snag_kyl),
            ("snag_kyr", self.snag_kyr),
            ("snag_ksw", self.snag_ksw),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SnagError::InvalidConfig(format!(
                    "species '{}': {what} must be >= 0, got {value}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Registry of species keyed by short species code (e.g. "piab").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesSet {
    species: FxHashMap<String, Species>,
}

impl SpeciesSet {
    pub fn new() -> Self {
        SpeciesSet::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, species: Species) {
        self.species.insert(code.into(), species);
    }

    pub fn get(&self, code: &str) -> Option<&Species> {
        self.species.get(code)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
