//! Deadwood Carbon Cycling Core Library
//!
//! The standing-deadwood and coarse-woody-debris subsystem of a forest
//! landscape ecosystem simulator. Tracks, per 1-ha resource unit, the carbon
//! and nitrogen held in standing dead stems (three diameter classes) and in
//! branch/coarse-root debris (a five-year rotating cohort), decays it with a
//! climate-driven modifier, and hands the resulting litter fluxes to the
//! soil model.
//!
//! The subsystem is deterministic, allocation-light, and single-threaded per
//! resource unit; the [`resource_unit::Landscape`] driver steps independent
//! units in parallel.

// Core types and collaborator contracts
pub mod core_types;

// The decomposition state machine
pub mod decomposition;

// Resource units and the parallel landscape driver
pub mod resource_unit;

// Re-export core types
pub use core_types::{
    ClimateDay, ClimateYear, CnPair, CnPool, DeadTree, Species, SpeciesSet, WaterCycle,
    BIOMASS_C_FRACTION,
};

// Re-export the engine surface
pub use decomposition::{SizeClass, Snag, SnagConfig, SnagError, SnagSnapshot};
pub use resource_unit::{Landscape, ResourceUnit, RESOURCE_UNIT_AREA_M2};
