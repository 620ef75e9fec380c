//! Core types and collaborator contracts

pub mod carbon;
pub mod climate;
pub mod species;
pub mod tree;

pub use carbon::{CnPair, CnPool, BIOMASS_C_FRACTION};
pub use climate::{ClimateDay, ClimateYear, WaterCycle, DAYS_PER_MONTH};
pub use species::{Species, SpeciesSet};
pub use tree::DeadTree;
