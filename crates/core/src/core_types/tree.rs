//! Dead-tree input record
//!
//! When a tree dies, is harvested, or is killed by a disturbance, the caller
//! hands the deadwood subsystem this snapshot of its dimensions and the five
//! biomass compartments. The subsystem never sees live trees.

use serde::{Deserialize, Serialize};

/// Dimensions and compartment biomasses (kg dry matter per tree, scaled by
/// the caller to per-hectare stem density) of a tree entering the deadwood
/// pools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadTree {
    /// Diameter at breast height (cm)
    pub dbh_cm: f64,
    /// Tree height (m)
    pub height_m: f64,
    /// Stem volume (m³)
    pub volume_m3: f64,
    /// Stem biomass (kg/ha)
    pub stem_kg: f64,
    /// Branch biomass (kg/ha)
    pub branch_kg: f64,
    /// Foliage biomass (kg/ha)
    pub foliage_kg: f64,
    /// Fine-root biomass (kg/ha)
    pub fine_root_kg: f64,
    /// Coarse-root biomass (kg/ha)
    pub coarse_root_kg: f64,
}

impl DeadTree {
    /// Total biomass over all five compartments (kg/ha).
    pub fn total_biomass(&self) -> f64 {
        self.stem_kg + self.branch_kg + self.foliage_kg + self.fine_root_kg + self.coarse_root_kg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_biomass_sums_compartments() {
        let tree = DeadTree {
            dbh_cm: 25.0,
            height_m: 22.0,
            volume_m3: 0.6,
            stem_kg: 300.0,
            branch_kg: 60.0,
            foliage_kg: 15.0,
            fine_root_kg: 8.0,
            coarse_root_kg: 70.0,
        };
        assert!((tree.total_biomass() - 453.0).abs() < 1e-12);
    }
}
