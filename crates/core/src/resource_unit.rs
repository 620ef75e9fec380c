//! Resource units and the landscape-level annual driver
//!
//! A resource unit is the 100 m × 100 m spatial cell the simulation state is
//! kept on. Each unit owns its climate series, its water-balance collaborator
//! and its deadwood state; the landscape steps all units through the annual
//! protocol, in parallel where a unit's updates are independent of every
//! other unit's.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::{ClimateYear, WaterCycle};
use crate::decomposition::{Snag, SnagConfig, SnagError};

/// Ground area of one resource unit (m²), the reference for all per-hectare
/// state.
pub const RESOURCE_UNIT_AREA_M2: f64 = 10_000.0;

/// One simulation cell: stockable area, climate and water collaborators, and
/// the deadwood state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUnit {
    id: u32,
    stockable_area_m2: f64,
    pub climate: ClimateYear,
    pub water_cycle: WaterCycle,
    pub snag: Snag,
}

impl ResourceUnit {
    pub fn new(
        id: u32,
        stockable_area_m2: f64,
        climate: ClimateYear,
        water_cycle: WaterCycle,
    ) -> Self {
        ResourceUnit {
            id,
            stockable_area_m2,
            climate,
            water_cycle,
            snag: Snag::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Area of the unit that can actually carry trees (m²).
    pub fn stockable_area_m2(&self) -> f64 {
        self.stockable_area_m2
    }

    /// Set up the deadwood state from configuration and scale it by the
    /// stockable fraction, so partially unusable units do not carry a full
    /// unit's worth of initial necromass.
    ///
    /// # Errors
    /// Propagates threshold and configuration validation failures.
    pub fn setup_snag(&mut self, thresholds: (f64, f64), config: &SnagConfig) -> Result<(), SnagError> {
        self.snag.set_thresholds(thresholds.0, thresholds.1)?;
        self.snag.setup(config)?;
        self.snag.scale_initial_state(self.stockable_area_m2);
        Ok(())
    }

    /// Open a new simulation year: re-arm the water cycle and clear the
    /// snag's year-scoped state. Biomass routing calls go between this and
    /// [`ResourceUnit::calculate_year`].
    pub fn new_year(&mut self) {
        self.water_cycle.new_year(None);
        self.snag.new_year();
    }

    /// Close the year: run the snag's annual update against this unit's
    /// climate and water balance.
    pub fn calculate_year(&mut self) {
        let ResourceUnit {
            climate,
            water_cycle,
            snag,
            ..
        } = self;
        snag.calculate_year(climate, water_cycle);
    }
}

/// All resource units of a simulated landscape.
///
/// Units share no mutable state, so the annual update runs them in parallel;
/// within one unit the routing closure and the annual update execute on a
/// single thread, which the per-class weighted-average updates require.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Landscape {
    units: Vec<ResourceUnit>,
}

impl Landscape {
    pub fn new(units: Vec<ResourceUnit>) -> Self {
        info!(units = units.len(), "landscape created");
        Landscape { units }
    }

    pub fn units(&self) -> &[ResourceUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [ResourceUnit] {
        &mut self.units
    }

    /// Run one simulated year over all units: `new_year`, the caller's
    /// routing (mortality, harvest, turnover, ...), then the annual update,
    /// each unit independently and in parallel.
    pub fn run_year_with<F>(&mut self, route: F)
    where
        F: Fn(&mut ResourceUnit) + Sync,
    {
        self.units.par_iter_mut().for_each(|unit| {
            unit.new_year();
            route(unit);
            unit.calculate_year();
        });
    }

    /// One year with no biomass input: pure decay, fall, and rotation.
    pub fn run_year(&mut self) {
        self.run_year_with(|_| {});
    }
}
