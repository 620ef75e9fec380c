//! Standing-deadwood pool engine
//!
//! Tracks, per resource unit, three diameter classes of standing dead stems
//! and five rotating branch/coarse-root baskets, and routes the biomass of
//! dying, harvested, and disturbance-killed trees through them. Once per
//! simulated year [`Snag::calculate_year`] decays every pool with the
//! climate modifier, lets standing stems fall to the ground following an
//! exponential half-life model, and hands the resulting litter fluxes to the
//! soil model.
//!
//! The half-life driven snag fall is loosely oriented on the cohort
//! transitions of Standcarb2 (Harmon & Marks 2002): lag times scale linearly
//! with the climate modifier, so good or bad years have an immediate effect
//! on how long stems keep standing.

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use tracing::debug;

use super::climate_modifier::annual_climate_factor;
use super::config::{SnagConfig, SnagError};
use crate::core_types::{
    ClimateYear, CnPair, CnPool, DeadTree, Species, WaterCycle, BIOMASS_C_FRACTION,
};
use crate::resource_unit::RESOURCE_UNIT_AREA_M2;

/// Number of rotating branch/coarse-root baskets (a 5-year decay cohort).
const OTHER_WOOD_BASKETS: usize = 5;

/// Diameter class of standing woody debris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeClass {
    /// dbh at or below the lower threshold
    Small,
    /// dbh between the thresholds
    Medium,
    /// dbh above the upper threshold
    Large,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    pub fn from_dbh(dbh_cm: f64, dbh_lower: f64, dbh_higher: f64) -> Self {
        if dbh_cm <= dbh_lower {
            SizeClass::Small
        } else if dbh_cm > dbh_higher {
            SizeClass::Large
        } else {
            SizeClass::Medium
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Diameter thresholds plus the per-class carbon levels that trigger the
/// emptying of a nearly-gone cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SizeClassThresholds {
    dbh_lower: f64,
    dbh_higher: f64,
    carbon_threshold: [f64; 3],
}

impl SizeClassThresholds {
    fn derive(dbh_lower: f64, dbh_higher: f64) -> Self {
        // Representative diameters: the midpoints of the three classes.
        let representative_dbh = [
            dbh_lower / 2.0,
            dbh_lower + (dbh_higher - dbh_lower) / 2.0,
            dbh_higher + (dbh_higher - dbh_lower) / 2.0,
        ];
        // 10% of the stem carbon of a typical tree of that diameter,
        // from Douglas-fir woody allometry (kg C per stem).
        let carbon_threshold =
            representative_dbh.map(|dbh| 0.10568 * dbh.powf(2.4247) * 0.5 * 0.1);
        SizeClassThresholds {
            dbh_lower,
            dbh_higher,
            carbon_threshold,
        }
    }

    fn classify(&self, dbh_cm: f64) -> SizeClass {
        SizeClass::from_dbh(dbh_cm, self.dbh_lower, self.dbh_higher)
    }
}

/// One standing-deadwood diameter class: the persistent cohort pool, the
/// current year's input pool, and the cohort statistics.
///
/// The input pool collects this year's newly dead stems and is merged into
/// the persistent pool by the annual update; it is owned by the [`Snag`] and
/// never handed out mutably.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SwdClass {
    swd: CnPool,
    input: CnPool,
    stem_count: f64,
    avg_dbh_cm: f64,
    avg_height_m: f64,
    avg_volume_m3: f64,
    /// Mass-weighted age of the cohort content (yrs)
    time_since_death: f64,
    /// Decay rate of the cohort, carbon-weighted over its input years (1/yr)
    decay_rate: f64,
    /// Carbon-weighted decay rate of this year's input only (1/yr)
    input_decay_rate: f64,
    /// Stem-number-weighted half-life of the cohort (yrs)
    half_life: f64,
}

impl SwdClass {
    /// Persistent standing pool content (kg/ha).
    pub fn swd(&self) -> CnPair {
        self.swd.content()
    }

    /// Current-year input pool content (kg/ha).
    pub fn input(&self) -> CnPair {
        self.input.content()
    }

    pub fn stem_count(&self) -> f64 {
        self.stem_count
    }

    pub fn avg_dbh_cm(&self) -> f64 {
        self.avg_dbh_cm
    }

    pub fn avg_height_m(&self) -> f64 {
        self.avg_height_m
    }

    pub fn avg_volume_m3(&self) -> f64 {
        self.avg_volume_m3
    }

    pub fn time_since_death(&self) -> f64 {
        self.time_since_death
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    pub fn half_life(&self) -> f64 {
        self.half_life
    }

    /// Reset the cohort statistics after the pool has been emptied out.
    /// The (sub-0.5) stem count is deliberately left in place.
    fn clear_cohort_statistics(&mut self) {
        self.avg_dbh_cm = 0.0;
        self.avg_height_m = 0.0;
        self.avg_volume_m3 = 0.0;
        self.decay_rate = 0.0;
        self.input_decay_rate = 0.0;
        self.half_life = 0.0;
        self.time_since_death = 0.0;
    }
}

/// The standing-deadwood and coarse-woody-debris state of one resource unit.
///
/// Yearly protocol: [`Snag::new_year`], then any number of biomass routing
/// calls ([`Snag::add_mortality`], [`Snag::add_harvest`],
/// [`Snag::add_disturbance`], turnover and removal calls), then exactly one
/// [`Snag::calculate_year`]. A single thread drives one `Snag`; different
/// resource units may run concurrently without coordination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snag {
    thresholds: Option<SizeClassThresholds>,
    classes: [SwdClass; 3],
    /// Branch + coarse-root baskets; one is flushed to the soil each year
    other_wood: [CnPool; OTHER_WOOD_BASKETS],
    /// Which basket is flushed next
    branch_index: usize,
    /// Climate decomposition factor 're' of the current year
    climate_factor: f64,
    /// Carbon over all standing pools and baskets (kg C/ha), recomputed by
    /// the annual update
    total_carbon: f64,
    total_swd: CnPair,
    total_other: CnPair,
    labile_flux: CnPool,
    refractory_flux: CnPool,
    total_in: CnPair,
    swd_to_soil: CnPair,
    flux_to_atmosphere: CnPair,
    flux_to_extern: CnPair,
    flux_to_disturbance: CnPair,
}

impl Snag {
    pub fn new() -> Self {
        Snag::default()
    }

    /// Establish the diameter class boundaries (cm) and derive the per-class
    /// carbon emptying thresholds. Idempotent unless `dbh_lower` changes.
    ///
    /// # Errors
    /// Returns [`SnagError::InvalidThresholds`] for non-positive or inverted
    /// boundaries.
    pub fn set_thresholds(&mut self, dbh_lower: f64, dbh_higher: f64) -> Result<(), SnagError> {
        if let Some(thresholds) = &self.thresholds {
            if thresholds.dbh_lower == dbh_lower {
                return Ok(());
            }
        }
        if !dbh_lower.is_finite()
            || !dbh_higher.is_finite()
            || dbh_lower <= 0.0
            || dbh_higher <= dbh_lower
        {
            return Err(SnagError::InvalidThresholds {
                lower: dbh_lower,
                upper: dbh_higher,
            });
        }
        self.thresholds = Some(SizeClassThresholds::derive(dbh_lower, dbh_higher));
        Ok(())
    }

    /// Load the initial deadwood state. Resets all pools and statistics,
    /// puts the configured standing carbon into the medium class and splits
    /// the branch/coarse-root carbon evenly over the five baskets.
    ///
    /// # Errors
    /// Fails if [`Snag::set_thresholds`] has not established valid
    /// boundaries, or if the configuration is invalid.
    pub fn setup(&mut self, config: &SnagConfig) -> Result<(), SnagError> {
        if self.thresholds.is_none() {
            return Err(SnagError::ThresholdsNotSet);
        }
        config.validate()?;

        let thresholds = self.thresholds;
        *self = Snag::default();
        self.thresholds = thresholds;

        let kyr = config.young_refractory_decomp_rate;
        let medium = &mut self.classes[SizeClass::Medium.index()];
        medium.swd = CnPool::new(config.swd_carbon, config.swd_carbon / config.swd_cn_ratio, kyr);
        medium.decay_rate = config.swd_decomp_rate;
        medium.stem_count = config.swd_count;
        medium.half_life = config.swd_half_life;

        let mut other = CnPool::new(
            config.other_carbon,
            config.other_carbon / config.other_cn_ratio,
            kyr,
        );
        self.total_carbon = config.other_carbon + config.swd_carbon;
        other *= 1.0 / OTHER_WOOD_BASKETS as f64;
        self.other_wood = [other; OTHER_WOOD_BASKETS];

        self.total_swd = self.classes[SizeClass::Medium.index()].swd();
        self.total_other = self
            .other_wood
            .iter()
            .fold(CnPair::default(), |sum, basket| sum + basket.content());

        debug!(
            swd_carbon = config.swd_carbon,
            other_carbon = config.other_carbon,
            "snag pools initialized"
        );
        Ok(())
    }

    /// Correct the initial state for partially stockable resource units:
    /// scales the initial pools by stockable area / reference unit area.
    pub fn scale_initial_state(&mut self, stockable_area_m2: f64) {
        let area_factor = stockable_area_m2 / RESOURCE_UNIT_AREA_M2;
        let medium = &mut self.classes[SizeClass::Medium.index()];
        medium.swd *= area_factor;
        medium.stem_count *= area_factor;
        for basket in &mut self.other_wood {
            *basket *= area_factor;
        }
        self.total_carbon *= area_factor;
        self.total_swd *= area_factor;
        self.total_other *= area_factor;
    }

    /// Start a simulation year: clears the per-class input pools, their
    /// decay-rate accumulators, and every year-scoped flux accumulator.
    /// Call before any routing call of the year.
    pub fn new_year(&mut self) {
        for class in &mut self.classes {
            class.input.clear();
            class.input_decay_rate = 0.0;
        }
        self.labile_flux.clear();
        self.refractory_flux.clear();
        self.flux_to_atmosphere.clear();
        self.flux_to_extern.clear();
        self.flux_to_disturbance.clear();
        self.total_in.clear();
        self.swd_to_soil.clear();
    }

    /// Compute and store the climate decomposition factor 're' of the year.
    ///
    /// Triggers the water-balance run if it has not happened yet this year
    /// (the cycle itself checks and never runs twice). The factor is needed
    /// by the soil model as well, so it is computed even for an empty snag
    /// state.
    pub fn calculate_climate_factors(
        &mut self,
        climate: &ClimateYear,
        water: &mut WaterCycle,
    ) -> f64 {
        water.run();
        self.climate_factor = annual_climate_factor(climate, water);
        self.climate_factor
    }

    /// The annual state transition: rotation and decay of the branch
    /// baskets, merge and decay of the standing cohorts, snag fall, cohort
    /// emptying, and recomputation of the totals.
    ///
    /// Call exactly once per year, after [`Snag::new_year`] and all routing
    /// calls.
    pub fn calculate_year(&mut self, climate: &ClimateYear, water: &mut WaterCycle) {
        self.calculate_climate_factors(climate, water);
        let re = self.climate_factor;
        if self.is_empty() {
            return;
        }

        // every year one of the five baskets is emptied into the
        // refractory soil pool; the rotation advances regardless of content
        let flushed = self.other_wood[self.branch_index];
        if !flushed.is_empty() {
            self.refractory_flux
                .add(flushed.content(), flushed.decomposition_rate);
            self.other_wood[self.branch_index].clear();
        }
        self.branch_index = (self.branch_index + 1) % OTHER_WOOD_BASKETS;

        // decay of branches / coarse roots; the nitrogen stays in the pool
        for basket in &mut self.other_wood {
            if basket.carbon > 0.0 {
                let survival = (-re * basket.decomposition_rate).exp();
                self.flux_to_atmosphere.carbon += basket.carbon * (1.0 - survival);
                basket.carbon *= survival;
            }
        }

        // unreachable with a non-empty state; setup requires thresholds
        let Some(thresholds) = self.thresholds else {
            return;
        };

        for (i, class) in self.classes.iter_mut().enumerate() {
            // merge this year's input into the cohort, blending the decay
            // rate by carbon mass
            if !class.input.is_empty() {
                let total_carbon = class.swd.carbon + class.input.carbon;
                if total_carbon > 0.0 {
                    class.decay_rate = class.decay_rate * (class.swd.carbon / total_carbon)
                        + class.input_decay_rate * (class.input.carbon / total_carbon);
                }
                class.swd.add(class.input.content(), class.input.decomposition_rate);
            }

            if class.swd.carbon > 0.0 {
                // mineralization reduces the carbon only; the nitrogen stays
                // and the C:N ratio of the cohort drifts downward
                let survival = (-class.decay_rate * re).exp();
                self.flux_to_atmosphere.carbon += class.swd.carbon * (1.0 - survival);
                class.swd.carbon *= survival;

                // snag fall: negative exponential transition with a
                // climate-adjusted half-life; slow-decomposition climates
                // keep stems standing longer
                let half_life = class.half_life / re;
                let mut rate = -LN_2 / half_life;
                // smallest stems break and fall about twice as fast
                if i == SizeClass::Small.index() {
                    rate *= 2.0;
                }
                let transfer = 1.0 - rate.exp();

                let fallen = class.swd.content() * transfer;
                self.swd_to_soil += fallen;
                self.refractory_flux.add(fallen, class.swd.decomposition_rate);
                class.swd *= 1.0 - transfer;
                // stems fall at the same proportional rate as their mass
                class.stem_count *= 1.0 - transfer;

                class.time_since_death += 1.0;

                // empty the cohort once fewer than half a stem is left, or
                // once the average remaining snag holds less carbon than the
                // class threshold
                if class.stem_count < 0.5
                    || (class.stem_count > 0.0
                        && class.swd.carbon / class.stem_count < thresholds.carbon_threshold[i])
                {
                    debug!(
                        class = i,
                        carbon = class.swd.carbon,
                        stems = class.stem_count,
                        "emptying standing cohort to soil"
                    );
                    self.refractory_flux
                        .add(class.swd.content(), class.swd.decomposition_rate);
                    self.swd_to_soil += class.swd.content();
                    class.swd.clear();
                    class.clear_cohort_statistics();
                }
            }
        }

        self.total_swd = self
            .classes
            .iter()
            .fold(CnPair::default(), |sum, class| sum + class.swd());
        self.total_other = self
            .other_wood
            .iter()
            .fold(CnPair::default(), |sum, basket| sum + basket.content());
        self.total_carbon = self.total_swd.carbon + self.total_other.carbon;
    }

    /// Route the biomass of one dead tree into the deadwood pools.
    ///
    /// The five fractions select, per compartment, how much becomes a
    /// standing snag, how much falls straight to the soil, and how much
    /// leaves the modeled system (harvested or burned). Fine roots always go
    /// to the labile soil flux; coarse roots always enter the five-year
    /// basket rotation.
    ///
    /// Fractions are a caller contract: each in [0, 1], with
    /// `stem_to_snag + stem_to_soil <= 1` and
    /// `branch_to_snag + branch_to_soil <= 1`. Calling any routing entry
    /// point before [`Snag::setup`] is likewise a caller defect; debug
    /// builds assert on both.
    fn add_biomass_pools(
        &mut self,
        tree: &DeadTree,
        species: &Species,
        stem_to_snag: f64,
        stem_to_soil: f64,
        branch_to_snag: f64,
        branch_to_soil: f64,
        foliage_to_soil: f64,
    ) {
        debug_assert!((0.0..=1.0).contains(&foliage_to_soil));
        debug_assert!(
            stem_to_snag >= 0.0 && stem_to_soil >= 0.0 && stem_to_snag + stem_to_soil <= 1.0
        );
        debug_assert!(
            branch_to_snag >= 0.0 && branch_to_soil >= 0.0 && branch_to_snag + branch_to_soil <= 1.0
        );
        debug_assert!(self.thresholds.is_some(), "biomass routed before setup");

        let Some(thresholds) = self.thresholds else {
            return;
        };

        let branch_biomass = tree.branch_kg;

        // fine roots go to the labile pool
        self.labile_flux
            .add_biomass(tree.fine_root_kg, species.cn_fineroot, species.snag_kyl);
        // a part of the foliage goes to the soil
        self.labile_flux.add_biomass(
            tree.foliage_kg * foliage_to_soil,
            species.cn_foliage,
            species.snag_kyl,
        );

        // coarse roots and a part of the branches are distributed equally
        // over the five-year basket rotation
        let basket_share =
            (tree.coarse_root_kg + branch_to_snag * branch_biomass) / OTHER_WOOD_BASKETS as f64;
        for basket in &mut self.other_wood {
            basket.add_biomass(basket_share, species.cn_wood, species.snag_kyr);
        }

        // the rest of the branches and part of the stem fall to the soil
        // directly, bypassing the standing pools
        self.refractory_flux.add_biomass(
            branch_biomass * branch_to_soil,
            species.cn_wood,
            species.snag_kyr,
        );
        self.refractory_flux.add_biomass(
            tree.stem_kg * stem_to_soil,
            species.cn_wood,
            species.snag_kyr,
        );

        // book-keeping: all woody input to the snag pools of this year
        self.total_in.add_biomass(
            branch_biomass * branch_to_snag + tree.coarse_root_kg + tree.stem_kg * stem_to_snag,
            species.cn_wood,
        );

        let class_index = thresholds.classify(tree.dbh_cm).index();
        if stem_to_snag > 0.0 {
            let class = &mut self.classes[class_index];
            // stem-number-weighted cohort statistics; repeating the update
            // per dead tree gives the same result as a batch update
            let p_old = class.stem_count / (class.stem_count + 1.0);
            let p_new = 1.0 / (class.stem_count + 1.0);
            class.avg_dbh_cm = class.avg_dbh_cm * p_old + tree.dbh_cm * p_new;
            class.avg_height_m = class.avg_height_m * p_old + tree.height_m * p_new;
            class.avg_volume_m3 = class.avg_volume_m3 * p_old + tree.volume_m3 * p_new;
            class.time_since_death = class.time_since_death * p_old + p_new;
            class.half_life = class.half_life * p_old + species.snag_half_life * p_new;

            // the decay rate of the year's input is blended by carbon mass,
            // not stem number
            let stem_carbon = tree.stem_kg * BIOMASS_C_FRACTION;
            if stem_carbon > 0.0 {
                let c_old = class.input.carbon / (class.input.carbon + stem_carbon);
                let c_new = stem_carbon / (class.input.carbon + stem_carbon);
                class.input_decay_rate = class.input_decay_rate * c_old + species.snag_ksw * c_new;
            }
            class.stem_count += 1.0;
        }

        // the stem biomass enters the input pool of its diameter class
        self.classes[class_index].input.add_biomass(
            tree.stem_kg * stem_to_snag,
            species.cn_wood,
            species.snag_kyr,
        );

        // everything not routed to snags or soil leaves the system
        // (harvested or burned); the wood C:N ratio is applied to the whole
        // remainder, foliage included, as in the reference model
        self.flux_to_extern.add_biomass(
            tree.foliage_kg * (1.0 - foliage_to_soil)
                + branch_biomass * (1.0 - branch_to_snag - branch_to_soil)
                + tree.stem_kg * (1.0 - stem_to_snag - stem_to_soil),
            species.cn_wood,
        );
    }

    /// A tree died of competition or age: the whole stem and all branches
    /// become standing deadwood, the foliage falls to the soil.
    pub fn add_mortality(&mut self, tree: &DeadTree, species: &Species) {
        self.add_biomass_pools(tree, species, 1.0, 0.0, 1.0, 0.0, 1.0);
    }

    /// Residuals of a harvested tree. The removed fractions leave the
    /// system; the rest falls to the soil. Nothing becomes a new snag.
    ///
    /// # Errors
    /// Rejects removal fractions outside [0, 1].
    pub fn add_harvest(
        &mut self,
        tree: &DeadTree,
        species: &Species,
        remove_stem_fraction: f64,
        remove_branch_fraction: f64,
        remove_foliage_fraction: f64,
    ) -> Result<(), SnagError> {
        check_fraction("remove_stem_fraction", remove_stem_fraction)?;
        check_fraction("remove_branch_fraction", remove_branch_fraction)?;
        check_fraction("remove_foliage_fraction", remove_foliage_fraction)?;
        self.add_biomass_pools(
            tree,
            species,
            0.0,
            1.0 - remove_stem_fraction,
            0.0,
            1.0 - remove_branch_fraction,
            1.0 - remove_foliage_fraction,
        );
        Ok(())
    }

    /// A tree killed by fire, wind, or insects, with caller-supplied
    /// routing fractions.
    ///
    /// # Errors
    /// Rejects fractions outside [0, 1] and compartment pairs summing
    /// above 1.
    pub fn add_disturbance(
        &mut self,
        tree: &DeadTree,
        species: &Species,
        stem_to_snag: f64,
        stem_to_soil: f64,
        branch_to_snag: f64,
        branch_to_soil: f64,
        foliage_to_soil: f64,
    ) -> Result<(), SnagError> {
        check_fraction("stem_to_snag", stem_to_snag)?;
        check_fraction("stem_to_soil", stem_to_soil)?;
        check_fraction("branch_to_snag", branch_to_snag)?;
        check_fraction("branch_to_soil", branch_to_soil)?;
        check_fraction("foliage_to_soil", foliage_to_soil)?;
        check_fraction("stem_to_snag + stem_to_soil", stem_to_snag + stem_to_soil)?;
        check_fraction(
            "branch_to_snag + branch_to_soil",
            branch_to_snag + branch_to_soil,
        )?;
        self.add_biomass_pools(
            tree,
            species,
            stem_to_snag,
            stem_to_soil,
            branch_to_snag,
            branch_to_soil,
            foliage_to_soil,
        );
        Ok(())
    }

    /// Foliage and fine-root litter of live trees, transferred during
    /// growth. Goes straight to the labile soil flux.
    pub fn add_turnover_litter(
        &mut self,
        species: &Species,
        litter_foliage_kg: f64,
        litter_fineroot_kg: f64,
    ) {
        self.labile_flux
            .add_biomass(litter_foliage_kg, species.cn_foliage, species.snag_kyl);
        self.labile_flux
            .add_biomass(litter_fineroot_kg, species.cn_fineroot, species.snag_kyl);
    }

    /// Woody turnover (branch shed and coarse-root analog) of live trees.
    /// Goes straight to the refractory soil flux.
    pub fn add_turnover_wood(&mut self, species: &Species, woody_biomass_kg: f64) {
        self.refractory_flux
            .add_biomass(woody_biomass_kg, species.cn_wood, species.snag_kyr);
    }

    /// Flux from the regeneration layer: dead saplings' woody and litter
    /// mass falls straight into the soil pools without a standing phase.
    pub fn add_to_soil(&mut self, species: &Species, woody: CnPair, litter: CnPair) {
        self.labile_flux.add(litter, species.snag_kyl);
        self.refractory_flux.add(woody, species.snag_kyr);
    }

    /// A disturbance (e.g. fire) consumes `factor` of all standing and
    /// basket pools, including this year's input pools. The removed share is
    /// accounted as disturbance flux; the pools stay standing otherwise.
    ///
    /// # Errors
    /// Rejects a factor outside [0, 1].
    pub fn remove_carbon(&mut self, factor: f64) -> Result<(), SnagError> {
        check_fraction("factor", factor)?;
        for class in &mut self.classes {
            self.flux_to_disturbance += (class.swd() + class.input()) * factor;
            class.swd *= 1.0 - factor;
            class.input *= 1.0 - factor;
        }
        for basket in &mut self.other_wood {
            self.flux_to_disturbance += basket.content() * factor;
            *basket *= 1.0 - factor;
        }
        Ok(())
    }

    /// A management operation cuts `factor` of the standing stems (and
    /// baskets) down and leaves them on the ground: the felled share moves
    /// to the refractory soil flux instead of leaving the system.
    ///
    /// # Errors
    /// Rejects a factor outside [0, 1].
    pub fn management(&mut self, factor: f64) -> Result<(), SnagError> {
        check_fraction("factor", factor)?;
        for class in &mut self.classes {
            let felled = class.swd() * factor;
            self.swd_to_soil += felled;
            self.refractory_flux.add(felled, class.swd.decomposition_rate);
            class.swd *= 1.0 - factor;
        }
        for basket in &mut self.other_wood {
            self.refractory_flux
                .add(basket.content() * factor, basket.decomposition_rate);
            *basket *= 1.0 - factor;
        }
        Ok(())
    }

    /// True iff every pool, input pool, and pending soil flux is empty.
    pub fn is_empty(&self) -> bool {
        self.labile_flux.is_empty()
            && self.refractory_flux.is_empty()
            && self
                .classes
                .iter()
                .all(|class| class.swd.is_empty() && class.input.is_empty())
            && self.other_wood.iter().all(|basket| basket.is_empty())
    }

    /// Litter flux to the labile soil pool (kg/ha).
    pub fn labile_flux(&self) -> &CnPool {
        &self.labile_flux
    }

    /// Deadwood flux to the refractory soil pool (kg/ha).
    pub fn refractory_flux(&self) -> &CnPool {
        &self.refractory_flux
    }

    /// The 're' climate factor of the current year.
    pub fn climate_factor(&self) -> f64 {
        self.climate_factor
    }

    /// Carbon over all standing pools and baskets (kg C/ha).
    pub fn total_carbon(&self) -> f64 {
        self.total_carbon
    }

    /// Sum of C and N over the three standing pools (kg/ha).
    pub fn total_swd(&self) -> CnPair {
        self.total_swd
    }

    /// Sum of C and N over the five branch/coarse-root baskets (kg/ha).
    pub fn total_other_wood(&self) -> CnPair {
        self.total_other
    }

    /// Heterotrophic respiration of the year (kg/ha to the atmosphere).
    pub fn flux_to_atmosphere(&self) -> CnPair {
        self.flux_to_atmosphere
    }

    /// Mass removed from the site this year (harvest, combustion) (kg/ha).
    pub fn flux_to_extern(&self) -> CnPair {
        self.flux_to_extern
    }

    /// Mass consumed by disturbance this year (kg/ha).
    pub fn flux_to_disturbance(&self) -> CnPair {
        self.flux_to_disturbance
    }

    /// All woody input into the snag pools this year (kg/ha).
    pub fn total_input(&self) -> CnPair {
        self.total_in
    }

    /// Mass transferred from standing pools to the soil this year (kg/ha).
    pub fn swd_to_soil(&self) -> CnPair {
        self.swd_to_soil
    }

    /// The diameter class record of one size class.
    pub fn class(&self, size_class: SizeClass) -> &SwdClass {
        &self.classes[size_class.index()]
    }

    /// The five branch/coarse-root baskets.
    pub fn other_wood(&self) -> &[CnPool; OTHER_WOOD_BASKETS] {
        &self.other_wood
    }

    /// Index of the basket that will be flushed by the next annual update.
    pub fn branch_index(&self) -> usize {
        self.branch_index
    }

    /// A serializable view of the full state for reporting and output
    /// encoding.
    pub fn snapshot(&self) -> SnagSnapshot {
        SnagSnapshot {
            total_carbon: self.total_carbon,
            input_carbon: self.total_in.carbon,
            atmosphere_carbon: self.flux_to_atmosphere.carbon,
            swd_to_soil: self.swd_to_soil,
            labile_flux: self.labile_flux.content(),
            refractory_flux: self.refractory_flux.content(),
            climate_factor: self.climate_factor,
            classes: SizeClass::ALL.map(|size_class| {
                let class = self.class(size_class);
                SwdClassSnapshot {
                    swd: class.swd(),
                    input: class.input(),
                    stem_count: class.stem_count(),
                    time_since_death: class.time_since_death(),
                    avg_dbh_cm: class.avg_dbh_cm(),
                    avg_height_m: class.avg_height_m(),
                    avg_volume_m3: class.avg_volume_m3(),
                }
            }),
            other_wood: self.other_wood.map(|pool| pool.content()),
        }
    }
}

fn check_fraction(what: &'static str, value: f64) -> Result<(), SnagError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SnagError::FractionOutOfRange { what, value })
    }
}

/// Per-class state view for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwdClassSnapshot {
    pub swd: CnPair,
    pub input: CnPair,
    pub stem_count: f64,
    pub time_since_death: f64,
    pub avg_dbh_cm: f64,
    pub avg_height_m: f64,
    pub avg_volume_m3: f64,
}

/// Full-state view for reporting: totals, the per-year fluxes, the three
/// diameter classes and the five baskets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnagSnapshot {
    pub total_carbon: f64,
    pub input_carbon: f64,
    pub atmosphere_carbon: f64,
    pub swd_to_soil: CnPair,
    pub labile_flux: CnPair,
    pub refractory_flux: CnPair,
    pub climate_factor: f64,
    pub classes: [SwdClassSnapshot; 3],
    pub other_wood: [CnPair; 5],
}
