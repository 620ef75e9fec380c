//! Deadwood dynamics validation suite
//!
//! Exercises the annual snag state machine end to end: carbon balance over a
//! mixed routing year, basket rotation determinism, cohort emptying, the
//! weighted statistics of merging mortality cohorts, and the published decay
//! scenario numbers.
//!
//! # References
//! - Lloyd & Taylor (1994): temperature response of decomposition
//! - Adair et al. (2008): water limitation of litter decay
//! - Harmon & Marks (2002), Standcarb2: snag fall lag times

use approx::{assert_abs_diff_eq, assert_relative_eq};
use snag_sim_core::{
    ClimateYear, DeadTree, SizeClass, Snag, SnagConfig, Species, WaterCycle,
};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Uniform 10 °C / very wet year: ft is exactly 1 at 10 °C and fw saturates,
/// so the annual climate factor is 1 to within 1e-9.
fn neutral_climate() -> (ClimateYear, WaterCycle) {
    (
        ClimateYear::uniform(10.0, [300.0; 12]),
        WaterCycle::new([100.0; 12]),
    )
}

fn spruce() -> Species {
    Species::new("Norway spruce", 29.3, 54.2, 452.9, 0.15, 0.0807, 0.04, 17.6).unwrap()
}

fn sample_tree(dbh_cm: f64, stem_kg: f64) -> DeadTree {
    DeadTree {
        dbh_cm,
        height_m: 20.0,
        volume_m3: 0.5,
        stem_kg,
        branch_kg: 40.0,
        foliage_kg: 10.0,
        fine_root_kg: 5.0,
        coarse_root_kg: 50.0,
    }
}

fn snag_with(config: &SnagConfig) -> Snag {
    let mut snag = Snag::new();
    snag.set_thresholds(10.0, 30.0).unwrap();
    snag.setup(config).unwrap();
    snag
}

// ═══════════════════════════════════════════════════════════════════════════
// CARBON BALANCE
// ═══════════════════════════════════════════════════════════════════════════

/// No carbon is created or destroyed: pools after the annual update plus all
/// outgoing fluxes equal pools before plus everything routed in.
#[test]
fn test_carbon_balance_over_mixed_routing_year() {
    init_tracing();
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 1200.0,
        swd_count: 24.0,
        swd_decomp_rate: 0.04,
        swd_half_life: 15.0,
        other_carbon: 600.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let species = spruce();
    let (climate, mut water) = neutral_climate();

    let carbon_before = snag.total_carbon();
    snag.new_year();

    let mortality = sample_tree(22.0, 280.0);
    let harvested = sample_tree(35.0, 900.0);
    let burned = sample_tree(8.0, 60.0);
    snag.add_mortality(&mortality, &species);
    snag.add_harvest(&harvested, &species, 0.9, 0.4, 0.0).unwrap();
    snag.add_disturbance(&burned, &species, 0.6, 0.1, 0.2, 0.3, 0.5)
        .unwrap();
    snag.add_turnover_litter(&species, 120.0, 80.0);
    snag.add_turnover_wood(&species, 90.0);
    snag.remove_carbon(0.1).unwrap();

    snag.calculate_year(&climate, &mut water);

    let routed_biomass = mortality.total_biomass()
        + harvested.total_biomass()
        + burned.total_biomass()
        + 120.0
        + 80.0
        + 90.0;
    let carbon_in = routed_biomass * snag_sim_core::BIOMASS_C_FRACTION;

    let carbon_after = snag.total_carbon()
        + snag.flux_to_atmosphere().carbon
        + snag.flux_to_extern().carbon
        + snag.flux_to_disturbance().carbon
        + snag.labile_flux().carbon
        + snag.refractory_flux().carbon;

    assert_relative_eq!(carbon_after, carbon_before + carbon_in, max_relative = 1e-9);
}

/// Nitrogen is conserved in decaying pools; only carbon is respired to the
/// atmosphere.
#[test]
fn test_nitrogen_balance_for_single_mortality() {
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 500.0,
        swd_cn_ratio: 50.0,
        swd_count: 10.0,
        swd_decomp_rate: 0.04,
        swd_half_life: 15.0,
        other_carbon: 250.0,
        other_cn_ratio: 50.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let species = spruce();
    let (climate, mut water) = neutral_climate();
    let nitrogen_before = (500.0 + 250.0) / 50.0;

    snag.new_year();
    let tree = sample_tree(22.0, 280.0);
    snag.add_mortality(&tree, &species);
    snag.calculate_year(&climate, &mut water);

    let half = snag_sim_core::BIOMASS_C_FRACTION;
    let nitrogen_in = tree.fine_root_kg * half / species.cn_fineroot
        + tree.foliage_kg * half / species.cn_foliage
        + (tree.stem_kg + tree.branch_kg + tree.coarse_root_kg) * half / species.cn_wood;

    let nitrogen_after = snag.total_swd().nitrogen
        + snag.total_other_wood().nitrogen
        + snag.flux_to_atmosphere().nitrogen
        + snag.flux_to_extern().nitrogen
        + snag.flux_to_disturbance().nitrogen
        + snag.labile_flux().nitrogen
        + snag.refractory_flux().nitrogen;

    assert_relative_eq!(
        nitrogen_after,
        nitrogen_before + nitrogen_in,
        max_relative = 1e-9
    );
    // the respiration flux itself carries no nitrogen
    assert_abs_diff_eq!(snag.flux_to_atmosphere().nitrogen, 0.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// BASKET ROTATION
// ═══════════════════════════════════════════════════════════════════════════

/// Starting at rotation index 0 and with no new branch input, five annual
/// updates flush the five baskets exactly once each, in index order.
#[test]
fn test_branch_rotation_flushes_baskets_in_order() {
    init_tracing();
    let mut snag = snag_with(&SnagConfig {
        other_carbon: 500.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    assert_eq!(snag.branch_index(), 0);
    for year in 0..5 {
        assert!(
            !snag.other_wood()[year].is_empty(),
            "basket {year} must still hold mass before its flush year"
        );
        snag.new_year();
        snag.calculate_year(&climate, &mut water);

        assert!(
            snag.other_wood()[year].is_empty(),
            "basket {year} must be flushed in year {year}"
        );
        assert_eq!(snag.branch_index(), (year + 1) % 5);
        assert!(snag.refractory_flux().carbon > 0.0);
    }

    // every basket has been flushed exactly once: nothing is left standing
    assert_abs_diff_eq!(snag.total_carbon(), 0.0);
    assert_eq!(snag.branch_index(), 0);
}

/// A snag with standing carbon but no input still advances the rotation:
/// N years move the index by N mod 5.
#[test]
fn test_rotation_index_advances_modulo_five() {
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 1000.0,
        swd_count: 20.0,
        swd_decomp_rate: 0.04,
        swd_half_life: 15.0,
        other_carbon: 500.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    for _ in 0..7 {
        snag.new_year();
        snag.calculate_year(&climate, &mut water);
    }
    assert_eq!(snag.branch_index(), 7 % 5);
}

/// Basket decay respires carbon but leaves the basket nitrogen in place.
#[test]
fn test_basket_decay_is_carbon_only() {
    let mut snag = snag_with(&SnagConfig {
        other_carbon: 500.0,
        other_cn_ratio: 50.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    snag.new_year();
    snag.calculate_year(&climate, &mut water);

    // baskets 1..4 decayed in place: carbon shrank by exp(-kyr), nitrogen not
    let survival = (-0.0807_f64).exp();
    for basket in &snag.other_wood()[1..] {
        assert_relative_eq!(basket.carbon, 100.0 * survival, max_relative = 1e-6);
        assert_relative_eq!(basket.nitrogen, 2.0, max_relative = 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STANDING COHORT DECAY AND FALL
// ═══════════════════════════════════════════════════════════════════════════

/// The published single-year decay numbers: 1000 kg C at rate 0.3 under a
/// neutral climate loses 1000·(1−e^−0.3) ≈ 259.18 kg C to the atmosphere,
/// then transfers 1−e^(−ln2/10) ≈ 6.70% of the remainder to the soil.
#[test]
fn test_pure_decay_scenario() {
    init_tracing();
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 1000.0,
        swd_cn_ratio: 50.0,
        swd_decomp_rate: 0.3,
        swd_count: 20.0,
        swd_half_life: 10.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    snag.new_year();
    snag.calculate_year(&climate, &mut water);

    assert_relative_eq!(snag.climate_factor(), 1.0, max_relative = 1e-6);

    let survival = (-0.3_f64).exp();
    let after_decay = 1000.0 * survival;
    let transfer = 1.0 - (-(std::f64::consts::LN_2) / 10.0).exp();

    assert_relative_eq!(
        snag.flux_to_atmosphere().carbon,
        1000.0 * (1.0 - survival),
        max_relative = 1e-6
    );
    assert_abs_diff_eq!(snag.flux_to_atmosphere().carbon, 259.18, epsilon = 0.01);
    assert_abs_diff_eq!(transfer, 0.0670, epsilon = 0.0001);

    assert_relative_eq!(
        snag.refractory_flux().carbon,
        after_decay * transfer,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        snag.class(SizeClass::Medium).swd().carbon,
        after_decay * (1.0 - transfer),
        max_relative = 1e-6
    );
    assert_relative_eq!(
        snag.swd_to_soil().carbon,
        snag.refractory_flux().carbon,
        max_relative = 1e-9
    );
}

/// Decay leaves the cohort nitrogen untouched, so the C:N ratio of a
/// standing pool drifts downward over the years. Deliberate model behavior:
/// decomposition releases carbon faster than nitrogen.
#[test]
fn test_standing_pool_cn_ratio_drifts_down() {
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 1000.0,
        swd_cn_ratio: 50.0,
        swd_decomp_rate: 0.3,
        swd_count: 20.0,
        swd_half_life: 10.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    snag.new_year();
    snag.calculate_year(&climate, &mut water);

    let pool = snag.class(SizeClass::Medium).swd();
    assert!(
        pool.cn_ratio() < 50.0,
        "C:N must drift below the initial 50, got {}",
        pool.cn_ratio()
    );
}

/// Small snags fall twice as fast: the transfer of class 0 uses a doubled
/// transition rate.
#[test]
fn test_small_class_falls_twice_as_fast() {
    let species = spruce();
    let (climate, mut water) = neutral_climate();

    // one small and one large tree with the same stem mass
    let mut snag = snag_with(&SnagConfig {
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    snag.new_year();
    snag.add_mortality(&sample_tree(5.0, 200.0), &species);
    snag.add_mortality(&sample_tree(40.0, 200.0), &species);
    snag.calculate_year(&climate, &mut water);

    let small = snag.class(SizeClass::Small).swd().carbon;
    let large = snag.class(SizeClass::Large).swd().carbon;
    assert!(
        small < large,
        "small cohort must lose stems faster: small={small}, large={large}"
    );

    let half_life = species.snag_half_life;
    let decayed = 100.0 * (-species.snag_ksw).exp();
    let transfer_large = 1.0 - (-(std::f64::consts::LN_2) / half_life).exp();
    let transfer_small = 1.0 - (2.0 * -(std::f64::consts::LN_2) / half_life).exp();
    assert_relative_eq!(
        small,
        decayed * (1.0 - transfer_small),
        max_relative = 1e-6
    );
    assert_relative_eq!(
        large,
        decayed * (1.0 - transfer_large),
        max_relative = 1e-6
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// COHORT EMPTYING
// ═══════════════════════════════════════════════════════════════════════════

/// A cohort that drops below half a stem is emptied to the soil in the same
/// annual update, and its statistics are zeroed.
#[test]
fn test_cohort_with_sub_half_stem_count_is_emptied() {
    init_tracing();
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 100.0,
        swd_cn_ratio: 50.0,
        swd_decomp_rate: 0.04,
        swd_count: 0.4,
        swd_half_life: 10.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    snag.new_year();
    snag.calculate_year(&climate, &mut water);

    let medium = snag.class(SizeClass::Medium);
    assert!(medium.swd().is_empty());
    assert_abs_diff_eq!(medium.time_since_death(), 0.0);
    assert_abs_diff_eq!(medium.half_life(), 0.0);
    assert_abs_diff_eq!(medium.decay_rate(), 0.0);
    assert_abs_diff_eq!(medium.avg_dbh_cm(), 0.0);

    // everything that was not respired reached the refractory soil flux
    assert_relative_eq!(
        snag.refractory_flux().carbon,
        100.0 - snag.flux_to_atmosphere().carbon,
        max_relative = 1e-9
    );
    assert_abs_diff_eq!(snag.total_carbon(), 0.0);
}

/// A cohort whose average stem falls below the class carbon threshold is
/// emptied even with more than half a stem remaining.
#[test]
fn test_cohort_below_carbon_threshold_is_emptied() {
    // medium class threshold at thresholds (10, 30) is derived from a 20 cm
    // stem: 0.10568 · 20^2.4247 · 0.5 · 0.1 ≈ 7.5 kg C per stem
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 40.0,
        swd_cn_ratio: 50.0,
        swd_decomp_rate: 0.04,
        swd_count: 10.0,
        swd_half_life: 10.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let (climate, mut water) = neutral_climate();

    snag.new_year();
    snag.calculate_year(&climate, &mut water);

    // 4 kg C per stem is far below the ~7.5 kg threshold
    assert!(snag.class(SizeClass::Medium).swd().is_empty());
    assert_abs_diff_eq!(snag.total_carbon(), 0.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// MORTALITY ROUTING AND WEIGHTED STATISTICS
// ═══════════════════════════════════════════════════════════════════════════

/// Stem-count-weighted averages: two stems of 5 and 15 cm entering the same
/// empty class average to 10 cm with a count of 2.
#[test]
fn test_weighted_average_dbh_of_two_trees() {
    // thresholds chosen so both diameters classify as the small class
    let mut snag = Snag::new();
    snag.set_thresholds(20.0, 40.0).unwrap();
    snag.setup(&SnagConfig {
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    })
    .unwrap();
    let species = spruce();

    snag.new_year();
    snag.add_mortality(&sample_tree(5.0, 150.0), &species);
    snag.add_mortality(&sample_tree(15.0, 150.0), &species);

    let small = snag.class(SizeClass::Small);
    assert_relative_eq!(small.avg_dbh_cm(), 10.0, max_relative = 1e-9);
    assert_relative_eq!(small.stem_count(), 2.0, max_relative = 1e-12);
    assert_relative_eq!(small.half_life(), species.snag_half_life, max_relative = 1e-9);
    // both stems are pending until the annual merge
    assert_relative_eq!(
        small.input().carbon,
        300.0 * snag_sim_core::BIOMASS_C_FRACTION,
        max_relative = 1e-12
    );
}

/// The decay rate of a merged cohort is blended by carbon mass, not stem
/// count.
#[test]
fn test_merge_blends_decay_rate_by_carbon_mass() {
    let mut snag = snag_with(&SnagConfig {
        swd_carbon: 300.0,
        swd_cn_ratio: 50.0,
        swd_decomp_rate: 0.10,
        swd_count: 6.0,
        swd_half_life: 20.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let species = spruce(); // ksw = 0.04
    let (climate, mut water) = neutral_climate();

    snag.new_year();
    // 200 kg stem = 100 kg C of new input at rate 0.04 joins 300 kg C at 0.10
    snag.add_mortality(&sample_tree(20.0, 200.0), &species);
    snag.calculate_year(&climate, &mut water);

    let expected = 0.10 * (300.0 / 400.0) + 0.04 * (100.0 / 400.0);
    assert_relative_eq!(
        snag.class(SizeClass::Medium).decay_rate(),
        expected,
        max_relative = 1e-9
    );
}

/// Full-removal harvest: stem, branch, and foliage leave the system
/// entirely; fine roots still reach the labile soil flux and coarse roots
/// still enter the basket rotation.
#[test]
fn test_harvest_with_full_removal() {
    init_tracing();
    let mut snag = snag_with(&SnagConfig {
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let species = spruce();
    let tree = sample_tree(25.0, 400.0);

    snag.new_year();
    snag.add_harvest(&tree, &species, 1.0, 1.0, 1.0).unwrap();

    let half = snag_sim_core::BIOMASS_C_FRACTION;
    assert_relative_eq!(
        snag.flux_to_extern().carbon,
        (tree.stem_kg + tree.branch_kg + tree.foliage_kg) * half,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        snag.labile_flux().carbon,
        tree.fine_root_kg * half,
        max_relative = 1e-12
    );
    assert_abs_diff_eq!(snag.refractory_flux().carbon, 0.0);

    // no new standing stems anywhere
    for size_class in SizeClass::ALL {
        assert!(snag.class(size_class).input().is_empty());
        assert_abs_diff_eq!(snag.class(size_class).stem_count(), 0.0);
    }
    // coarse roots are spread equally over the five baskets
    for basket in snag.other_wood() {
        assert_relative_eq!(
            basket.carbon,
            tree.coarse_root_kg * half / 5.0,
            max_relative = 1e-12
        );
    }
}

/// Disturbance routing validates its fraction contract.
#[test]
fn test_disturbance_rejects_invalid_fractions() {
    let mut snag = snag_with(&SnagConfig {
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    });
    let species = spruce();
    let tree = sample_tree(25.0, 400.0);

    assert!(snag
        .add_disturbance(&tree, &species, 1.2, 0.0, 0.0, 0.0, 0.0)
        .is_err());
    // stem fractions summing above 1 are rejected as a pair
    assert!(snag
        .add_disturbance(&tree, &species, 0.7, 0.7, 0.0, 0.0, 0.0)
        .is_err());
    assert!(snag
        .add_disturbance(&tree, &species, 0.5, 0.5, 0.5, 0.5, 1.0)
        .is_ok());
}

// ═══════════════════════════════════════════════════════════════════════════
// CLIMATE FACTOR
// ═══════════════════════════════════════════════════════════════════════════

/// The climate factor is finite and strictly positive for any valid input,
/// and it is computed even when the snag state is empty.
#[test]
fn test_climate_factor_bounds_and_unconditional_computation() {
    let mut snag = Snag::new();
    snag.set_thresholds(10.0, 30.0).unwrap();
    snag.setup(&SnagConfig::default()).unwrap();

    for (temperature, precipitation, pet) in [
        (-40.0, [0.0; 12], [0.0; 12]),
        (45.0, [400.0; 12], [20.0; 12]),
        (10.0, [0.0; 12], [150.0; 12]),
    ] {
        let climate = ClimateYear::uniform(temperature, precipitation);
        let mut water = WaterCycle::new(pet);

        snag.new_year();
        snag.calculate_year(&climate, &mut water);

        assert!(snag.climate_factor().is_finite());
        assert!(snag.climate_factor() > 0.0);
        assert!(water.has_run(), "the annual update must trigger the water cycle");
    }
}

/// Warm years shorten the standing time: the climate-adjusted half-life
/// moves more carbon to the ground than a cold year does.
#[test]
fn test_warm_year_accelerates_snag_fall() {
    let config = SnagConfig {
        swd_carbon: 1000.0,
        swd_count: 20.0,
        swd_decomp_rate: 0.04,
        swd_half_life: 15.0,
        young_refractory_decomp_rate: 0.0807,
        ..SnagConfig::default()
    };
    let mut warm = snag_with(&config);
    let mut cold = snag_with(&config);

    let precipitation = [80.0; 12];
    let pet = [60.0; 12];

    warm.new_year();
    warm.calculate_year(
        &ClimateYear::uniform(18.0, precipitation),
        &mut WaterCycle::new(pet),
    );
    cold.new_year();
    cold.calculate_year(
        &ClimateYear::uniform(0.0, precipitation),
        &mut WaterCycle::new(pet),
    );

    assert!(warm.climate_factor() > cold.climate_factor());
    assert!(warm.swd_to_soil().carbon > cold.swd_to_soil().carbon);
    assert!(warm.flux_to_atmosphere().carbon > cold.flux_to_atmosphere().carbon);
}
