//! Carbon/nitrogen mass bookkeeping primitives
//!
//! All pools in the deadwood subsystem are expressed as paired carbon and
//! nitrogen masses in kg per hectare. Biomass inputs (kg dry matter) are
//! converted to carbon with a fixed carbon fraction; nitrogen is derived from
//! the compartment's C:N ratio.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Deref, DerefMut, Mul, MulAssign, Sub};

/// Fraction of dry biomass that is carbon (kg C / kg biomass).
pub const BIOMASS_C_FRACTION: f64 = 0.5;

/// A duple of carbon and nitrogen mass (kg/ha).
///
/// Use [`CnPair::add_biomass`] to add dry biomass with a known C:N ratio;
/// use the arithmetic operators for pool-to-pool transfers and scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CnPair {
    /// Carbon mass (kg C/ha)
    pub carbon: f64,
    /// Nitrogen mass (kg N/ha)
    pub nitrogen: f64,
}

impl CnPair {
    pub const fn new(carbon: f64, nitrogen: f64) -> Self {
        CnPair { carbon, nitrogen }
    }

    /// Add dry biomass (kg/ha). Carbon is `biomass * BIOMASS_C_FRACTION`,
    /// nitrogen follows from the compartment C:N ratio.
    pub fn add_biomass(&mut self, biomass: f64, cn_ratio: f64) {
        debug_assert!(biomass >= 0.0);
        debug_assert!(cn_ratio > 0.0);
        self.carbon += biomass * BIOMASS_C_FRACTION;
        self.nitrogen += biomass * BIOMASS_C_FRACTION / cn_ratio;
    }

    /// True iff both masses are exactly zero.
    pub fn is_empty(&self) -> bool {
        self.carbon == 0.0 && self.nitrogen == 0.0
    }

    /// True iff neither mass is negative. Negative intermediate values
    /// indicate a caller defect, not a runtime condition.
    pub fn is_valid(&self) -> bool {
        self.carbon >= 0.0 && self.nitrogen >= 0.0
    }

    /// Current C:N ratio, or 0 for a pool without nitrogen.
    pub fn cn_ratio(&self) -> f64 {
        if self.nitrogen > 0.0 {
            self.carbon / self.nitrogen
        } else {
            0.0
        }
    }

    /// Dry biomass equivalent (kg/ha) of the carbon content.
    pub fn biomass(&self) -> f64 {
        self.carbon / BIOMASS_C_FRACTION
    }

    pub fn clear(&mut self) {
        self.carbon = 0.0;
        self.nitrogen = 0.0;
    }
}

impl Add for CnPair {
    type Output = CnPair;
    fn add(self, rhs: CnPair) -> CnPair {
        CnPair::new(self.carbon + rhs.carbon, self.nitrogen + rhs.nitrogen)
    }
}

impl AddAssign for CnPair {
    fn add_assign(&mut self, rhs: CnPair) {
        self.carbon += rhs.carbon;
        self.nitrogen += rhs.nitrogen;
    }
}

impl Sub for CnPair {
    type Output = CnPair;
    fn sub(self, rhs: CnPair) -> CnPair {
        CnPair::new(self.carbon - rhs.carbon, self.nitrogen - rhs.nitrogen)
    }
}

impl Mul<f64> for CnPair {
    type Output = CnPair;
    fn mul(self, factor: f64) -> CnPair {
        CnPair::new(self.carbon * factor, self.nitrogen * factor)
    }
}

impl MulAssign<f64> for CnPair {
    fn mul_assign(&mut self, factor: f64) {
        self.carbon *= factor;
        self.nitrogen *= factor;
    }
}

/// A [`CnPair`] carrying an associated decomposition rate (1/yr).
///
/// The rate is last-writer-wins: pools fed from a single rate regime carry
/// that regime's rate, and mixed-regime pools (the current-year snag input)
/// are blended by the caller with explicit carbon-mass weighting before the
/// merge. Scaling a pool leaves the rate untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CnPool {
    mass: CnPair,
    /// Annual fractional decomposition rate applied to this pool.
    pub decomposition_rate: f64,
}

impl CnPool {
    pub const fn new(carbon: f64, nitrogen: f64, decomposition_rate: f64) -> Self {
        CnPool {
            mass: CnPair::new(carbon, nitrogen),
            decomposition_rate,
        }
    }

    /// Add dry biomass (kg/ha) with a compartment C:N ratio, and set the
    /// pool's decomposition rate. Adding zero biomass is a no-op and leaves
    /// the current rate in place.
    pub fn add_biomass(&mut self, biomass: f64, cn_ratio: f64, decomposition_rate: f64) {
        if biomass == 0.0 {
            return;
        }
        self.mass.add_biomass(biomass, cn_ratio);
        self.decomposition_rate = decomposition_rate;
    }

    /// Merge another pool's masses and overwrite the decomposition rate.
    pub fn add(&mut self, other: CnPair, decomposition_rate: f64) {
        self.mass += other;
        self.decomposition_rate = decomposition_rate;
    }

    /// Zero both masses. The rate is unspecified until the next add.
    pub fn clear(&mut self) {
        self.mass.clear();
        self.decomposition_rate = 0.0;
    }

    /// The carbon/nitrogen content, without the rate.
    pub fn content(&self) -> CnPair {
        self.mass
    }
}

impl Deref for CnPool {
    type Target = CnPair;
    fn deref(&self) -> &CnPair {
        &self.mass
    }
}

impl DerefMut for CnPool {
    fn deref_mut(&mut self) -> &mut CnPair {
        &mut self.mass
    }
}

impl Mul<f64> for CnPool {
    type Output = CnPool;
    fn mul(self, factor: f64) -> CnPool {
        CnPool {
            mass: self.mass * factor,
            decomposition_rate: self.decomposition_rate,
        }
    }
}

impl MulAssign<f64> for CnPool {
    fn mul_assign(&mut self, factor: f64) {
        self.mass *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_biomass_derives_nitrogen_from_cn_ratio() {
        let mut pair = CnPair::default();
        pair.add_biomass(1000.0, 50.0);

        assert!((pair.carbon - 500.0).abs() < 1e-12);
        assert!((pair.nitrogen - 10.0).abs() < 1e-12);
        assert!((pair.cn_ratio() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_pair_operators() {
        let a = CnPair::new(100.0, 2.0);
        let b = CnPair::new(50.0, 1.0);

        let sum = a + b;
        assert_eq!(sum, CnPair::new(150.0, 3.0));

        let diff = sum - b;
        assert_eq!(diff, a);

        let scaled = a * 0.5;
        assert_eq!(scaled, CnPair::new(50.0, 1.0));
    }

    #[test]
    fn test_empty_requires_both_masses_zero() {
        assert!(CnPair::default().is_empty());
        assert!(!CnPair::new(0.0, 1.0).is_empty());
        assert!(!CnPair::new(1.0, 0.0).is_empty());
    }

    #[test]
    fn test_pool_rate_is_last_writer_wins() {
        let mut pool = CnPool::default();
        pool.add_biomass(100.0, 50.0, 0.3);
        pool.add_biomass(100.0, 50.0, 0.1);

        assert!((pool.decomposition_rate - 0.1).abs() < 1e-12);
        assert!((pool.carbon - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_pool_zero_biomass_keeps_rate() {
        let mut pool = CnPool::default();
        pool.add_biomass(100.0, 50.0, 0.3);
        pool.add_biomass(0.0, 50.0, 0.9);

        assert!((pool.decomposition_rate - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_pool_scaling_keeps_rate() {
        let mut pool = CnPool::new(200.0, 4.0, 0.25);
        pool *= 0.5;

        assert!((pool.carbon - 100.0).abs() < 1e-12);
        assert!((pool.nitrogen - 2.0).abs() < 1e-12);
        assert!((pool.decomposition_rate - 0.25).abs() < 1e-12);
    }
}
