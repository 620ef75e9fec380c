//! Climate and water-balance collaborator contracts
//!
//! The decomposition climate modifier needs exactly two inputs per year:
//! daily mean daytime temperatures (with their month) and the ratio of
//! monthly precipitation to monthly reference evapotranspiration. Weather
//! series parsing and the water-balance computation itself live upstream;
//! this module only carries the values and the run-once contract.

use serde::{Deserialize, Serialize};

/// Days per month of a non-leap year.
pub const DAYS_PER_MONTH: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// One day of driving climate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateDay {
    /// Month index, 0 = January .. 11 = December
    pub month: usize,
    /// Mean daytime air temperature (°C)
    pub mean_daytime_temperature_c: f64,
}

/// One simulation year of driving climate for a resource unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateYear {
    days: Vec<ClimateDay>,
    /// Monthly precipitation sums (mm)
    precipitation_mm: [f64; 12],
}

impl ClimateYear {
    pub fn new(days: Vec<ClimateDay>, precipitation_mm: [f64; 12]) -> Self {
        debug_assert!(!days.is_empty());
        debug_assert!(days.iter().all(|d| d.month < 12));
        ClimateYear {
            days,
            precipitation_mm,
        }
    }

    /// A 365-day year with one temperature for every day and one
    /// precipitation sum per month. Mostly useful for tests and demos.
    pub fn uniform(temperature_c: f64, monthly_precipitation_mm: [f64; 12]) -> Self {
        let mut days = Vec::with_capacity(365);
        for (month, &n) in DAYS_PER_MONTH.iter().enumerate() {
            for _ in 0..n {
                days.push(ClimateDay {
                    month,
                    mean_daytime_temperature_c: temperature_c,
                });
            }
        }
        ClimateYear::new(days, monthly_precipitation_mm)
    }

    pub fn days(&self) -> &[ClimateDay] {
        &self.days
    }

    pub fn days_of_year(&self) -> usize {
        self.days.len()
    }

    /// Precipitation sum of a month (mm), 0-based month index.
    pub fn precipitation_month(&self, month: usize) -> f64 {
        self.precipitation_mm[month]
    }
}

/// Monthly reference evapotranspiration plus the "run once per year"
/// contract of the water-balance collaborator.
///
/// The full water cycle (interception, soil water, PET) is computed outside
/// this subsystem; callers refresh the monthly totals and re-arm the cycle
/// with [`WaterCycle::new_year`]. [`WaterCycle::run`] is idempotent within a
/// year, so the decomposition code may trigger it unconditionally even on
/// resource units without vegetation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterCycle {
    reference_evapotranspiration_mm: [f64; 12],
    has_run: bool,
}

impl WaterCycle {
    pub fn new(reference_evapotranspiration_mm: [f64; 12]) -> Self {
        WaterCycle {
            reference_evapotranspiration_mm,
            has_run: false,
        }
    }

    /// Ensure the water balance of the current year is available. Safe to
    /// call more than once per year.
    pub fn run(&mut self) {
        if self.has_run {
            return;
        }
        self.has_run = true;
    }

    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Re-arm for the next simulation year, optionally with fresh monthly
    /// totals.
    pub fn new_year(&mut self, reference_evapotranspiration_mm: Option<[f64; 12]>) {
        if let Some(pet) = reference_evapotranspiration_mm {
            self.reference_evapotranspiration_mm = pet;
        }
        self.has_run = false;
    }

    /// Monthly reference evapotranspiration (mm), 0-based month index.
    pub fn reference_evapotranspiration(&self) -> &[f64; 12] {
        &self.reference_evapotranspiration_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_year_has_365_days_in_month_order() {
        let year = ClimateYear::uniform(10.0, [50.0; 12]);
        assert_eq!(year.days_of_year(), 365);
        assert_eq!(year.days()[0].month, 0);
        assert_eq!(year.days()[30].month, 0);
        assert_eq!(year.days()[31].month, 1);
        assert_eq!(year.days()[364].month, 11);
    }

    #[test]
    fn test_water_cycle_runs_once_per_year() {
        let mut cycle = WaterCycle::new([60.0; 12]);
        assert!(!cycle.has_run());

        cycle.run();
        cycle.run();
        assert!(cycle.has_run());

        cycle.new_year(Some([70.0; 12]));
        assert!(!cycle.has_run());
        assert!((cycle.reference_evapotranspiration()[0] - 70.0).abs() < 1e-12);
    }
}
