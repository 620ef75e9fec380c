//! Climate modifier for decomposition rates ("re")
//!
//! Decomposition of dead organic matter speeds up with temperature and with
//! water availability. Both effects are collapsed into one annual scalar
//! that multiplies every decay rate of the year: the arithmetic mean over
//! all days of a temperature response times the month's water response.
//!
//! # Scientific References
//! - Lloyd, J. & Taylor, J.A. (1994). "On the temperature dependence of
//!   soil respiration", Functional Ecology 8, 315-323 (variable-Q10 form)
//! - Adair, E.C. et al. (2008). "Simple three-pool model accurately
//!   describes patterns of long-term litter decomposition",
//!   Global Change Biology 14, 2636-2660 (water limitation term)

use crate::core_types::{ClimateYear, WaterCycle};

/// Monthly water modifier from the precipitation / reference
/// evapotranspiration ratio (Adair et al. 2008).
///
/// `fw = 1 / (1 + 30 · e^(−8.5 · P/PET))`
///
/// A month without reference evapotranspiration is treated as fully
/// water-limited (ratio 0), not as an error.
pub fn water_modifier(precipitation_mm: f64, reference_evapotranspiration_mm: f64) -> f64 {
    let ratio = if reference_evapotranspiration_mm > 0.0 {
        precipitation_mm / reference_evapotranspiration_mm
    } else {
        0.0
    };
    1.0 / (1.0 + 30.0 * (-8.5 * ratio).exp())
}

/// Daily temperature modifier, empirical variable-Q10 model of Lloyd and
/// Taylor (1994).
///
/// `ft = exp(308.56 · (1/56.02 − 1/(T + 273.15 − 227.13)))`
pub fn temperature_modifier(mean_daytime_temperature_c: f64) -> f64 {
    (308.56 * (1.0 / 56.02 - 1.0 / (mean_daytime_temperature_c + 273.15 - 227.13))).exp()
}

/// Annual climate decomposition factor: mean of `ft · fw` over all days of
/// the year. Strictly positive for any finite input.
pub(crate) fn annual_climate_factor(climate: &ClimateYear, water: &WaterCycle) -> f64 {
    let mut fw_month = [0.0; 12];
    for (month, fw) in fw_month.iter_mut().enumerate() {
        *fw = water_modifier(
            climate.precipitation_month(month),
            water.reference_evapotranspiration()[month],
        );
    }

    let mut f_sum = 0.0;
    for day in climate.days() {
        f_sum += temperature_modifier(day.mean_daytime_temperature_c) * fw_month[day.month];
    }
    f_sum / climate.days_of_year() as f64
}
