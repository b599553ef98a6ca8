use crate::core::assessment::Assessment;
use crate::core::pipeline::CalculationStage;
use crate::reference_data::{RatingBand, ReferenceData};
use serde::Serialize;

/// Energy cost deflator (SAP 2012 section 13).
pub const ENERGY_COST_DEFLATOR: f64 = 0.42;
/// Floor area added to the dwelling's own when normalising cost.
const FLOOR_AREA_OFFSET: f64 = 45.;
/// Energy cost factor at which the rating switches from the linear to the logarithmic fit.
const LOGARITHMIC_THRESHOLD: f64 = 3.5;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SapRating {
    pub energy_cost_deflator: f64,
    pub energy_cost_factor: f64,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<RatingBand>,
}

pub fn energy_cost_factor(total_cost: f64, total_floor_area: f64) -> f64 {
    total_cost * ENERGY_COST_DEFLATOR / (total_floor_area + FLOOR_AREA_OFFSET)
}

/// The two fits do not quite meet at the threshold; the rating steps by about 0.007 there.
pub fn rating_for(energy_cost_factor: f64) -> f64 {
    if energy_cost_factor >= LOGARITHMIC_THRESHOLD {
        117. - 121. * energy_cost_factor.log10()
    } else {
        100. - 13.95 * energy_cost_factor
    }
}

/// Band for a rating, rounded to the nearest whole number. Ratings beyond either end of the
/// scale take the end band.
pub fn band_for(rating: f64, bands: &[RatingBand]) -> Option<&RatingBand> {
    if rating.is_nan() {
        return None;
    }
    let top = bands.iter().map(|band| band.end).max()?;
    let bottom = bands.iter().map(|band| band.start).min()?;
    let rounded = (rating.round() as i32).clamp(bottom, top);

    bands
        .iter()
        .find(|band| (band.start..=band.end).contains(&rounded))
}

pub(crate) struct RatingStage;

impl CalculationStage for RatingStage {
    fn name(&self) -> &'static str {
        "rating"
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let energy_cost_factor =
            energy_cost_factor(assessment.total_cost, assessment.total_floor_area);
        let rating = rating_for(energy_cost_factor);

        assessment.sap = SapRating {
            energy_cost_deflator: ENERGY_COST_DEFLATOR,
            energy_cost_factor,
            rating,
            band: band_for(rating, &reference.rating_bands).cloned(),
        };

        Ok(())
    }
}
