use crate::core::assessment::{Assessment, GainCategory};
use crate::core::monthly::MonthVector;
use crate::core::pipeline::CalculationStage;
use crate::core::units::{
    kwh_per_month_to_watts, watts_to_kwh_per_year, DAYS_IN_MONTH, DAYS_PER_YEAR, HOURS_PER_DAY,
    WATTS_PER_KILOWATT,
};
use crate::input::{ApplianceInput, RequirementKind};
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};
use std::f64::consts::PI;

/// Share of lighting and appliance energy that ends up as heat in the dwelling.
const ELECTRICAL_GAINS_FRACTION: f64 = 0.85;

/// Monthly energy use with a cosine seasonal profile, and the internal gains it produces.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeasonalUse {
    /// kWh
    pub energy: MonthVector,
    /// W
    pub gains: MonthVector,
    pub annual_kwh: f64,
}

impl SeasonalUse {
    /// Spread `annual_baseline` (kWh) over the year as
    /// `baseline (1 + scale cos(2π (m - shift) / 12)) nm / 365`, with gains scaled by `reduction`.
    pub fn new(annual_baseline: f64, scale: f64, shift: f64, reduction: f64) -> Self {
        let energy = MonthVector::from_fn(|m| {
            annual_baseline
                * (1. + scale * (2. * PI * (m as f64 - shift) / 12.).cos())
                * DAYS_IN_MONTH[m] as f64
                / DAYS_PER_YEAR as f64
        });
        let gains = MonthVector::from_fn(|m| {
            kwh_per_month_to_watts(energy[m], m) * ELECTRICAL_GAINS_FRACTION * reduction
        });

        Self {
            energy,
            gains,
            annual_kwh: energy.sum(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LightingResults {
    /// correction for low energy lighting outlets
    #[serde(rename = "C1")]
    pub low_energy_correction: f64,
    /// correction for daylight through glazing
    #[serde(rename = "C2")]
    pub daylight_correction: f64,
    #[serde(rename = "EL")]
    pub annual_energy: f64,
    #[serde(flatten)]
    pub usage: SeasonalUse,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LacResults {
    /// lighting energy with no low energy lighting (kWh/year)
    #[serde(rename = "EB")]
    pub lighting_baseline: f64,
    /// absent when the dwelling has no lighting outlets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<LightingResults>,
    #[serde(rename = "EA")]
    pub appliances_annual_energy: f64,
    pub appliances: SeasonalUse,
    /// cooking gains (W)
    #[serde(rename = "GC")]
    pub cooking_gains: f64,
    #[serde(rename = "EC")]
    pub cooking_annual_energy: f64,
}

/// Daylight correction C2 (L1) for a glazing light ratio GL.
fn daylight_correction(glazing_light_ratio: f64) -> f64 {
    if glazing_light_ratio <= 0.095 {
        52.2 * glazing_light_ratio.powi(2) - 9.94 * glazing_light_ratio + 1.433
    } else {
        0.96
    }
}

/// Lighting, appliances and cooking (Appendix L).
pub(crate) struct LacStage;

impl CalculationStage for LacStage {
    fn name(&self) -> &'static str {
        "LAC"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "use_LAC": false,
            "LAC": {
                "LLE": 1,
                "L": 1,
                "reduced_internal_heat_gains": false
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        _reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let lac = &assessment.input.lac;
        let use_lac = assessment.input.use_lac;
        let reduced = lac.reduced_internal_heat_gains;
        let occupancy = assessment.occupancy;

        let x = (assessment.total_floor_area * occupancy).powf(0.4714);
        let lighting_baseline = 59.73 * x;

        let lighting = (lac.outlets != 0.).then(|| {
            let low_energy_correction = 1. - 0.5 * lac.low_energy_outlets / lac.outlets;
            let daylight_correction = daylight_correction(assessment.glazing_light_ratio);
            let annual_energy = lighting_baseline * low_energy_correction * daylight_correction;
            LightingResults {
                low_energy_correction,
                daylight_correction,
                annual_energy,
                usage: SeasonalUse::new(annual_energy, 0.5, 0.2, if reduced { 0.4 } else { 1. }),
            }
        });

        let appliances = SeasonalUse::new(207.8 * x, 0.157, 1.78, if reduced { 0.67 } else { 1. });

        let cooking_gains = if reduced {
            23. + 5. * occupancy
        } else {
            35. + 7. * occupancy
        };
        let cooking_annual_energy = watts_to_kwh_per_year(cooking_gains);

        if use_lac {
            if let Some(lighting) = &lighting {
                assessment
                    .gains
                    .insert(GainCategory::Lighting, lighting.usage.gains);
                if lighting.usage.annual_kwh > 0. {
                    assessment
                        .register_requirement(RequirementKind::Lighting, lighting.usage.annual_kwh);
                }
            }

            assessment
                .gains
                .insert(GainCategory::Appliances, appliances.gains);
            if appliances.annual_kwh > 0. {
                assessment.register_requirement(RequirementKind::Appliances, appliances.annual_kwh);
            }

            assessment
                .gains
                .insert(GainCategory::Cooking, MonthVector::constant(cooking_gains));
            if cooking_gains > 0. {
                assessment.register_requirement(RequirementKind::Cooking, cooking_annual_energy);
            }
        }

        assessment.lac = LacResults {
            lighting_baseline,
            lighting,
            appliances_annual_energy: appliances.annual_kwh,
            appliances,
            cooking_gains,
            cooking_annual_energy,
        };

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApplianceResult {
    pub name: String,
    pub power: f64,
    pub hours: f64,
    /// Wh per day
    pub energy: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApplianceListResults {
    pub list: Vec<ApplianceResult>,
    pub totalwh: f64,
    pub annualkwh: f64,
    #[serde(rename = "gains_W")]
    pub gains: f64,
}

fn default_appliance() -> ApplianceInput {
    ApplianceInput {
        name: "LED Light".to_string(),
        power: 6.,
        hours: 12.,
    }
}

/// Appliance use from an itemised list, as an alternative to the Appendix L appliance estimate.
pub(crate) struct ApplianceListStage;

impl CalculationStage for ApplianceListStage {
    fn name(&self) -> &'static str {
        "appliancelist"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "use_appliancelist": false,
            "appliancelist": {
                "list": []
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        _reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let default_list = [default_appliance()];
        let appliances = match assessment.input.appliancelist.list.as_slice() {
            [] => &default_list[..],
            list => list,
        };

        let list = appliances
            .iter()
            .map(|appliance| ApplianceResult {
                name: appliance.name.clone(),
                power: appliance.power,
                hours: appliance.hours,
                energy: appliance.power * appliance.hours,
            })
            .collect::<Vec<_>>();

        let totalwh: f64 = list.iter().map(|appliance| appliance.energy).sum();
        let annualkwh = totalwh * DAYS_PER_YEAR as f64 / WATTS_PER_KILOWATT as f64;
        let gains = totalwh / HOURS_PER_DAY as f64;

        if assessment.input.use_appliancelist {
            assessment
                .gains
                .insert(GainCategory::Appliances, MonthVector::constant(gains));
            if annualkwh > 0. {
                assessment.register_requirement(RequirementKind::Appliances, annualkwh);
            }
        }

        assessment.appliancelist = ApplianceListResults {
            list,
            totalwh,
            annualkwh,
            gains,
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::Pipeline;
    use crate::input::InputForProcessing;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn reference_data() -> ReferenceData {
        ReferenceData::sap_2012().unwrap()
    }

    fn assessment_from(reference_data: &ReferenceData, input: Value) -> Assessment {
        let input = Pipeline::standard()
            .prepare(InputForProcessing::init_with_value(input).unwrap(), reference_data)
            .unwrap();
        let mut assessment = Assessment::new(input);
        assessment.total_floor_area = 100.;
        assessment.occupancy = 2.5;
        assessment
    }

    #[rstest]
    fn should_spread_annual_use_over_the_year() {
        let flat = SeasonalUse::new(365., 0., 0., 1.);

        assert_relative_eq!(flat.energy[0], 31.);
        assert_relative_eq!(flat.annual_kwh, 365., max_relative = 1e-12);
        // 1 kWh a day is a steady 41.67 W, of which 85% is a gain
        assert_relative_eq!(flat.gains[5], 1000. / 24. * 0.85, max_relative = 1e-12);

        let seasonal = SeasonalUse::new(365., 0.5, 0., 1.);
        assert!(seasonal.energy[0] > seasonal.energy[6]);
        assert_relative_eq!(seasonal.energy[0], 1.5 * 31.);
    }

    #[rstest]
    #[case(0., 1.433)]
    #[case(0.05, 52.2 * 0.0025 - 0.497 + 1.433)]
    #[case(0.2, 0.96)]
    fn should_correct_lighting_for_daylight(#[case] gl: f64, #[case] expected: f64) {
        assert_relative_eq!(daylight_correction(gl), expected, max_relative = 1e-12);
    }

    #[rstest]
    fn should_register_gains_and_requirements_only_when_enabled(reference_data: ReferenceData) {
        let mut disabled = assessment_from(&reference_data, json!({}));
        LacStage.calculate(&mut disabled, &reference_data).unwrap();

        assert!(disabled.gains.is_empty());
        assert!(disabled.energy_requirements.is_empty());
        assert!(disabled.lac.lighting.is_some());

        let mut enabled = assessment_from(&reference_data, json!({"use_LAC": true}));
        LacStage.calculate(&mut enabled, &reference_data).unwrap();

        assert_eq!(
            enabled.gains.categories().collect::<Vec<_>>(),
            vec![
                GainCategory::Lighting,
                GainCategory::Appliances,
                GainCategory::Cooking
            ]
        );
        assert_eq!(enabled.lac, disabled.lac);
        assert_relative_eq!(
            enabled.energy_requirements[&RequirementKind::Cooking].quantity,
            (35. + 7. * 2.5) * 0.024 * 365.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_halve_lighting_with_only_low_energy_outlets(reference_data: ReferenceData) {
        let mut assessment = assessment_from(
            &reference_data,
            json!({"use_LAC": true, "LAC": {"L": 10, "LLE": 10}}),
        );
        assessment.glazing_light_ratio = 0.2;
        LacStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        let lighting = assessment.lac.lighting.as_ref().unwrap();
        let x = (100f64 * 2.5).powf(0.4714);
        assert_relative_eq!(assessment.lac.lighting_baseline, 59.73 * x);
        assert_relative_eq!(lighting.low_energy_correction, 0.5);
        assert_relative_eq!(lighting.annual_energy, 59.73 * x * 0.5 * 0.96);
        assert_relative_eq!(
            lighting.usage.annual_kwh,
            lighting.annual_energy,
            max_relative = 1e-2
        );
    }

    #[rstest]
    fn should_skip_lighting_without_outlets(reference_data: ReferenceData) {
        let mut assessment =
            assessment_from(&reference_data, json!({"use_LAC": true, "LAC": {"L": 0}}));
        LacStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(assessment.lac.lighting, None);
        assert!(!assessment.gains.contains(GainCategory::Lighting));
    }

    #[rstest]
    fn should_reduce_gains_but_not_energy_when_requested(reference_data: ReferenceData) {
        let mut standard = assessment_from(&reference_data, json!({}));
        let mut reduced = assessment_from(
            &reference_data,
            json!({"LAC": {"reduced_internal_heat_gains": true}}),
        );
        LacStage.calculate(&mut standard, &reference_data).unwrap();
        LacStage.calculate(&mut reduced, &reference_data).unwrap();

        assert_eq!(
            reduced.lac.appliances.energy,
            standard.lac.appliances.energy
        );
        assert_relative_eq!(
            reduced.lac.appliances.gains[0],
            standard.lac.appliances.gains[0] * 0.67,
            max_relative = 1e-12
        );
        assert_relative_eq!(reduced.lac.cooking_gains, 23. + 5. * 2.5);
    }

    #[rstest]
    fn should_use_default_appliance_for_empty_list(reference_data: ReferenceData) {
        let mut assessment = assessment_from(&reference_data, json!({"use_appliancelist": true}));
        ApplianceListStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        let results = &assessment.appliancelist;
        assert_eq!(results.list.len(), 1);
        assert_eq!(results.list[0].name, "LED Light");
        assert_relative_eq!(results.totalwh, 72.);
        assert_relative_eq!(results.annualkwh, 26.28);
        assert_relative_eq!(results.gains, 3.);
        assert_eq!(
            assessment.gains.get(GainCategory::Appliances),
            Some(&MonthVector::constant(3.))
        );
    }

    #[rstest]
    fn should_replace_appendix_l_appliances_with_list(reference_data: ReferenceData) {
        let mut assessment = assessment_from(
            &reference_data,
            json!({
                "use_LAC": true,
                "use_appliancelist": true,
                "appliancelist": {"list": [
                    {"name": "Fridge", "power": 50, "hours": 24},
                    {"name": "TV", "power": 100, "hours": 4}
                ]}
            }),
        );
        LacStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();
        ApplianceListStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_relative_eq!(assessment.appliancelist.totalwh, 1600.);
        assert_relative_eq!(
            assessment.energy_requirements[&RequirementKind::Appliances].quantity,
            584.
        );
        assert_eq!(
            assessment.gains.get(GainCategory::Appliances),
            Some(&MonthVector::constant(1600. / 24.))
        );
        assert_eq!(
            assessment.gains.categories().collect::<Vec<_>>(),
            vec![
                GainCategory::Lighting,
                GainCategory::Appliances,
                GainCategory::Cooking
            ]
        );
    }
}
