use crate::core::assessment::Assessment;
use crate::core::pipeline::CalculationStage;
use crate::external_conditions::ExternalConditions;
use crate::input::{EnergySystemAssignment, RequirementKind};
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};

/// Share of the incident solar energy a PV array delivers per kWp (Appendix M).
const PV_SYSTEM_FACTOR: f64 = 0.8;
/// Exported and onsite generation is accounted against the electricity supply.
const GENERATION_SYSTEM: &str = "electric";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenerationResults {
    /// PV output estimated from installed peak power (kWh/year)
    pub solarpv_annual_kwh: f64,
    /// feed-in tariff income from all sources
    pub total_energy_income: f64,
}

/// A generator's annual output and how it is credited.
struct Source {
    kind: RequirementKind,
    annual_kwh: f64,
    fraction_used_onsite: f64,
    feed_in_tariff: f64,
}

pub(crate) struct GenerationStage;

impl GenerationStage {
    fn credit(assessment: &mut Assessment, source: &Source, replace_systems: bool) -> f64 {
        assessment.register_requirement(
            source.kind,
            -source.annual_kwh * source.fraction_used_onsite,
        );
        if replace_systems || !assessment.energy_systems.contains_key(&source.kind) {
            assessment.energy_systems.insert(
                source.kind,
                vec![EnergySystemAssignment::whole_demand(GENERATION_SYSTEM)],
            );
        }

        source.annual_kwh * source.feed_in_tariff
    }
}

impl CalculationStage for GenerationStage {
    fn name(&self) -> &'static str {
        "generation"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "use_generation": false,
            "generation": {
                "solar_annual_kwh": 0,
                "solar_fraction_used_onsite": 0.5,
                "solar_FIT": 0,
                "wind_annual_kwh": 0,
                "wind_fraction_used_onsite": 0.5,
                "wind_FIT": 0,
                "hydro_annual_kwh": 0,
                "hydro_fraction_used_onsite": 0.5,
                "hydro_FIT": 0,
                "solarpv_orientation": 4,
                "solarpv_kwp_installed": 0,
                "solarpv_inclination": 35,
                "solarpv_overshading": 1,
                "solarpv_fraction_used_onsite": 0.5,
                "solarpv_FIT": 0
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let conditions = ExternalConditions::new(reference, assessment.input.region)?;
        let generation = assessment.input.generation.clone();

        let solarpv_annual_kwh = PV_SYSTEM_FACTOR
            * generation.solarpv_kwp_installed
            * conditions.annual_solar_radiation(
                generation.solarpv_orientation,
                generation.solarpv_inclination,
            )
            * generation.solarpv_overshading;

        let mut total_energy_income = 0.;
        if assessment.input.use_generation {
            let solar = Source {
                kind: RequirementKind::SolarPv,
                annual_kwh: generation.solar_annual_kwh,
                fraction_used_onsite: generation.solar_fraction_used_onsite,
                feed_in_tariff: generation.solar_fit,
            };
            let wind = Source {
                kind: RequirementKind::Wind,
                annual_kwh: generation.wind_annual_kwh,
                fraction_used_onsite: generation.wind_fraction_used_onsite,
                feed_in_tariff: generation.wind_fit,
            };
            let hydro = Source {
                kind: RequirementKind::Hydro,
                annual_kwh: generation.hydro_annual_kwh,
                fraction_used_onsite: generation.hydro_fraction_used_onsite,
                feed_in_tariff: generation.hydro_fit,
            };
            let solarpv = Source {
                kind: RequirementKind::SolarPvFromPeakPower,
                annual_kwh: solarpv_annual_kwh,
                fraction_used_onsite: generation.solarpv_fraction_used_onsite,
                feed_in_tariff: generation.solarpv_fit,
            };

            if solar.annual_kwh > 0. {
                total_energy_income += Self::credit(assessment, &solar, true);
            }
            if wind.annual_kwh > 0. {
                total_energy_income += Self::credit(assessment, &wind, true);
            }
            // hydro is only credited alongside wind generation
            if wind.annual_kwh > 0. {
                total_energy_income += Self::credit(assessment, &hydro, true);
            }
            if solarpv.annual_kwh > 0. {
                total_energy_income += Self::credit(assessment, &solarpv, false);
            }
        }

        assessment.total_income += total_energy_income;
        assessment.generation = GenerationResults {
            solarpv_annual_kwh,
            total_energy_income,
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

    fn assessment_for(input: Value, reference_data: &ReferenceData) -> Assessment {
        let input = Pipeline::standard()
            .prepare(InputForProcessing::init_with_value(input).unwrap(), reference_data)
            .unwrap();
        Assessment::new(input)
    }

    #[rstest]
    fn should_estimate_pv_output_from_peak_power(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({"generation": {"solarpv_kwp_installed": 2.5, "solarpv_overshading": 0.8}}),
            &reference_data,
        );

        GenerationStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        let conditions = ExternalConditions::new(&reference_data, 0).unwrap();
        let annual_radiation =
            conditions.annual_solar_radiation(crate::input::Orientation::South, 35.);
        assert_relative_eq!(
            assessment.generation.solarpv_annual_kwh,
            0.8 * 2.5 * annual_radiation * 0.8,
            max_relative = 1e-12
        );
        // generation not in use: nothing credited
        assert!(assessment.energy_requirements.is_empty());
        assert_eq!(assessment.total_income, 0.);
    }

    #[rstest]
    fn should_credit_onsite_generation_and_income(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "use_generation": true,
                "generation": {
                    "solar_annual_kwh": 1000,
                    "solar_fraction_used_onsite": 0.4,
                    "solar_FIT": 0.1,
                    "hydro_annual_kwh": 500
                }
            }),
            &reference_data,
        );

        GenerationStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(
            assessment.energy_requirements[&RequirementKind::SolarPv].quantity,
            -400.
        );
        assert_eq!(
            assessment.energy_systems[&RequirementKind::SolarPv],
            vec![EnergySystemAssignment::whole_demand("electric")]
        );
        assert_relative_eq!(assessment.total_income, 100.);
        assert_relative_eq!(assessment.generation.total_energy_income, 100.);
        // hydro is gated on wind
        assert!(!assessment
            .energy_requirements
            .contains_key(&RequirementKind::Hydro));
    }

    #[rstest]
    fn should_credit_hydro_alongside_wind(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "use_generation": true,
                "generation": {
                    "wind_annual_kwh": 200,
                    "hydro_annual_kwh": 500,
                    "hydro_FIT": 0.2
                }
            }),
            &reference_data,
        );

        GenerationStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(
            assessment.energy_requirements[&RequirementKind::Wind].quantity,
            -100.
        );
        assert_eq!(
            assessment.energy_requirements[&RequirementKind::Hydro].quantity,
            -250.
        );
        assert_relative_eq!(assessment.total_income, 100.);
    }

    #[rstest]
    fn should_keep_existing_systems_for_peak_power_pv(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "use_generation": true,
                "generation": {"solarpv_kwp_installed": 1},
                "energy_systems": {
                    "solarpv2": [{"system": "greenelectric", "fraction": 1}]
                }
            }),
            &reference_data,
        );

        GenerationStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert!(
            assessment.energy_requirements[&RequirementKind::SolarPvFromPeakPower].quantity < 0.
        );
        assert_eq!(
            assessment.energy_systems[&RequirementKind::SolarPvFromPeakPower][0].system,
            "greenelectric"
        );
    }
}
