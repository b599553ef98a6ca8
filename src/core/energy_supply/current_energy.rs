use crate::core::assessment::Assessment;
use crate::core::pipeline::CalculationStage;
use crate::core::units::{ratio_or_zero, DAYS_PER_YEAR};
use crate::reference_data::{CurrentEnergyItemSpec, ReferenceData};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

/// Factors for electricity bought on a green tariff.
const GREEN_ELECTRICITY_CO2: f64 = 0.02;
const GREEN_ELECTRICITY_PRIMARY_ENERGY: f64 = 1.3;

/// Recorded use of one fuel, vehicle or mode of transport over a year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentEnergyItem {
    pub name: String,
    pub note: String,
    pub units: String,
    pub quantity: f64,
    pub unitcost: f64,
    pub standingcharge: f64,
    pub kwh: f64,
    pub co2: f64,
    pub primaryenergy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpg: Option<f64>,
    pub annual_kwh: f64,
    pub kwhd: f64,
    pub annual_co2: f64,
    pub annual_cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CurrentEnergyResults {
    pub energyitems: IndexMap<String, CurrentEnergyItem>,
    pub spaceheating_annual_kwh: f64,
    pub primaryenergy_annual_kwh: f64,
    pub total_co2: f64,
    pub total_cost: f64,
    pub spaceheating_annual_kwhm2: f64,
    pub primaryenergy_annual_kwhm2: f64,
    pub total_co2m2: f64,
    pub total_costm2: f64,
}

impl CurrentEnergyItem {
    fn new(
        spec: &CurrentEnergyItemSpec,
        note: Option<&str>,
        quantity: f64,
        unitcost: f64,
        standingcharge: f64,
        greenenergy: bool,
    ) -> Self {
        let (co2, primaryenergy) = if spec.electric && greenenergy {
            (GREEN_ELECTRICITY_CO2, GREEN_ELECTRICITY_PRIMARY_ENERGY)
        } else {
            (spec.co2, spec.primaryenergy)
        };
        // vehicles record miles, converted to gallons of fuel
        let units_of_fuel = match spec.mpg {
            Some(mpg) => quantity / mpg,
            None => quantity,
        };
        let annual_kwh = units_of_fuel * spec.kwh;

        Self {
            name: spec.name.clone(),
            note: note.unwrap_or(&spec.note).to_string(),
            units: spec.units.clone(),
            quantity,
            unitcost,
            standingcharge,
            kwh: spec.kwh,
            co2,
            primaryenergy,
            mpg: spec.mpg,
            annual_kwh,
            kwhd: annual_kwh / DAYS_PER_YEAR as f64,
            annual_co2: units_of_fuel * co2,
            annual_cost: quantity * unitcost + DAYS_PER_YEAR as f64 * standingcharge,
        }
    }
}

pub(crate) struct CurrentEnergyStage;

impl CalculationStage for CurrentEnergyStage {
    fn name(&self) -> &'static str {
        "currentenergy"
    }

    fn defaults(&self, reference: &ReferenceData) -> Value {
        let energyitems = reference
            .current_energy_items
            .iter()
            .map(|(key, item)| {
                (
                    key.clone(),
                    json!({
                        "note": item.note,
                        "quantity": 0,
                        "unitcost": item.unitcost,
                        "standingcharge": item.standingcharge
                    }),
                )
            })
            .collect::<Map<_, _>>();

        json!({
            "currentenergy": {
                "energyitems": energyitems,
                "greenenergy": false
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let currentenergy = &assessment.input.currentenergy;
        let mut results = CurrentEnergyResults::default();

        for (key, recorded) in &currentenergy.energyitems {
            let Some(spec) = reference.current_energy_items.get(key) else {
                warn!("Unknown energy item {key} left out of current energy use");
                continue;
            };
            let item = CurrentEnergyItem::new(
                spec,
                recorded.note.as_deref(),
                recorded.quantity,
                recorded.unitcost,
                recorded.standingcharge,
                currentenergy.greenenergy,
            );

            if spec.space_heating {
                results.spaceheating_annual_kwh += item.annual_kwh;
            }
            if spec.household_energy {
                results.primaryenergy_annual_kwh += item.annual_kwh * item.primaryenergy;
                results.total_co2 += item.annual_co2;
                results.total_cost += item.annual_cost;
            }
            results.energyitems.insert(key.clone(), item);
        }

        let tfa = assessment.total_floor_area;
        results.spaceheating_annual_kwhm2 = ratio_or_zero(results.spaceheating_annual_kwh, tfa);
        results.primaryenergy_annual_kwhm2 = ratio_or_zero(results.primaryenergy_annual_kwh, tfa);
        results.total_co2m2 = ratio_or_zero(results.total_co2, tfa);
        results.total_costm2 = ratio_or_zero(results.total_cost, tfa);

        assessment.currentenergy = results;

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
        let mut assessment = Assessment::new(input);
        assessment.total_floor_area = 100.;
        assessment
    }

    #[rstest]
    fn should_default_every_item_to_no_use(reference_data: ReferenceData) {
        let mut assessment = assessment_for(json!({}), &reference_data);

        CurrentEnergyStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();
        let results = &assessment.currentenergy;

        assert_eq!(results.energyitems.len(), 19);
        assert_eq!(results.total_cost, 0.);
        assert_eq!(results.energyitems["gas"].unitcost, 0.4214);
        assert_eq!(results.energyitems["gas"].name, "Mains gas");
    }

    #[rstest]
    fn should_total_household_energy(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "currentenergy": {
                    "energyitems": {
                        "gas": {"quantity": 1000, "standingcharge": 0.2},
                        "electric": {"quantity": 3000},
                        "car1": {"quantity": 7000}
                    }
                }
            }),
            &reference_data,
        );

        CurrentEnergyStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();
        let results = &assessment.currentenergy;

        let gas = &results.energyitems["gas"];
        assert_relative_eq!(gas.annual_kwh, 9800.);
        assert_relative_eq!(gas.annual_cost, 421.4 + 73.);
        assert_relative_eq!(gas.kwhd, 9800. / 365.);

        let car = &results.energyitems["car1"];
        assert_relative_eq!(car.annual_kwh, 200. * 43.65, max_relative = 1e-12);
        assert_relative_eq!(car.annual_co2, 200. * 10.395, max_relative = 1e-12);

        assert_relative_eq!(results.spaceheating_annual_kwh, 9800.);
        // vehicles are not household energy
        assert_relative_eq!(
            results.primaryenergy_annual_kwh,
            9800. * 1.1 + 3000. * 2.4,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            results.total_co2,
            1000. * 2.198 + 3000. * 0.512,
            max_relative = 1e-12
        );
        assert_relative_eq!(results.total_cost, 494.4 + 450., max_relative = 1e-12);
        assert_relative_eq!(results.total_costm2, results.total_cost / 100.);
    }

    #[rstest]
    fn should_apply_green_factors_to_electric_items(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "currentenergy": {
                    "greenenergy": true,
                    "energyitems": {"electric-heatpump": {"quantity": 2000}}
                }
            }),
            &reference_data,
        );

        CurrentEnergyStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();
        let heatpump = &assessment.currentenergy.energyitems["electric-heatpump"];

        assert_eq!(heatpump.co2, 0.02);
        assert_eq!(heatpump.primaryenergy, 1.3);
        assert_relative_eq!(heatpump.annual_co2, 40.);
        assert_eq!(assessment.currentenergy.energyitems["gas"].co2, 2.198);
    }

    #[rstest]
    fn should_skip_unknown_items(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "currentenergy": {
                    "energyitems": {"coal": {"quantity": 10, "unitcost": 1, "standingcharge": 0}}
                }
            }),
            &reference_data,
        );

        CurrentEnergyStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert!(!assessment.currentenergy.energyitems.contains_key("coal"));
        assert_eq!(assessment.currentenergy.total_cost, 0.);
    }
}
