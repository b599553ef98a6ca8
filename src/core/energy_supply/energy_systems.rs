use crate::core::assessment::Assessment;
use crate::core::pipeline::CalculationStage;
use crate::core::units::DAYS_PER_YEAR;
use crate::input::value_or_nan;
use crate::reference_data::ReferenceData;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// The share of one requirement met by one system, and the fuel it takes to do so.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemDemand {
    pub system: String,
    pub fuel: String,
    pub fraction: f64,
    pub efficiency: f64,
    /// kWh/year of useful energy
    pub demand: f64,
    /// kWh/year of delivered fuel
    pub fuelinput: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FuelTotal {
    pub name: String,
    /// kWh/year
    pub quantity: f64,
    pub fuelcost: f64,
    pub annualcost: f64,
    pub primaryenergy: f64,
    pub annualco2: f64,
}

impl FuelTotal {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: 0.,
            fuelcost: 0.,
            annualcost: 0.,
            primaryenergy: 0.,
            annualco2: 0.,
        }
    }
}

/// Turns energy requirements into fuel use through the systems assigned to them, then prices
/// each fuel.
pub(crate) struct EnergySystemsStage;

impl CalculationStage for EnergySystemsStage {
    fn name(&self) -> &'static str {
        "energy_systems"
    }

    fn defaults(&self, reference: &ReferenceData) -> Value {
        json!({
            "energy_systems": {},
            "fuels": reference.fuels
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let mut system_demands = IndexMap::new();
        let mut fuel_totals: IndexMap<String, FuelTotal> = IndexMap::new();

        for (kind, requirement) in &assessment.energy_requirements {
            let assignments = assessment.energy_systems.entry(*kind).or_default();
            let mut demands = vec![];

            for assignment in assignments.iter() {
                let Some(spec) = reference.energy_systems.get(&assignment.system) else {
                    warn!(
                        "Unknown energy system {} serving {kind} left out of fuel use",
                        assignment.system
                    );
                    continue;
                };
                let fraction = value_or_nan(assignment.fraction);
                let efficiency = assignment.efficiency.unwrap_or(spec.efficiency);
                let demand = requirement.quantity * fraction;
                let fuelinput = demand / efficiency;

                fuel_totals
                    .entry(spec.fuel.clone())
                    .or_insert_with(|| FuelTotal::new(&spec.fuel))
                    .quantity += fuelinput;
                demands.push(SystemDemand {
                    system: assignment.system.clone(),
                    fuel: spec.fuel.clone(),
                    fraction,
                    efficiency,
                    demand,
                    fuelinput,
                });
            }

            system_demands.insert(*kind, demands);
        }

        for (name, total) in fuel_totals.iter_mut() {
            let Some(fuel) = assessment.input.fuels.get(name) else {
                warn!("Unknown fuel {name} left out of cost, CO2 and primary energy");
                continue;
            };

            total.fuelcost = fuel.fuelcost;
            total.annualcost =
                total.quantity * fuel.fuelcost + fuel.standingcharge * DAYS_PER_YEAR as f64;
            total.primaryenergy = total.quantity * fuel.primaryenergyfactor;
            total.annualco2 = total.quantity * fuel.co2factor;

            assessment.total_cost += total.annualcost;
            assessment.energy_use += total.quantity;
            assessment.annualco2 += total.annualco2;
            assessment.primary_energy_use += total.primaryenergy;
        }

        assessment.net_cost = assessment.total_cost - assessment.total_income;
        assessment.system_demands = system_demands;
        assessment.fuel_totals = fuel_totals;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::Pipeline;
    use crate::input::{InputForProcessing, RequirementKind};
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
    fn should_split_requirement_between_systems(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "energy_systems": {
                    "space_heating": [
                        {"system": "gasboiler", "fraction": 0.75},
                        {"system": "woodstove", "fraction": 0.25, "efficiency": 0.5}
                    ]
                }
            }),
            &reference_data,
        );
        assessment.register_requirement(RequirementKind::SpaceHeating, 9000.);

        EnergySystemsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        let demands = &assessment.system_demands[&RequirementKind::SpaceHeating];
        assert_eq!(demands.len(), 2);
        assert_relative_eq!(demands[0].demand, 6750.);
        // the system table's efficiency applies unless overridden
        assert_relative_eq!(demands[0].fuelinput, 7500.);
        assert_relative_eq!(demands[1].fuelinput, 4500.);

        let gas = &assessment.fuel_totals["gas"];
        assert_relative_eq!(gas.quantity, 7500.);
        assert_relative_eq!(gas.annualcost, 7500. * 0.043);
        assert_relative_eq!(gas.primaryenergy, 7500. * 1.22);
        assert_relative_eq!(gas.annualco2, 7500. * 0.216);
        assert_relative_eq!(assessment.fuel_totals["wood"].quantity, 4500.);

        assert_relative_eq!(assessment.energy_use, 12000.);
        assert_relative_eq!(assessment.total_cost, 7500. * 0.043);
        assert_relative_eq!(
            assessment.primary_energy_use,
            7500. * 1.22 + 4500. * 1.04,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            assessment.annualco2,
            7500. * 0.216 + 4500. * 0.019,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_charge_standing_charge_and_net_off_income(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "fuels": {"electric": {"standingcharge": 0.2}},
                "energy_systems": {
                    "appliances": [{"system": "electric", "fraction": 1}]
                }
            }),
            &reference_data,
        );
        assessment.register_requirement(RequirementKind::Appliances, 1000.);
        assessment.total_income = 50.;

        EnergySystemsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_relative_eq!(assessment.total_cost, 145. + 73., max_relative = 1e-12);
        assert_relative_eq!(assessment.net_cost, 168., max_relative = 1e-12);
    }

    #[rstest]
    fn should_leave_unassigned_requirements_uncounted(reference_data: ReferenceData) {
        let mut assessment = assessment_for(json!({}), &reference_data);
        assessment.register_requirement(RequirementKind::Lighting, 500.);

        EnergySystemsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(assessment.energy_systems[&RequirementKind::Lighting], vec![]);
        assert!(assessment.system_demands[&RequirementKind::Lighting].is_empty());
        assert!(assessment.fuel_totals.is_empty());
        assert_eq!(assessment.total_cost, 0.);
    }

    #[rstest]
    fn should_skip_unknown_systems(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "energy_systems": {
                    "cooking": [
                        {"system": "peat", "fraction": 0.5},
                        {"system": "electric", "fraction": 0.5}
                    ]
                }
            }),
            &reference_data,
        );
        assessment.register_requirement(RequirementKind::Cooking, 400.);

        EnergySystemsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(assessment.system_demands[&RequirementKind::Cooking].len(), 1);
        assert_relative_eq!(assessment.energy_use, 200.);
    }

    #[rstest]
    fn should_credit_generation_as_negative_fuel_use(reference_data: ReferenceData) {
        let mut assessment = assessment_for(
            json!({
                "energy_systems": {"solarpv": [{"system": "electric", "fraction": 1, "efficiency": 1}]}
            }),
            &reference_data,
        );
        assessment.register_requirement(RequirementKind::SolarPv, -400.);

        EnergySystemsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_relative_eq!(assessment.fuel_totals["electric"].quantity, -400.);
        assert_relative_eq!(assessment.total_cost, -58., max_relative = 1e-12);
    }
}
