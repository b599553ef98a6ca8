use crate::core::assessment::Assessment;
use crate::core::monthly::MonthVector;
use crate::core::pipeline::CalculationStage;
use crate::core::space_heat_demand::utilisation::HeatBalance;
use crate::core::units::{ratio_or_zero, watt_days_to_kwh};
use crate::input::RequirementKind;
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpaceHeatingResults {
    #[serde(rename = "delta_T")]
    pub delta_t: MonthVector,
    pub total_losses: MonthVector,
    pub total_gains: MonthVector,
    pub utilisation_factor: MonthVector,
    pub useful_gains: MonthVector,
    /// W
    pub heat_demand: MonthVector,
    pub cooling_demand: MonthVector,
    pub heat_demand_kwh: MonthVector,
    pub cooling_demand_kwh: MonthVector,
    pub annual_heating_demand: f64,
    pub annual_cooling_demand: f64,
}

pub(crate) struct SpaceHeatingStage;

impl CalculationStage for SpaceHeatingStage {
    fn name(&self) -> &'static str {
        "space_heating"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "space_heating": {
                "use_utilfactor_forgains": true
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        _reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let tfa = assessment.total_floor_area;
        let ti = assessment.internal_temperature;
        let te = assessment.external_temperature;

        let delta_t = ti - te;
        let h = assessment.total_losses();
        let total_losses = h * delta_t;
        let total_gains = assessment.total_gains();

        let utilisation_factor = MonthVector::from_fn(|m| {
            HeatBalance {
                thermal_mass_parameter: assessment.thermal_mass_parameter,
                heat_loss_parameter: h[m] / tfa,
                heat_transfer_coefficient: h[m],
                internal_temperature: ti[m],
                external_temperature: te[m],
                gains: total_gains[m],
            }
            .utilisation_factor()
        });

        let useful_gains = if assessment.input.space_heating.use_utilfactor_forgains {
            utilisation_factor * total_gains
        } else {
            total_gains
        };

        let net_demand = total_losses - useful_gains;
        let heat_demand = net_demand.map(|demand| demand.max(0.));
        let cooling_demand = net_demand.map(|demand| (-demand).max(0.));
        let heat_demand_kwh = heat_demand.times_days_in_month().map(watt_days_to_kwh);
        let cooling_demand_kwh = cooling_demand.times_days_in_month().map(watt_days_to_kwh);

        let annual_heating_demand = heat_demand_kwh.sum();
        let annual_cooling_demand = cooling_demand_kwh.sum();

        if annual_heating_demand > 0. {
            assessment.register_requirement(RequirementKind::SpaceHeating, annual_heating_demand);
        }
        if annual_cooling_demand > 0. {
            assessment.register_requirement(RequirementKind::SpaceCooling, annual_cooling_demand);
        }
        assessment.fabric_energy_efficiency =
            ratio_or_zero(annual_heating_demand + annual_cooling_demand, tfa);

        assessment.space_heating = SpaceHeatingResults {
            delta_t,
            total_losses,
            total_gains,
            utilisation_factor,
            useful_gains,
            heat_demand,
            cooling_demand,
            heat_demand_kwh,
            cooling_demand_kwh,
            annual_heating_demand,
            annual_cooling_demand,
        };

        Ok(())
    }
}
