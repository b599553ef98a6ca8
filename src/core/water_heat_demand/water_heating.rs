use crate::core::assessment::{Assessment, GainCategory};
use crate::core::monthly::MonthVector;
use crate::core::pipeline::CalculationStage;
use crate::core::units::{is_summer_month, kwh_per_month_to_watts, DAYS_IN_MONTH};
use crate::core::water_heat_demand::solar_hot_water::{self, solar_hot_water};
use crate::external_conditions::ExternalConditions;
use crate::input::{value_or_nan, HotWaterControlType, RequirementKind, WaterHeatingInput};
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Specific heat of water (kJ/litre K) expressed per 3600 to give kWh.
const SPECIFIC_HEAT_OF_WATER: f64 = 4.190;
const SECONDS_PER_HOUR: f64 = 3600.;
const LOW_WATER_USE_FACTOR: f64 = 0.95;
const DISTRIBUTION_LOSS_FRACTION: f64 = 0.15;
/// Share of energy content delivered at the tap, the rest being distribution loss.
const DELIVERED_FRACTION: f64 = 0.85;
const PRIMARY_PIPEWORK_LENGTH: f64 = 14.;
const SUMMER_PRIMARY_CIRCUIT_HOURS: f64 = 3.;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WaterHeatingResults {
    /// litres/day
    #[serde(rename = "Vd_average")]
    pub average_daily_volume: f64,
    #[serde(rename = "Vd_m")]
    pub daily_volume: MonthVector,
    pub monthly_energy_content: MonthVector,
    pub annual_energy_content: f64,
    /// kWh/day
    pub energy_lost_from_water_storage: f64,
    pub distribution_loss: MonthVector,
    pub monthly_storage_loss: MonthVector,
    pub primary_circuit_loss: MonthVector,
    pub total_heat_required: MonthVector,
    pub hot_water_heater_output: MonthVector,
    pub annual_waterheating_demand: f64,
    /// kWh
    pub heat_gains_from_water_heating: MonthVector,
    /// W
    pub waterheating_gains: MonthVector,
}

/// Hours per day the primary circuit is hot outside summer (Table 3).
fn primary_circuit_hours(water_heating: &WaterHeatingInput) -> f64 {
    if water_heating.community_heating {
        return 3.;
    }

    match &water_heating.hot_water_control_type {
        Some(HotWaterControlType::NoCylinderThermostat) => 11.,
        Some(HotWaterControlType::CylinderThermostatWithoutTimer) => 5.,
        Some(HotWaterControlType::CylinderThermostatWithTimer) => 3.,
        Some(HotWaterControlType::Other(control_type)) => {
            warn!("Unknown hot water control type {control_type}, primary circuit taken as cold");
            0.
        }
        None => 0.,
    }
}

/// Storage loss in kWh/day, from the manufacturer's declared loss where known.
fn storage_loss_per_day(water_heating: &WaterHeatingInput) -> f64 {
    if water_heating.declared_loss_factor_known {
        value_or_nan(water_heating.manufacturer_loss_factor)
            * value_or_nan(water_heating.temperature_factor_a)
    } else {
        value_or_nan(water_heating.storage_volume)
            * value_or_nan(water_heating.loss_factor_b)
            * value_or_nan(water_heating.volume_factor_b)
            * value_or_nan(water_heating.temperature_factor_b)
    }
}

pub(crate) struct WaterHeatingStage;

impl CalculationStage for WaterHeatingStage {
    fn name(&self) -> &'static str {
        "water_heating"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        let mut defaults = json!({
            "use_water_heating": false,
            "water_heating": {
                "combi_loss": [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                "solar_water_heating": false,
                "low_water_use_design": false,
                "pipework_insulated_fraction": 1,
                "instantaneous_hotwater": false,
                "declared_loss_factor_known": false,
                "community_heating": false,
                "hot_water_store_in_dwelling": false,
                "contains_dedicated_solar_storage_or_WWHRS": false
            }
        });
        if let (Some(defaults), Value::Object(collector)) =
            (defaults.as_object_mut(), solar_hot_water::defaults())
        {
            defaults.extend(collector);
        }

        defaults
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let water_heating = &assessment.input.water_heating;

        let average_daily_volume = {
            let volume = 25. * assessment.occupancy + 36.;
            if water_heating.low_water_use_design {
                volume * LOW_WATER_USE_FACTOR
            } else {
                volume
            }
        };

        let daily_volume =
            MonthVector::new(reference.hot_water_use_factors) * average_daily_volume;
        let monthly_energy_content = MonthVector::from_fn(|m| {
            SPECIFIC_HEAT_OF_WATER
                * daily_volume[m]
                * DAYS_IN_MONTH[m] as f64
                * reference.hot_water_temperature_rise[m]
                / SECONDS_PER_HOUR
        });
        let annual_energy_content = monthly_energy_content.sum();
        let delivered = monthly_energy_content * DELIVERED_FRACTION;
        let combi_loss = MonthVector::new(water_heating.combi_loss);

        let solar_results = if assessment.input.use_shw || water_heating.solar_water_heating {
            let conditions = ExternalConditions::new(reference, assessment.input.region)?;
            Some(solar_hot_water(
                &assessment.input.shw,
                &conditions,
                annual_energy_content,
                average_daily_volume,
            ))
        } else {
            None
        };

        let mut energy_lost_from_water_storage = 0.;
        let mut distribution_loss = MonthVector::zeros();
        let mut monthly_storage_loss = MonthVector::zeros();
        let mut primary_circuit_loss = MonthVector::zeros();

        let total_heat_required = if water_heating.instantaneous_hotwater {
            delivered
        } else {
            energy_lost_from_water_storage = storage_loss_per_day(water_heating);
            distribution_loss = monthly_energy_content * DISTRIBUTION_LOSS_FRACTION;

            let storage_volume = value_or_nan(water_heating.storage_volume);
            let dedicated_solar_share = if water_heating.contains_dedicated_solar_storage_or_wwhrs
            {
                (storage_volume - value_or_nan(assessment.input.shw.dedicated_storage_volume))
                    / storage_volume
            } else {
                1.
            };
            monthly_storage_loss = MonthVector::from_fn(|m| {
                DAYS_IN_MONTH[m] as f64 * energy_lost_from_water_storage * dedicated_solar_share
            });

            let insulated_fraction = if water_heating.community_heating {
                1.
            } else {
                water_heating.pipework_insulated_fraction
            };
            let hours_outside_summer = primary_circuit_hours(water_heating);
            primary_circuit_loss = MonthVector::from_fn(|m| {
                let hours = if is_summer_month(m) {
                    SUMMER_PRIMARY_CIRCUIT_HOURS
                } else {
                    hours_outside_summer
                };
                let loss = DAYS_IN_MONTH[m] as f64
                    * PRIMARY_PIPEWORK_LENGTH
                    * ((0.0091 * insulated_fraction + 0.0245 * (1. - insulated_fraction)) * hours
                        + 0.0263);
                if water_heating.solar_water_heating {
                    loss * reference.solar_primary_loss_factors[m]
                } else {
                    loss
                }
            });

            delivered + distribution_loss + monthly_storage_loss + primary_circuit_loss + combi_loss
        };

        let solar_input = match &solar_results {
            Some(results) if water_heating.solar_water_heating => results.solar_input_monthly,
            _ => MonthVector::zeros(),
        };
        // NaN from incomplete storage figures passes through
        let hot_water_heater_output = (total_heat_required + solar_input).map(|output| {
            if output < 0. {
                0.
            } else {
                output
            }
        });
        let annual_waterheating_demand = hot_water_heater_output.sum();

        let heat_gains_from_water_heating =
            if water_heating.hot_water_store_in_dwelling || water_heating.community_heating {
                (delivered + combi_loss) * 0.25
                    + (distribution_loss + monthly_storage_loss + primary_circuit_loss) * 0.8
            } else {
                delivered * 0.25 + (distribution_loss + primary_circuit_loss) * 0.8
            };
        let waterheating_gains =
            MonthVector::from_fn(|m| kwh_per_month_to_watts(heat_gains_from_water_heating[m], m));

        if assessment.input.use_water_heating {
            assessment
                .gains
                .insert(GainCategory::WaterHeating, waterheating_gains);
            if annual_waterheating_demand > 0. {
                assessment
                    .register_requirement(RequirementKind::WaterHeating, annual_waterheating_demand);
            }
        }

        assessment.solar_hot_water = solar_results;
        assessment.water_heating = WaterHeatingResults {
            average_daily_volume,
            daily_volume,
            monthly_energy_content,
            annual_energy_content,
            energy_lost_from_water_storage,
            distribution_loss,
            monthly_storage_loss,
            primary_circuit_loss,
            total_heat_required,
            hot_water_heater_output,
            annual_waterheating_demand,
            heat_gains_from_water_heating,
            waterheating_gains,
        };

        Ok(())
    }
}
