use crate::core::assessment::Assessment;
use crate::core::monthly::MonthVector;
use crate::core::pipeline::CalculationStage;
use crate::core::space_heat_demand::utilisation::HeatBalance;
use crate::core::units::average_monthly_to_annual;
use crate::external_conditions::ExternalConditions;
use crate::input::ControlType;
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Heating off periods (Table 9): two on weekdays, one on weekend days.
const WEEKDAY_OFF_HOURS: [f64; 2] = [7., 8.];
const WEEKEND_OFF_HOURS: [f64; 2] = [0., 8.];
const WEEKDAYS: f64 = 5.;
const WEEKEND_DAYS: f64 = 2.;

/// Heat loss parameter used for the reported rest-of-dwelling utilisation factor is capped here.
const MAX_REPORTED_HEAT_LOSS_PARAMETER: f64 = 6.;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TemperatureResults {
    pub heat_loss_parameter: MonthVector,
    pub utilisation_factor_living_area: MonthVector,
    pub mean_internal_temperature_living_area: MonthVector,
    /// heating temperature for the rest of the dwelling, following the control type
    pub heating_temperature_rest_of_dwelling: MonthVector,
    pub utilisation_factor_rest_of_dwelling: MonthVector,
    pub mean_internal_temperature_rest_of_dwelling: MonthVector,
    pub living_area_fraction: f64,
    /// day-weighted mean over the year
    pub annual_mean_internal_temperature: f64,
}

/// Heating temperature in the rest of the dwelling (Table 9) for a given living area demand
/// temperature. Falls back to the living area temperature when undefined or for an unknown
/// control type.
pub fn rest_of_dwelling_heating_temperature(
    control_type: ControlType,
    living_area_temperature: f64,
    heat_loss_parameter: f64,
) -> f64 {
    let temperature = match control_type {
        ControlType::Type1 => living_area_temperature - 0.5 * heat_loss_parameter,
        ControlType::Type2 | ControlType::Type3 => {
            living_area_temperature - heat_loss_parameter + heat_loss_parameter.powi(2) / 12.
        }
        ControlType::Other(code) => {
            warn!(
                "Unknown heating control type {code}, rest of dwelling heated to the living area temperature"
            );
            return living_area_temperature;
        }
    };

    if temperature.is_nan() {
        living_area_temperature
    } else {
        temperature
    }
}

/// Mean temperature over a week with heating to `heating_temperature` and the standard off
/// periods.
fn mean_weekly_temperature(
    balance: &HeatBalance,
    responsiveness: f64,
    heating_temperature: f64,
) -> f64 {
    let reduction = |off_hours: [f64; 2]| -> f64 {
        off_hours
            .iter()
            .map(|hours| balance.temperature_reduction(responsiveness, heating_temperature, *hours))
            .sum()
    };

    let weekday = heating_temperature - reduction(WEEKDAY_OFF_HOURS);
    let weekend = heating_temperature - reduction(WEEKEND_OFF_HOURS);

    (WEEKDAYS * weekday + WEEKEND_DAYS * weekend) / (WEEKDAYS + WEEKEND_DAYS)
}

pub(crate) struct TemperatureStage;

impl CalculationStage for TemperatureStage {
    fn name(&self) -> &'static str {
        "temperature"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "temperature": {
                "control_type": 1,
                "target": 21,
                "responsiveness": 1
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let conditions = ExternalConditions::new(reference, assessment.input.region)?;
        let temperature = &assessment.input.temperature;
        let tfa = assessment.total_floor_area;
        let tmp = assessment.thermal_mass_parameter;
        let target = temperature.target;
        let responsiveness = temperature.responsiveness;

        let h = assessment.total_losses();
        let g = assessment.total_gains();
        let hlp = h.map(|h| h / tfa);
        let te = conditions.air_temp_monthly(assessment.input.altitude);

        let balance = |month_idx: usize, internal_temperature: f64, heat_loss_parameter: f64| {
            HeatBalance {
                thermal_mass_parameter: tmp,
                heat_loss_parameter,
                heat_transfer_coefficient: h[month_idx],
                internal_temperature,
                external_temperature: te[month_idx],
                gains: g[month_idx],
            }
        };

        let utilisation_living_area = MonthVector::from_fn(|m| {
            balance(m, target, hlp[m]).utilisation_factor()
        });
        let living_area = MonthVector::from_fn(|m| {
            mean_weekly_temperature(&balance(m, target, hlp[m]), responsiveness, target)
        });

        let heating_temperature_rest = MonthVector::from_fn(|m| {
            rest_of_dwelling_heating_temperature(temperature.control_type, target, hlp[m])
        });
        let utilisation_rest = MonthVector::from_fn(|m| {
            balance(
                m,
                heating_temperature_rest[m],
                hlp[m].min(MAX_REPORTED_HEAT_LOSS_PARAMETER),
            )
            .utilisation_factor()
        });
        let rest_of_dwelling = MonthVector::from_fn(|m| {
            let heating_temperature = heating_temperature_rest[m];
            mean_weekly_temperature(
                &balance(m, heating_temperature, hlp[m]),
                responsiveness,
                heating_temperature,
            )
        });

        let living_area_fraction = {
            let fraction = temperature.living_area.unwrap_or(tfa) / tfa;
            if fraction.is_nan() {
                0.
            } else {
                fraction
            }
        };

        let internal_temperature = living_area * living_area_fraction
            + rest_of_dwelling * (1. - living_area_fraction);

        assessment.temperature = TemperatureResults {
            heat_loss_parameter: hlp,
            utilisation_factor_living_area: utilisation_living_area,
            mean_internal_temperature_living_area: living_area,
            heating_temperature_rest_of_dwelling: heating_temperature_rest,
            utilisation_factor_rest_of_dwelling: utilisation_rest,
            mean_internal_temperature_rest_of_dwelling: rest_of_dwelling,
            living_area_fraction,
            annual_mean_internal_temperature: average_monthly_to_annual(
                internal_temperature.values(),
            ),
        };
        assessment.internal_temperature = internal_temperature;
        assessment.external_temperature = te;

        Ok(())
    }
}
