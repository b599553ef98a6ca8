use crate::core::assessment::{Assessment, LossCategory};
use crate::core::monthly::MonthVector;
use crate::core::pipeline::CalculationStage;
use crate::external_conditions::ExternalConditions;
use crate::input::{
    DwellingConstruction, SuspendedWoodenFloor, VentilationInput, VentilationType,
};
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Air flow (m³/h) attributed to each opening (Table 2.1).
const CHIMNEY_FLOW: f64 = 40.;
const OPEN_FLUE_FLOW: f64 = 20.;
const INTERMITTENT_FAN_FLOW: f64 = 10.;
const PASSIVE_VENT_FLOW: f64 = 10.;
const FLUELESS_GAS_FIRE_FLOW: f64 = 10.;

/// Volumetric heat capacity of air (Wh/m³K).
const AIR_HEAT_CAPACITY: f64 = 0.33;
/// Wind speed (m/s) at which the infiltration rate applies unadjusted.
const REFERENCE_WIND_SPEED: f64 = 4.;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VentilationResults {
    /// air changes per hour from openings and structure, before wind adjustment
    pub infiltration: f64,
    pub adjusted_infiltration: MonthVector,
    pub effective_air_change_rate: MonthVector,
    #[serde(rename = "infiltration_WK")]
    pub infiltration_wk: MonthVector,
    #[serde(rename = "average_WK")]
    pub average_wk: f64,
}

/// Air change rate due to chimneys, flues, fans and structural leakage, corrected for shelter.
pub fn infiltration_rate(ventilation: &VentilationInput, volume: f64, num_of_floors: usize) -> f64 {
    let openings_flow = ventilation.number_of_chimneys as f64 * CHIMNEY_FLOW
        + ventilation.number_of_openflues as f64 * OPEN_FLUE_FLOW
        + ventilation.number_of_intermittentfans as f64 * INTERMITTENT_FAN_FLOW
        + ventilation.number_of_passivevents as f64 * PASSIVE_VENT_FLOW
        + ventilation.number_of_fluelessgasfires as f64 * FLUELESS_GAS_FIRE_FLOW;

    let mut infiltration = if volume != 0. {
        openings_flow / volume
    } else {
        0.
    };

    if ventilation.air_permeability_test {
        infiltration += ventilation.air_permeability_value / 20.;
    } else {
        infiltration += (num_of_floors as f64 - 1.) * 0.1;

        infiltration += match &ventilation.dwelling_construction {
            DwellingConstruction::TimberFrame => 0.2,
            DwellingConstruction::Masonry => 0.35,
            DwellingConstruction::Other(unknown) => {
                warn!("Unknown dwelling construction '{unknown}', no structural infiltration added");
                0.
            }
        };

        infiltration += match &ventilation.suspended_wooden_floor {
            SuspendedWoodenFloor::Unsealed => 0.2,
            SuspendedWoodenFloor::Sealed => 0.1,
            SuspendedWoodenFloor::NotPresent | SuspendedWoodenFloor::Other(_) => 0.,
        };

        if !ventilation.draught_lobby {
            infiltration += 0.05;
        }

        infiltration += 0.25 - 0.2 * ventilation.percentage_draught_proofed / 100.;
    }

    let shelter_factor = 1. - 0.075 * ventilation.number_of_sides_sheltered as f64;

    infiltration * shelter_factor
}

/// Effective air change rate for the ventilation arrangement (24a) to (24d), given the
/// wind-adjusted infiltration rate.
pub fn effective_air_change_rate(ventilation: &VentilationInput, infiltration: f64) -> f64 {
    let system_ach = ventilation.system_air_change_rate;

    match &ventilation.ventilation_type {
        VentilationType::BalancedWithHeatRecovery => {
            infiltration
                + system_ach * (1. - ventilation.balanced_heat_recovery_efficiency / 100.)
        }
        VentilationType::BalancedWithoutHeatRecovery => infiltration + system_ach,
        VentilationType::Extract => system_ach.max(infiltration + 0.5 * system_ach),
        VentilationType::Natural => {
            if infiltration >= 1. {
                infiltration
            } else {
                0.5 + infiltration.powi(2) * 0.5
            }
        }
        VentilationType::Other(_) => infiltration,
    }
}

pub(crate) struct VentilationStage;

impl CalculationStage for VentilationStage {
    fn name(&self) -> &'static str {
        "ventilation"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "ventilation": {
                "number_of_chimneys": 0,
                "number_of_openflues": 0,
                "number_of_intermittentfans": 0,
                "number_of_passivevents": 0,
                "number_of_fluelessgasfires": 0,
                "air_permeability_test": false,
                "air_permeability_value": 0,
                "dwelling_construction": "timberframe",
                "suspended_wooden_floor": "none",
                "draught_lobby": false,
                "percentage_draught_proofed": 0,
                "number_of_sides_sheltered": 0,
                "ventilation_type": "d",
                "system_air_change_rate": 0,
                "balanced_heat_recovery_efficiency": 100
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let conditions = ExternalConditions::new(reference, assessment.input.region)?;
        let ventilation = &assessment.input.ventilation;

        if let VentilationType::Other(unknown) = &ventilation.ventilation_type {
            warn!("Unknown ventilation type '{unknown}', infiltration used as the air change rate");
        }

        let infiltration =
            infiltration_rate(ventilation, assessment.volume, assessment.num_of_floors);
        let adjusted_infiltration = conditions
            .wind_speed_monthly()
            .map(|wind_speed| infiltration * wind_speed / REFERENCE_WIND_SPEED);
        let effective_ach =
            adjusted_infiltration.map(|ach| effective_air_change_rate(ventilation, ach));
        let volume = assessment.volume;
        let infiltration_wk = effective_ach.map(|ach| ach * volume * AIR_HEAT_CAPACITY);

        assessment.ventilation = VentilationResults {
            infiltration,
            adjusted_infiltration,
            effective_air_change_rate: effective_ach,
            infiltration_wk,
            average_wk: infiltration_wk.mean(),
        };
        assessment
            .losses
            .insert(LossCategory::Ventilation, infiltration_wk);

        Ok(())
    }
}
