use crate::core::assessment::{Assessment, GainCategory, LossCategory};
use crate::core::monthly::MonthVector;
use crate::core::pipeline::CalculationStage;
use crate::core::units::{is_summer_month, ratio_or_zero, watts_to_kwh_per_year};
use crate::external_conditions::ExternalConditions;
use crate::input::{value_or_nan, BuildingElementInput, BuildingElementType, Overshading};
use crate::reference_data::ReferenceData;
use anyhow::anyhow;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

/// Windows are treated as vertical for solar gain.
const WINDOW_INCLINATION: f64 = 90.;
/// Ratio of total solar transmittance at typical incidence to that at normal incidence.
const SOLAR_TRANSMITTANCE_ANGLE_FACTOR: f64 = 0.9;

/// Table 6d solar access factor by overshading class: (winter, summer).
fn solar_access_factor(overshading: Overshading, month_idx: usize) -> f64 {
    let (winter, summer) = match overshading {
        Overshading::Heavy => (0.3, 0.5),
        Overshading::MoreThanAverage => (0.54, 0.7),
        Overshading::AverageOrUnknown => (0.77, 0.9),
        Overshading::VeryLittle => (1.0, 1.0),
    };

    if is_summer_month(month_idx) {
        summer
    } else {
        winter
    }
}

/// Table 6d light access factor by overshading class.
fn light_access_factor(overshading: Overshading) -> f64 {
    match overshading {
        Overshading::Heavy => 0.5,
        Overshading::MoreThanAverage => 0.67,
        Overshading::AverageOrUnknown => 0.83,
        Overshading::VeryLittle => 1.0,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ElementResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub element_type: String,
    pub area: f64,
    pub netarea: f64,
    /// area of windows cut out of this element
    pub windowarea: f64,
    pub wk: f64,
    /// mean solar gain over the year (W), windows only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FabricResults {
    pub elements: Vec<ElementResult>,
    #[serde(rename = "total_heat_loss_WK")]
    pub total_heat_loss_wk: f64,
    pub total_thermal_capacity: f64,
    #[serde(rename = "total_floor_WK")]
    pub total_floor_wk: f64,
    #[serde(rename = "total_wall_WK")]
    pub total_wall_wk: f64,
    #[serde(rename = "total_roof_WK")]
    pub total_roof_wk: f64,
    #[serde(rename = "total_window_WK")]
    pub total_window_wk: f64,
    pub total_floor_area: f64,
    pub total_wall_area: f64,
    pub total_roof_area: f64,
    pub total_window_area: f64,
    pub total_external_area: f64,
    pub thermal_bridging_yvalue: f64,
    pub thermal_bridging_heat_loss: f64,
    /// W
    pub annual_solar_gain: f64,
    pub annual_solar_gain_kwh: f64,
}

impl FabricResults {
    fn add_to_type_totals(&mut self, element_type: &BuildingElementType, wk: f64, netarea: f64) {
        let (total_wk, total_area) = match element_type {
            BuildingElementType::Floor => (&mut self.total_floor_wk, &mut self.total_floor_area),
            BuildingElementType::Wall => (&mut self.total_wall_wk, &mut self.total_wall_area),
            BuildingElementType::Roof => (&mut self.total_roof_wk, &mut self.total_roof_area),
            BuildingElementType::Window => {
                (&mut self.total_window_wk, &mut self.total_window_area)
            }
            BuildingElementType::Other(unknown) => {
                warn!("Unknown building element type '{unknown}' left out of type totals");
                return;
            }
        };
        *total_wk += wk;
        *total_area += netarea;
    }
}

fn gross_area(element: &BuildingElementInput) -> f64 {
    match (element.l, element.h, element.area) {
        (Some(l), Some(h), _) => l * h,
        (_, _, Some(area)) => area,
        _ => 0.,
    }
}

pub(crate) struct FabricStage;

impl CalculationStage for FabricStage {
    fn name(&self) -> &'static str {
        "fabric"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "fabric": {
                "elements": [],
                "thermal_bridging_yvalue": 0.15
            }
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let conditions = ExternalConditions::new(reference, assessment.input.region)?;
        let elements = &assessment.input.fabric.elements;

        let mut results = elements
            .iter()
            .map(|element| {
                let area = gross_area(element);
                ElementResult {
                    name: element.name.clone(),
                    element_type: element.element_type.to_string(),
                    area,
                    netarea: area,
                    ..Default::default()
                }
            })
            .collect::<Vec<_>>();

        for (idx, element) in elements.iter().enumerate() {
            if element.element_type != BuildingElementType::Window {
                continue;
            }
            if let Some(target) = element.subtractfrom {
                let window_area = results[idx].area;
                let wall = results.get_mut(target).ok_or_else(|| {
                    anyhow!(
                        "Window {idx} subtracts from element {target}, but there are only {} elements",
                        elements.len()
                    )
                })?;
                wall.windowarea += window_area;
                wall.netarea -= window_area;
            }
        }

        let mut fabric = FabricResults {
            thermal_bridging_yvalue: assessment.input.fabric.thermal_bridging_yvalue,
            ..Default::default()
        };
        let mut solar_gains = MonthVector::zeros();
        let mut light_access = 0.;

        for (idx, (element, result)) in elements.iter().zip(results.iter_mut()).enumerate() {
            let uvalue = value_or_nan(element.uvalue);
            result.wk = result.netarea * uvalue;
            fabric.total_heat_loss_wk += result.wk;

            if uvalue != 0. {
                fabric.total_external_area += result.netarea;
            }

            fabric.add_to_type_totals(&element.element_type, result.wk, result.netarea);

            if let Some(kvalue) = element.kvalue.filter(|k| *k != 0.) {
                fabric.total_thermal_capacity += kvalue * result.netarea;
            }

            if element.element_type == BuildingElementType::Window {
                let orientation = element
                    .orientation
                    .ok_or_else(|| anyhow!("Window {idx} has no orientation"))?;
                let overshading = element
                    .overshading
                    .ok_or_else(|| anyhow!("Window {idx} has no overshading class"))?;
                let transmittance = SOLAR_TRANSMITTANCE_ANGLE_FACTOR
                    * value_or_nan(element.g)
                    * value_or_nan(element.ff);

                let window_gains = MonthVector::from_fn(|month_idx| {
                    solar_access_factor(overshading, month_idx)
                        * result.area
                        * conditions.solar_radiation(orientation, WINDOW_INCLINATION, month_idx)
                        * transmittance
                });
                solar_gains = solar_gains + window_gains;
                light_access += result.area * transmittance * light_access_factor(overshading);

                let gain = window_gains.mean();
                fabric.annual_solar_gain += gain;
                result.gain = Some(gain);
            }
        }

        fabric.thermal_bridging_heat_loss =
            fabric.total_external_area * fabric.thermal_bridging_yvalue;
        fabric.total_heat_loss_wk += fabric.thermal_bridging_heat_loss;
        fabric.annual_solar_gain_kwh = watts_to_kwh_per_year(fabric.annual_solar_gain);
        fabric.elements = results;

        let tfa = assessment.total_floor_area;
        assessment.thermal_mass_parameter = ratio_or_zero(fabric.total_thermal_capacity, tfa);
        assessment.glazing_light_ratio = ratio_or_zero(light_access, tfa);
        assessment.losses.insert(
            LossCategory::Fabric,
            MonthVector::constant(fabric.total_heat_loss_wk),
        );
        assessment.gains.insert(GainCategory::Solar, solar_gains);
        assessment.fabric = fabric;

        Ok(())
    }
}
