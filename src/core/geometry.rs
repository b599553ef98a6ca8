use crate::core::assessment::Assessment;
use crate::core::pipeline::CalculationStage;
use crate::input::value_or_nan;
use crate::reference_data::ReferenceData;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FloorResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub area: f64,
    pub height: f64,
    pub volume: f64,
}

pub(crate) struct FloorsStage;

impl CalculationStage for FloorsStage {
    fn name(&self) -> &'static str {
        "floors"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({ "floors": [] })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        _reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        let floors = assessment
            .input
            .floors
            .iter()
            .map(|floor| {
                let area = value_or_nan(floor.area);
                let height = value_or_nan(floor.height);
                FloorResult {
                    name: floor.name.clone(),
                    area,
                    height,
                    volume: area * height,
                }
            })
            .collect::<Vec<_>>();

        assessment.total_floor_area = floors.iter().map(|floor| floor.area).sum();
        assessment.volume = floors.iter().map(|floor| floor.volume).sum();
        assessment.num_of_floors = floors.len();
        assessment.floors = floors;

        Ok(())
    }
}

/// Assumed occupancy (Table 1b) for a dwelling of the given total floor area.
pub fn standard_occupancy(total_floor_area: f64) -> f64 {
    if total_floor_area > 13.9 {
        let excess_area = total_floor_area - 13.9;
        1. + 1.76 * (1. - (-0.000349 * excess_area.powi(2)).exp()) + 0.0013 * excess_area
    } else {
        1.
    }
}

pub(crate) struct OccupancyStage;

impl CalculationStage for OccupancyStage {
    fn name(&self) -> &'static str {
        "occupancy"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "use_custom_occupancy": false,
            "custom_occupancy": 1
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        _reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        assessment.occupancy = if assessment.input.use_custom_occupancy {
            assessment.input.custom_occupancy
        } else {
            standard_occupancy(assessment.total_floor_area)
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::Pipeline;
    use crate::input::{FloorInput, InputForProcessing};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn reference_data() -> ReferenceData {
        ReferenceData::sap_2012().unwrap()
    }

    fn assessment_with_floors(reference_data: &ReferenceData, floors: Value) -> Assessment {
        let input = Pipeline::standard()
            .prepare(
                InputForProcessing::init_with_value(json!({ "floors": floors })).unwrap(),
                reference_data,
            )
            .unwrap();
        Assessment::new(input)
    }

    #[rstest]
    fn should_sum_floor_areas_and_volumes(reference_data: ReferenceData) {
        let mut assessment = assessment_with_floors(
            &reference_data,
            json!([
                {"name": "Ground", "area": 50, "height": 2.5},
                {"name": "First", "area": 40, "height": 2.4}
            ]),
        );

        FloorsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(assessment.num_of_floors, 2);
        assert_relative_eq!(assessment.total_floor_area, 90.);
        assert_relative_eq!(assessment.volume, 221.);
        assert_eq!(assessment.floors[1].name.as_deref(), Some("First"));
        assert_relative_eq!(assessment.floors[1].volume, 96.);
    }

    #[rstest]
    fn should_propagate_missing_dimensions_as_nan(reference_data: ReferenceData) {
        let mut assessment = assessment_with_floors(&reference_data, json!([]));
        assessment.input.floors = vec![FloorInput {
            name: None,
            area: Some(50.),
            height: None,
        }];

        FloorsStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(assessment.total_floor_area, 50.);
        assert!(assessment.volume.is_nan());
    }

    #[rstest]
    #[case(10., 1.)]
    #[case(13.9, 1.)]
    #[case(100., 2.7395)]
    #[case(200., 3.0019)]
    fn should_estimate_occupancy_from_floor_area(#[case] tfa: f64, #[case] expected: f64) {
        assert_relative_eq!(standard_occupancy(tfa), expected, epsilon = 1e-4);
    }

    #[rstest]
    fn should_prefer_custom_occupancy(reference_data: ReferenceData) {
        let mut assessment = assessment_with_floors(&reference_data, json!([]));
        assessment.total_floor_area = 100.;
        assessment.input.use_custom_occupancy = true;
        assessment.input.custom_occupancy = 4.;

        OccupancyStage
            .calculate(&mut assessment, &reference_data)
            .unwrap();

        assert_eq!(assessment.occupancy, 4.);
    }
}
