mod test_gain_feedback {
    use crate::calculate;
    use crate::core::assessment::{Assessment, GainCategory};
    use crate::core::pipeline::Pipeline;
    use crate::input::{InputForProcessing, RequirementKind};
    use crate::reference_data::ReferenceData;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::{json, Value};

    #[fixture]
    fn reference_data() -> ReferenceData {
        ReferenceData::sap_2012().unwrap()
    }

    #[fixture]
    fn dwelling() -> Value {
        json!({
            "floors": [{"area": 45, "height": 2.5}, {"area": 45, "height": 2.4}],
            "fabric": {
                "elements": [
                    {"type": "wall", "area": 140, "uvalue": 0.35},
                    {"type": "floor", "area": 45, "uvalue": 0.25},
                    {"type": "roof", "area": 45, "uvalue": 0.16}
                ]
            },
            "energy_systems": {
                "space_heating": [{"system": "gasboiler", "fraction": 1}],
                "waterheating": [{"system": "gasboiler", "fraction": 1}],
                "lighting": [{"system": "electric", "fraction": 1}],
                "appliances": [{"system": "electric", "fraction": 1}],
                "cooking": [{"system": "electric", "fraction": 1}]
            }
        })
    }

    fn assess(input: Value, reference_data: &ReferenceData) -> Assessment {
        calculate(
            InputForProcessing::init_with_value(input).unwrap(),
            reference_data,
        )
        .unwrap()
    }

    fn with(mut input: Value, extra: Value) -> Value {
        if let (Some(input), Value::Object(extra)) = (input.as_object_mut(), extra) {
            input.extend(extra);
        }
        input
    }

    #[rstest]
    fn should_reduce_heating_demand_with_internal_gains(
        dwelling: Value,
        reference_data: ReferenceData,
    ) {
        let without_gains = assess(dwelling.clone(), &reference_data);
        let with_gains = assess(
            with(
                dwelling,
                json!({
                    "use_LAC": true,
                    "use_water_heating": true,
                    "water_heating": {"instantaneous_hotwater": true}
                }),
            ),
            &reference_data,
        );

        for category in [
            GainCategory::Lighting,
            GainCategory::Appliances,
            GainCategory::Cooking,
            GainCategory::WaterHeating,
        ] {
            assert!(with_gains.gains.contains(category), "{category} missing");
            assert!(!without_gains.gains.contains(category));
        }
        assert!(
            with_gains.space_heating.annual_heating_demand
                < without_gains.space_heating.annual_heating_demand
        );
        for kind in [
            RequirementKind::Lighting,
            RequirementKind::Appliances,
            RequirementKind::Cooking,
            RequirementKind::WaterHeating,
        ] {
            assert!(with_gains.energy_requirements.contains_key(&kind));
        }
        assert!(with_gains.fuel_totals.contains_key("electric"));
    }

    #[rstest]
    fn should_count_every_requirement_in_delivered_energy(
        dwelling: Value,
        reference_data: ReferenceData,
    ) {
        let assessment = assess(
            with(
                dwelling,
                json!({
                    "use_LAC": true,
                    "use_water_heating": true,
                    "water_heating": {"instantaneous_hotwater": true}
                }),
            ),
            &reference_data,
        );

        let requirements = assessment
            .energy_requirements
            .values()
            .map(|requirement| requirement.quantity)
            .sum::<f64>();
        let gas = &assessment.fuel_totals["gas"];
        let electric = &assessment.fuel_totals["electric"];

        assert_relative_eq!(
            assessment.energy_use,
            gas.quantity + electric.quantity,
            max_relative = 1e-12
        );
        // boiler losses put delivered energy above the requirements
        assert!(assessment.energy_use > requirements);
        assert_relative_eq!(
            assessment.total_cost,
            gas.annualcost + electric.annualcost,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_offset_costs_with_generation(dwelling: Value, reference_data: ReferenceData) {
        let without_generation = assess(dwelling.clone(), &reference_data);
        let with_generation = assess(
            with(
                dwelling,
                json!({
                    "use_generation": true,
                    "generation": {
                        "solar_annual_kwh": 2000,
                        "solar_fraction_used_onsite": 0.5,
                        "solar_FIT": 0.15
                    }
                }),
            ),
            &reference_data,
        );

        assert_relative_eq!(with_generation.total_income, 300.);
        assert_relative_eq!(
            with_generation.net_cost,
            with_generation.total_cost - 300.,
            max_relative = 1e-12
        );
        assert!(with_generation.total_cost < without_generation.total_cost);
        assert!(with_generation.sap.rating > without_generation.sap.rating);
    }

    #[rstest]
    fn should_give_same_record_when_run_again(dwelling: Value, reference_data: ReferenceData) {
        let pipeline = Pipeline::standard();
        let mut assessment = assess(
            with(dwelling, json!({"use_LAC": true})),
            &reference_data,
        );
        let first = serde_json::to_value(&assessment).unwrap();

        pipeline.run_on(&mut assessment, &reference_data).unwrap();

        assert_eq!(serde_json::to_value(&assessment).unwrap(), first);
    }
}
