use crate::core::assessment::Assessment;
use crate::core::energy_supply::current_energy::CurrentEnergyStage;
use crate::core::energy_supply::energy_systems::EnergySystemsStage;
use crate::core::energy_supply::generation::GenerationStage;
use crate::core::geometry::{FloorsStage, OccupancyStage};
use crate::core::rating::RatingStage;
use crate::core::space_heat_demand::fabric::FabricStage;
use crate::core::space_heat_demand::internal_gains::{ApplianceListStage, LacStage};
use crate::core::space_heat_demand::space_heating::SpaceHeatingStage;
use crate::core::space_heat_demand::temperature::TemperatureStage;
use crate::core::space_heat_demand::ventilation::VentilationStage;
use crate::core::units::{ratio_or_zero, DAYS_PER_YEAR};
use crate::core::water_heat_demand::water_heating::WaterHeatingStage;
use crate::errors::BemCoreError;
use crate::external_conditions::ExternalConditions;
use crate::input::{Input, InputForProcessing};
use crate::reference_data::ReferenceData;
use serde_json::{json, Value};
use tracing::debug;

/// One step of the assessment. Each stage reads what earlier stages left on the record and
/// writes its own section plus any shared aggregates it contributes to.
pub trait CalculationStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Standard values for the part of the input this stage owns.
    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({})
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn CalculationStage>>,
}

impl Pipeline {
    /// Stages in the fixed order of the assessment procedure. Gain-producing stages precede the
    /// temperature and space heating stages, which precede fuel aggregation and the rating.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Box::new(StartStage),
                Box::new(FloorsStage),
                Box::new(OccupancyStage),
                Box::new(FabricStage),
                Box::new(VentilationStage),
                Box::new(LacStage),
                Box::new(WaterHeatingStage),
                Box::new(ApplianceListStage),
                Box::new(GenerationStage),
                Box::new(CurrentEnergyStage),
                Box::new(TemperatureStage),
                Box::new(SpaceHeatingStage),
                Box::new(EnergySystemsStage),
                Box::new(RatingStage),
            ],
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Complete a partial input with every stage's defaults, in stage order.
    pub fn apply_defaults(&self, input: &mut InputForProcessing, reference: &ReferenceData) {
        for stage in &self.stages {
            input.merge_defaults(&stage.defaults(reference));
        }
    }

    pub fn prepare(
        &self,
        mut input: InputForProcessing,
        reference: &ReferenceData,
    ) -> anyhow::Result<Input> {
        self.apply_defaults(&mut input, reference);
        input.finalize()
    }

    pub fn run(&self, input: Input, reference: &ReferenceData) -> Result<Assessment, BemCoreError> {
        let mut assessment = Assessment::new(input);
        self.run_on(&mut assessment, reference)?;

        Ok(assessment)
    }

    /// Run every stage against an existing record. A failing stage stops the run and leaves the
    /// record as that stage found it, or partway through it.
    pub fn run_on(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> Result<(), BemCoreError> {
        for stage in &self.stages {
            debug!("Running {} stage", stage.name());
            stage
                .calculate(assessment, reference)
                .map_err(|error| BemCoreError::new(stage.name(), error))?;
        }

        summarise(assessment);

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Clears anything left over from a previous run and checks the region exists.
struct StartStage;

impl CalculationStage for StartStage {
    fn name(&self) -> &'static str {
        "start"
    }

    fn defaults(&self, _reference: &ReferenceData) -> Value {
        json!({
            "region": 0,
            "altitude": 0
        })
    }

    fn calculate(
        &self,
        assessment: &mut Assessment,
        reference: &ReferenceData,
    ) -> anyhow::Result<()> {
        assessment.reset();
        let conditions = ExternalConditions::new(reference, assessment.input.region)?;
        debug!("Assessing dwelling in climate region {}", conditions.region_name());

        Ok(())
    }
}

/// Cross-cutting figures derived once every stage has run.
fn summarise(assessment: &mut Assessment) {
    let tfa = assessment.total_floor_area;
    let occupancy = assessment.occupancy;

    assessment.total_heat_loss_coefficient =
        assessment.fabric.total_heat_loss_wk + assessment.ventilation.average_wk;
    assessment.primary_energy_use_m2 = ratio_or_zero(assessment.primary_energy_use, tfa);
    assessment.kgco2perm2 = ratio_or_zero(assessment.annualco2, tfa);
    assessment.kwhdpp = ratio_or_zero(assessment.energy_use / DAYS_PER_YEAR as f64, occupancy);
    assessment.primarykwhdpp = ratio_or_zero(
        assessment.primary_energy_use / DAYS_PER_YEAR as f64,
        occupancy,
    );
}
