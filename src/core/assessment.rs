use crate::core::energy_supply::current_energy::CurrentEnergyResults;
use crate::core::energy_supply::energy_systems::{FuelTotal, SystemDemand};
use crate::core::energy_supply::generation::GenerationResults;
use crate::core::geometry::FloorResult;
use crate::core::monthly::{MonthVector, MonthlyMap};
use crate::core::rating::SapRating;
use crate::core::space_heat_demand::fabric::FabricResults;
use crate::core::space_heat_demand::internal_gains::{ApplianceListResults, LacResults};
use crate::core::space_heat_demand::space_heating::SpaceHeatingResults;
use crate::core::space_heat_demand::temperature::TemperatureResults;
use crate::core::space_heat_demand::ventilation::VentilationResults;
use crate::core::water_heat_demand::solar_hot_water::SolarHotWaterResults;
use crate::core::water_heat_demand::water_heating::WaterHeatingResults;
use crate::input::{EnergySystemAssignment, Input, RequirementKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Heat loss coefficients (W/K) are recorded per category.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case")]
pub enum LossCategory {
    Fabric,
    Ventilation,
}

/// Heat gains (W) are recorded per category.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case")]
pub enum GainCategory {
    Solar,
    Lighting,
    Appliances,
    Cooking,
    WaterHeating,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnergyRequirement {
    pub name: String,
    /// kWh per year
    pub quantity: f64,
}

impl EnergyRequirement {
    pub(crate) fn new(kind: RequirementKind, quantity: f64) -> Self {
        Self {
            name: kind.display_name().to_string(),
            quantity,
        }
    }
}

/// The assessment record threaded through every calculation stage. It carries the input it was
/// built from, the quantities shared between stages (floor area, loss and gain categories,
/// energy requirements, fuel totals) and each stage's own results for display.
#[derive(Clone, Debug, Serialize)]
pub struct Assessment {
    pub input: Input,

    pub num_of_floors: usize,
    #[serde(rename = "TFA")]
    pub total_floor_area: f64,
    pub volume: f64,
    pub occupancy: f64,
    /// thermal mass parameter (kJ/m²K)
    #[serde(rename = "TMP")]
    pub thermal_mass_parameter: f64,
    /// glazing light access per unit floor area, used for the lighting correction
    #[serde(rename = "GL")]
    pub glazing_light_ratio: f64,

    pub internal_temperature: MonthVector,
    pub external_temperature: MonthVector,
    #[serde(rename = "losses_WK")]
    pub losses: MonthlyMap<LossCategory>,
    #[serde(rename = "gains_W")]
    pub gains: MonthlyMap<GainCategory>,
    pub energy_requirements: IndexMap<RequirementKind, EnergyRequirement>,
    /// systems serving each requirement: the input assignments plus those added for generation
    pub energy_systems: IndexMap<RequirementKind, Vec<EnergySystemAssignment>>,

    pub floors: Vec<FloorResult>,
    pub fabric: FabricResults,
    pub ventilation: VentilationResults,
    #[serde(rename = "LAC")]
    pub lac: LacResults,
    pub water_heating: WaterHeatingResults,
    #[serde(rename = "SHW", skip_serializing_if = "Option::is_none")]
    pub solar_hot_water: Option<SolarHotWaterResults>,
    pub appliancelist: ApplianceListResults,
    pub generation: GenerationResults,
    pub currentenergy: CurrentEnergyResults,
    pub temperature: TemperatureResults,
    pub space_heating: SpaceHeatingResults,

    pub system_demands: IndexMap<RequirementKind, Vec<SystemDemand>>,
    pub fuel_totals: IndexMap<String, FuelTotal>,
    pub total_cost: f64,
    pub total_income: f64,
    pub net_cost: f64,
    /// delivered energy across all fuels (kWh per year)
    pub energy_use: f64,
    pub annualco2: f64,
    pub primary_energy_use: f64,
    #[serde(rename = "SAP")]
    pub sap: SapRating,

    #[serde(rename = "totalWK")]
    pub total_heat_loss_coefficient: f64,
    pub fabric_energy_efficiency: f64,
    pub primary_energy_use_m2: f64,
    pub kgco2perm2: f64,
    pub kwhdpp: f64,
    pub primarykwhdpp: f64,
}

impl Assessment {
    pub fn new(input: Input) -> Self {
        let energy_systems = input.energy_systems.clone();

        Self {
            input,
            num_of_floors: 0,
            total_floor_area: 0.,
            volume: 0.,
            occupancy: 0.,
            thermal_mass_parameter: 0.,
            glazing_light_ratio: 0.,
            internal_temperature: MonthVector::constant(18.),
            external_temperature: MonthVector::constant(10.),
            losses: Default::default(),
            gains: Default::default(),
            energy_requirements: Default::default(),
            energy_systems,
            floors: Default::default(),
            fabric: Default::default(),
            ventilation: Default::default(),
            lac: Default::default(),
            water_heating: Default::default(),
            solar_hot_water: None,
            appliancelist: Default::default(),
            generation: Default::default(),
            currentenergy: Default::default(),
            temperature: Default::default(),
            space_heating: Default::default(),
            system_demands: Default::default(),
            fuel_totals: Default::default(),
            total_cost: 0.,
            total_income: 0.,
            net_cost: 0.,
            energy_use: 0.,
            annualco2: 0.,
            primary_energy_use: 0.,
            sap: Default::default(),
            total_heat_loss_coefficient: 0.,
            fabric_energy_efficiency: 0.,
            primary_energy_use_m2: 0.,
            kgco2perm2: 0.,
            kwhdpp: 0.,
            primarykwhdpp: 0.,
        }
    }

    /// Discard everything derived by a previous run, keeping only the input.
    pub(crate) fn reset(&mut self) {
        let input = self.input.clone();
        *self = Self::new(input);
    }

    pub(crate) fn total_losses(&self) -> MonthVector {
        self.losses.total()
    }

    pub(crate) fn total_gains(&self) -> MonthVector {
        self.gains.total()
    }

    pub(crate) fn register_requirement(&mut self, kind: RequirementKind, quantity: f64) {
        self.energy_requirements
            .insert(kind, EnergyRequirement::new(kind, quantity));
    }
}
