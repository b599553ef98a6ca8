use crate::core::units::MONTHS_PER_YEAR;
use crate::defaults::add_defaults;
use crate::reference_data::Fuel;
use anyhow::bail;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt::{Display, Formatter};
use std::io::{BufReader, Read};

pub fn ingest_for_processing(json: impl Read) -> anyhow::Result<InputForProcessing> {
    InputForProcessing::init_with_json(json)
}

/// The user-supplied part of an assessment record, once every stage's defaults have been merged
/// in. This is the part that is persisted; everything derived from it lives on the assessment.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Input {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household: Option<Value>,
    pub region: usize,
    pub altitude: f64,
    pub use_custom_occupancy: bool,
    pub custom_occupancy: f64,
    pub floors: Vec<FloorInput>,
    pub fabric: FabricInput,
    pub ventilation: VentilationInput,
    #[serde(rename = "use_LAC")]
    pub use_lac: bool,
    #[serde(rename = "LAC")]
    pub lac: LacInput,
    pub use_generation: bool,
    pub generation: GenerationInput,
    pub currentenergy: CurrentEnergyInput,
    pub use_water_heating: bool,
    pub water_heating: WaterHeatingInput,
    #[serde(rename = "use_SHW")]
    pub use_shw: bool,
    #[serde(rename = "SHW")]
    pub shw: SolarHotWaterInput,
    pub use_appliancelist: bool,
    pub appliancelist: ApplianceListInput,
    pub temperature: TemperatureInput,
    pub space_heating: SpaceHeatingInput,
    pub energy_systems: IndexMap<RequirementKind, Vec<EnergySystemAssignment>>,
    pub fuels: IndexMap<String, Fuel>,
}

/// Absent numbers with no standard default take part in the calculation as NaN.
pub(crate) fn value_or_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FloorInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub area: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FabricInput {
    pub elements: Vec<BuildingElementInput>,
    pub thermal_bridging_yvalue: f64,
}

#[derive(Clone, Debug, Deserialize_enum_str, PartialEq, Serialize_enum_str)]
#[serde(rename_all = "lowercase")]
pub enum BuildingElementType {
    Floor,
    Wall,
    Roof,
    Window,
    #[serde(other)]
    Other(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BuildingElementInput {
    #[serde(rename = "type")]
    pub element_type: BuildingElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// index of the element whose area this window is cut out of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtractfrom: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    pub uvalue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kvalue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overshading: Option<Overshading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<f64>,
    #[serde(rename = "gL", default, skip_serializing_if = "Option::is_none")]
    pub g_light: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ff: Option<f64>,
}

/// Compass orientation of a surface. The solar tables only distinguish five orientations, so
/// the secondary points share a column with their mirror image.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum Orientation {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Orientation {
    /// Column in the solar flux coefficient table: North, NE/NW, East/West, SE/SW, South.
    pub(crate) fn solar_flux_column(&self) -> usize {
        match self {
            Orientation::North => 0,
            Orientation::NorthEast | Orientation::NorthWest => 1,
            Orientation::East | Orientation::West => 2,
            Orientation::SouthEast | Orientation::SouthWest => 3,
            Orientation::South => 4,
        }
    }
}

/// Table 6d overshading classes for windows.
#[derive(Clone, Copy, Debug, Deserialize_repr, Eq, PartialEq, Serialize_repr)]
#[repr(u8)]
pub enum Overshading {
    Heavy = 0,
    MoreThanAverage = 1,
    AverageOrUnknown = 2,
    VeryLittle = 3,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VentilationInput {
    pub number_of_chimneys: u32,
    pub number_of_openflues: u32,
    pub number_of_intermittentfans: u32,
    pub number_of_passivevents: u32,
    pub number_of_fluelessgasfires: u32,
    pub air_permeability_test: bool,
    /// q50 (m³/h/m²) from a pressure test
    pub air_permeability_value: f64,
    pub dwelling_construction: DwellingConstruction,
    #[serde(deserialize_with = "deserialize_suspended_wooden_floor")]
    pub suspended_wooden_floor: SuspendedWoodenFloor,
    pub draught_lobby: bool,
    pub percentage_draught_proofed: f64,
    pub number_of_sides_sheltered: u32,
    pub ventilation_type: VentilationType,
    pub system_air_change_rate: f64,
    pub balanced_heat_recovery_efficiency: f64,
}

#[derive(Clone, Debug, Deserialize_enum_str, PartialEq, Serialize_enum_str)]
#[serde(rename_all = "lowercase")]
pub enum DwellingConstruction {
    TimberFrame,
    Masonry,
    #[serde(other)]
    Other(String),
}

#[derive(Clone, Debug, Deserialize_enum_str, PartialEq, Serialize_enum_str)]
#[serde(rename_all = "lowercase")]
pub enum SuspendedWoodenFloor {
    Unsealed,
    Sealed,
    #[serde(rename = "none")]
    NotPresent,
    #[serde(other)]
    Other(String),
}

/// Saved records write "no suspended floor" as the number 0 rather than a name.
fn deserialize_suspended_wooden_floor<'de, D>(
    deserializer: D,
) -> Result<SuspendedWoodenFloor, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FloorCode {
        Number(u64),
        Name(SuspendedWoodenFloor),
    }

    Ok(match FloorCode::deserialize(deserializer)? {
        FloorCode::Number(0) => SuspendedWoodenFloor::NotPresent,
        FloorCode::Number(other) => SuspendedWoodenFloor::Other(other.to_string()),
        FloorCode::Name(floor) => floor,
    })
}

/// Mechanical ventilation arrangement, lettered as in the SAP worksheet (24a) to (24d).
#[derive(Clone, Debug, Deserialize_enum_str, PartialEq, Serialize_enum_str)]
pub enum VentilationType {
    /// balanced mechanical ventilation with heat recovery
    #[serde(rename = "a")]
    BalancedWithHeatRecovery,
    /// balanced mechanical ventilation without heat recovery
    #[serde(rename = "b")]
    BalancedWithoutHeatRecovery,
    /// whole house extract ventilation or positive input ventilation from outside
    #[serde(rename = "c")]
    Extract,
    /// natural ventilation or positive input ventilation from loft
    #[serde(rename = "d")]
    Natural,
    #[serde(other)]
    Other(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LacInput {
    /// number of fixed low energy lighting outlets
    #[serde(rename = "LLE")]
    pub low_energy_outlets: f64,
    /// total number of fixed lighting outlets
    #[serde(rename = "L")]
    pub outlets: f64,
    pub reduced_internal_heat_gains: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GenerationInput {
    pub solar_annual_kwh: f64,
    pub solar_fraction_used_onsite: f64,
    #[serde(rename = "solar_FIT")]
    pub solar_fit: f64,
    pub wind_annual_kwh: f64,
    pub wind_fraction_used_onsite: f64,
    #[serde(rename = "wind_FIT")]
    pub wind_fit: f64,
    pub hydro_annual_kwh: f64,
    pub hydro_fraction_used_onsite: f64,
    #[serde(rename = "hydro_FIT")]
    pub hydro_fit: f64,
    pub solarpv_orientation: Orientation,
    pub solarpv_kwp_installed: f64,
    pub solarpv_inclination: f64,
    /// overshading factor (Table H2)
    pub solarpv_overshading: f64,
    pub solarpv_fraction_used_onsite: f64,
    #[serde(rename = "solarpv_FIT")]
    pub solarpv_fit: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CurrentEnergyInput {
    pub energyitems: IndexMap<String, EnergyItemInput>,
    pub greenenergy: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnergyItemInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub quantity: f64,
    pub unitcost: f64,
    pub standingcharge: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WaterHeatingInput {
    pub combi_loss: [f64; MONTHS_PER_YEAR],
    pub solar_water_heating: bool,
    pub low_water_use_design: bool,
    pub pipework_insulated_fraction: f64,
    pub instantaneous_hotwater: bool,
    pub declared_loss_factor_known: bool,
    pub manufacturer_loss_factor: Option<f64>,
    pub temperature_factor_a: Option<f64>,
    pub storage_volume: Option<f64>,
    pub loss_factor_b: Option<f64>,
    pub volume_factor_b: Option<f64>,
    pub temperature_factor_b: Option<f64>,
    pub community_heating: bool,
    pub hot_water_store_in_dwelling: bool,
    #[serde(rename = "contains_dedicated_solar_storage_or_WWHRS")]
    pub contains_dedicated_solar_storage_or_wwhrs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_water_control_type: Option<HotWaterControlType>,
}

#[derive(Clone, Debug, Deserialize_enum_str, PartialEq, Serialize_enum_str)]
#[serde(rename_all = "snake_case")]
pub enum HotWaterControlType {
    NoCylinderThermostat,
    CylinderThermostatWithoutTimer,
    CylinderThermostatWithTimer,
    #[serde(other)]
    Other(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SolarHotWaterInput {
    /// aperture area of the collector (m²)
    #[serde(rename = "A")]
    pub aperture_area: f64,
    /// zero-loss collector efficiency
    pub n0: f64,
    /// linear heat loss coefficient
    pub a1: f64,
    /// second order heat loss coefficient
    pub a2: f64,
    pub inclination: f64,
    pub orientation: Orientation,
    /// overshading factor (Table H2)
    pub overshading: f64,
    /// dedicated solar storage volume (litres)
    #[serde(rename = "Vs")]
    pub dedicated_storage_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_cylinder_volume: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ApplianceListInput {
    pub list: Vec<ApplianceInput>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ApplianceInput {
    #[serde(default)]
    pub name: String,
    /// W
    pub power: f64,
    /// hours of use per day
    pub hours: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TemperatureInput {
    pub control_type: ControlType,
    /// demand temperature in the living area (°C)
    pub target: f64,
    /// heating system responsiveness (Table 4a/4d)
    pub responsiveness: f64,
    /// living area (m²); the whole floor area when not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_area: Option<f64>,
}

/// Heating control type (Table 4e), which sets the heating temperature in the rest of the
/// dwelling.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "u8", into = "u8")]
pub enum ControlType {
    Type1,
    Type2,
    Type3,
    Other(u8),
}

impl From<u8> for ControlType {
    fn from(code: u8) -> Self {
        match code {
            1 => ControlType::Type1,
            2 => ControlType::Type2,
            3 => ControlType::Type3,
            other => ControlType::Other(other),
        }
    }
}

impl From<ControlType> for u8 {
    fn from(control_type: ControlType) -> Self {
        match control_type {
            ControlType::Type1 => 1,
            ControlType::Type2 => 2,
            ControlType::Type3 => 3,
            ControlType::Other(code) => code,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SpaceHeatingInput {
    pub use_utilfactor_forgains: bool,
}

/// The kinds of annual energy requirement that can be served by energy systems. On-site
/// generation is registered as a negative requirement.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RequirementKind {
    #[serde(rename = "space_heating")]
    SpaceHeating,
    #[serde(rename = "space_cooling")]
    SpaceCooling,
    #[serde(rename = "waterheating")]
    WaterHeating,
    #[serde(rename = "lighting")]
    Lighting,
    #[serde(rename = "appliances")]
    Appliances,
    #[serde(rename = "cooking")]
    Cooking,
    #[serde(rename = "solarpv")]
    SolarPv,
    #[serde(rename = "wind")]
    Wind,
    #[serde(rename = "hydro")]
    Hydro,
    /// PV output estimated from installed peak power
    #[serde(rename = "solarpv2")]
    SolarPvFromPeakPower,
}

impl RequirementKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            RequirementKind::SpaceHeating => "Space Heating",
            RequirementKind::SpaceCooling => "Space Cooling",
            RequirementKind::WaterHeating => "Water Heating",
            RequirementKind::Lighting => "Lighting",
            RequirementKind::Appliances => "Appliances",
            RequirementKind::Cooking => "Cooking",
            RequirementKind::SolarPv | RequirementKind::SolarPvFromPeakPower => "Solar PV",
            RequirementKind::Wind => "Wind",
            RequirementKind::Hydro => "Hydro",
        }
    }
}

impl Display for RequirementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One energy system serving a share of a requirement.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnergySystemAssignment {
    /// key into the energy system table
    pub system: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fraction: Option<f64>,
    /// the system table's efficiency is used when not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

impl EnergySystemAssignment {
    pub(crate) fn whole_demand(system: &str) -> Self {
        Self {
            system: system.to_string(),
            description: None,
            fraction: Some(1.),
            efficiency: Some(1.),
        }
    }
}

/// Raw input JSON on its way to becoming an `Input`: stage defaults are layered onto it before
/// it is deserialised.
#[derive(Clone, Debug)]
pub struct InputForProcessing {
    input: Value,
}

impl InputForProcessing {
    pub fn init_with_json(json: impl Read) -> anyhow::Result<Self> {
        let reader = BufReader::new(json);

        Self::init_with_value(serde_json::from_reader(reader)?)
    }

    pub fn init_with_value(input: Value) -> anyhow::Result<Self> {
        if !(input.is_object() || input.is_null()) {
            bail!("Assessment input is expected to be a JSON object");
        }

        Ok(Self { input })
    }

    pub fn merge_defaults(&mut self, defaults: &Value) -> &Self {
        add_defaults(&mut self.input, defaults);
        self
    }

    pub fn as_json(&self) -> &Value {
        &self.input
    }

    pub fn finalize(self) -> anyhow::Result<Input> {
        Ok(serde_json::from_value(self.input)?)
    }
}
