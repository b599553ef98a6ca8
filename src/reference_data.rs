use crate::core::units::MONTHS_PER_YEAR;
use anyhow::anyhow;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Cursor, Read};

/// Static lookup tables consumed by the calculation. The standard bundle carries the SAP 2012
/// tables; an alternative bundle can be read from JSON with the same shape.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ReferenceData {
    /// Climate regions with their representative latitude (Table U4), indexed by region id.
    pub regions: Vec<Region>,
    /// Table U1: mean external temperature (°C) per region and month.
    pub external_temperature: Vec<[f64; MONTHS_PER_YEAR]>,
    /// Table U2: wind speed (m/s) per region and month.
    pub wind_speed: Vec<[f64; MONTHS_PER_YEAR]>,
    /// Table U3: mean global solar irradiance on a horizontal plane (W/m²) per region and month.
    pub horizontal_irradiance: Vec<[f64; MONTHS_PER_YEAR]>,
    /// Solar declination (degrees) per month.
    pub solar_declination: [f64; MONTHS_PER_YEAR],
    /// Table U5: constants k1 to k9 for North, NE/NW, East/West, SE/SW and South.
    pub solar_flux_coefficients: [[f64; 5]; 9],
    /// Table 1c: monthly factors for hot water use.
    pub hot_water_use_factors: [f64; MONTHS_PER_YEAR],
    /// Table 1d: temperature rise of hot water drawn off (K).
    pub hot_water_temperature_rise: [f64; MONTHS_PER_YEAR],
    /// Table H4: primary circuit loss factors with solar water heating.
    pub solar_primary_loss_factors: [f64; MONTHS_PER_YEAR],
    pub fuels: IndexMap<String, Fuel>,
    pub energy_systems: IndexMap<String, EnergySystemSpec>,
    pub rating_bands: Vec<RatingBand>,
    pub current_energy_items: IndexMap<String, CurrentEnergyItemSpec>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Region {
    pub name: String,
    pub latitude: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Fuel {
    /// cost per kWh
    pub fuelcost: f64,
    /// daily standing charge
    pub standingcharge: f64,
    /// kg CO2 per kWh
    pub co2factor: f64,
    pub primaryenergyfactor: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnergySystemSpec {
    pub name: String,
    pub efficiency: f64,
    pub fuel: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RatingBand {
    pub letter: String,
    pub start: i32,
    pub end: i32,
    pub color: String,
}

/// Fixed properties of an item of actual recorded energy use (a fuel, a vehicle or a mode of
/// transport).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CurrentEnergyItemSpec {
    pub name: String,
    pub note: String,
    pub units: String,
    /// kWh per unit (per gallon for vehicles with an mpg figure)
    pub kwh: f64,
    /// kg CO2 per unit (per gallon for vehicles with an mpg figure)
    pub co2: f64,
    pub primaryenergy: f64,
    pub unitcost: f64,
    pub standingcharge: f64,
    pub mpg: Option<f64>,
    /// switched to green factors when the household buys green electricity
    pub electric: bool,
    pub space_heating: bool,
    /// counted towards household primary energy, CO2 and cost totals
    pub household_energy: bool,
}

const SOLAR_DECLINATION: [f64; MONTHS_PER_YEAR] = [
    -20.7, -12.8, -1.8, 9.8, 18.8, 23.1, 21.2, 13.7, 2.9, -8.7, -18.4, -23.0,
];

const SOLAR_FLUX_COEFFICIENTS: [[f64; 5]; 9] = [
    [0.056, -2.85, -0.241, 0.839, 2.35],
    [-5.79, 2.89, -0.024, -0.604, -2.97],
    [6.23, 0.298, 0.351, 0.989, 2.4],
    [3.32, 4.52, 0.604, -0.554, -3.04],
    [-0.159, -6.28, -0.494, 0.251, 3.88],
    [-3.74, 1.47, -0.502, -2.49, -4.97],
    [-2.7, -2.58, -1.79, -2.0, -1.31],
    [3.45, 3.96, 2.06, 2.28, 1.27],
    [-1.21, -1.88, -0.405, 0.807, 1.83],
];

const HOT_WATER_USE_FACTORS: [f64; MONTHS_PER_YEAR] = [
    1.1, 1.06, 1.02, 0.98, 0.94, 0.90, 0.90, 0.94, 0.98, 1.02, 1.06, 1.10,
];

const HOT_WATER_TEMPERATURE_RISE: [f64; MONTHS_PER_YEAR] = [
    41.2, 41.4, 40.1, 37.6, 36.4, 33.9, 30.4, 33.4, 33.5, 36.3, 39.4, 39.9,
];

const SOLAR_PRIMARY_LOSS_FACTORS: [f64; MONTHS_PER_YEAR] = [
    1.0, 1.0, 0.94, 0.70, 0.45, 0.44, 0.44, 0.48, 0.76, 0.94, 1.0, 1.0,
];

impl ReferenceData {
    /// The standard SAP 2012 tables, as bundled with the crate.
    pub fn sap_2012() -> anyhow::Result<Self> {
        let reference_data = Self {
            regions: read_rows(include_str!("reference_data/regions.csv"))?,
            external_temperature: read_monthly_rows(include_str!(
                "reference_data/external_temperature.csv"
            ))?,
            wind_speed: read_monthly_rows(include_str!("reference_data/wind_speed.csv"))?,
            horizontal_irradiance: read_monthly_rows(include_str!(
                "reference_data/horizontal_irradiance.csv"
            ))?,
            solar_declination: SOLAR_DECLINATION,
            solar_flux_coefficients: SOLAR_FLUX_COEFFICIENTS,
            hot_water_use_factors: HOT_WATER_USE_FACTORS,
            hot_water_temperature_rise: HOT_WATER_TEMPERATURE_RISE,
            solar_primary_loss_factors: SOLAR_PRIMARY_LOSS_FACTORS,
            fuels: read_keyed_rows::<FuelRow, _>(include_str!("reference_data/fuels.csv"))?,
            energy_systems: read_keyed_rows::<EnergySystemRow, _>(include_str!(
                "reference_data/energy_systems.csv"
            ))?,
            rating_bands: read_rows(include_str!("reference_data/rating_bands.csv"))?,
            current_energy_items: read_keyed_rows::<CurrentEnergyItemRow, _>(include_str!(
                "reference_data/current_energy_items.csv"
            ))?,
        };
        reference_data.check_region_tables()?;

        Ok(reference_data)
    }

    /// Read an alternative bundle from JSON.
    pub fn from_json(json: impl Read) -> anyhow::Result<Self> {
        let reference_data: Self = serde_json::from_reader(BufReader::new(json))?;
        reference_data.check_region_tables()?;

        Ok(reference_data)
    }

    fn check_region_tables(&self) -> anyhow::Result<()> {
        let region_count = self.regions.len();
        for (table, rows) in [
            ("external temperature", self.external_temperature.len()),
            ("wind speed", self.wind_speed.len()),
            ("horizontal irradiance", self.horizontal_irradiance.len()),
        ] {
            if rows != region_count {
                return Err(anyhow!(
                    "The {table} table has {rows} rows but there are {region_count} regions"
                ));
            }
        }

        Ok(())
    }
}

fn read_rows<T: DeserializeOwned>(csv: &str) -> anyhow::Result<Vec<T>> {
    Ok(csv::Reader::from_reader(BufReader::new(Cursor::new(csv)))
        .deserialize::<T>()
        .collect::<Result<_, _>>()?)
}

fn read_monthly_rows(csv: &str) -> anyhow::Result<Vec<[f64; MONTHS_PER_YEAR]>> {
    read_rows::<Vec<f64>>(csv)?
        .into_iter()
        .map(|row| {
            <[f64; MONTHS_PER_YEAR]>::try_from(row.as_slice()).map_err(|_| {
                anyhow!(
                    "Expected {MONTHS_PER_YEAR} monthly values in reference table row, found {}",
                    row.len()
                )
            })
        })
        .collect()
}

/// A CSV row that carries its own key in the first column.
trait KeyedRow<T>: DeserializeOwned {
    fn into_entry(self) -> (String, T);
}

fn read_keyed_rows<R: KeyedRow<T>, T>(csv: &str) -> anyhow::Result<IndexMap<String, T>> {
    Ok(read_rows::<R>(csv)?
        .into_iter()
        .map(KeyedRow::into_entry)
        .collect())
}

#[derive(Deserialize)]
struct FuelRow {
    fuel: String,
    fuelcost: f64,
    standingcharge: f64,
    co2factor: f64,
    primaryenergyfactor: f64,
}

impl KeyedRow<Fuel> for FuelRow {
    fn into_entry(self) -> (String, Fuel) {
        (
            self.fuel,
            Fuel {
                fuelcost: self.fuelcost,
                standingcharge: self.standingcharge,
                co2factor: self.co2factor,
                primaryenergyfactor: self.primaryenergyfactor,
            },
        )
    }
}

#[derive(Deserialize)]
struct EnergySystemRow {
    system: String,
    name: String,
    efficiency: f64,
    fuel: String,
}

impl KeyedRow<EnergySystemSpec> for EnergySystemRow {
    fn into_entry(self) -> (String, EnergySystemSpec) {
        let Self {
            system,
            name,
            efficiency,
            fuel,
        } = self;
        (
            system,
            EnergySystemSpec {
                name,
                efficiency,
                fuel,
            },
        )
    }
}

#[derive(Deserialize)]
struct CurrentEnergyItemRow {
    item: String,
    name: String,
    note: String,
    units: String,
    kwh: f64,
    co2: f64,
    primaryenergy: f64,
    unitcost: f64,
    standingcharge: f64,
    mpg: Option<f64>,
    electric: bool,
    space_heating: bool,
    household_energy: bool,
}

impl KeyedRow<CurrentEnergyItemSpec> for CurrentEnergyItemRow {
    fn into_entry(self) -> (String, CurrentEnergyItemSpec) {
        let Self {
            item,
            name,
            note,
            units,
            kwh,
            co2,
            primaryenergy,
            unitcost,
            standingcharge,
            mpg,
            electric,
            space_heating,
            household_energy,
        } = self;
        (
            item,
            CurrentEnergyItemSpec {
                name,
                note,
                units,
                kwh,
                co2,
                primaryenergy,
                unitcost,
                standingcharge,
                mpg,
                electric,
                space_heating,
                household_energy,
            },
        )
    }
}
