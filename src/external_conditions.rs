use crate::core::monthly::MonthVector;
use crate::core::units::{degrees_to_radians, watt_days_to_kwh, DAYS_IN_MONTH, MONTHS_PER_YEAR};
use crate::input::Orientation;
use crate::reference_data::ReferenceData;
use anyhow::bail;

/// External temperature falls by this much (°C) for every 50 m of altitude.
const TEMPERATURE_LAPSE_PER_50_METRES: f64 = 0.3;

/// Monthly climate for one region, read from the reference tables.
#[derive(Clone, Copy, Debug)]
pub struct ExternalConditions<'a> {
    reference: &'a ReferenceData,
    region: usize,
}

impl<'a> ExternalConditions<'a> {
    pub fn new(reference: &'a ReferenceData, region: usize) -> anyhow::Result<Self> {
        if region >= reference.regions.len() {
            bail!(
                "Region {region} is not in the climate tables ({} regions are known)",
                reference.regions.len()
            );
        }

        Ok(Self { reference, region })
    }

    pub fn region_name(&self) -> &str {
        &self.reference.regions[self.region].name
    }

    pub fn latitude(&self) -> f64 {
        self.reference.regions[self.region].latitude
    }

    /// Mean external air temperature per month (Table U1), corrected for the site's altitude.
    pub fn air_temp_monthly(&self, altitude: f64) -> MonthVector {
        let correction = TEMPERATURE_LAPSE_PER_50_METRES * altitude / 50.;
        MonthVector::new(self.reference.external_temperature[self.region]).map(|t| t - correction)
    }

    /// Mean wind speed per month (Table U2), m/s.
    pub fn wind_speed_monthly(&self) -> MonthVector {
        MonthVector::new(self.reference.wind_speed[self.region])
    }

    /// Mean solar irradiance (W/m²) on a surface of the given orientation and inclination from
    /// horizontal (degrees), for one month.
    pub fn solar_radiation(&self, orientation: Orientation, inclination: f64, month_idx: usize) -> f64 {
        let column = orientation.solar_flux_column();
        let k = |row: usize| self.reference.solar_flux_coefficients[row][column];

        let sin_p = degrees_to_radians(inclination).sin();
        let sin_p_2 = sin_p.powi(2);
        let sin_p_3 = sin_p.powi(3);

        let a = k(0) * sin_p_3 + k(1) * sin_p_2 + k(2) * sin_p;
        let b = k(3) * sin_p_3 + k(4) * sin_p_2 + k(5) * sin_p;
        let c = k(6) * sin_p_3 + k(7) * sin_p_2 + k(8) * sin_p + 1.;

        let cos_1 =
            degrees_to_radians(self.latitude() - self.reference.solar_declination[month_idx]).cos();
        let cos_2 = cos_1.powi(2);

        let horizontal = self.reference.horizontal_irradiance[self.region][month_idx];

        horizontal * (a * cos_2 + b * cos_1 + c)
    }

    pub fn solar_radiation_monthly(&self, orientation: Orientation, inclination: f64) -> MonthVector {
        MonthVector::from_fn(|month_idx| self.solar_radiation(orientation, inclination, month_idx))
    }

    /// Annual solar radiation (kWh/m²) on a surface of the given orientation and inclination.
    pub fn annual_solar_radiation(&self, orientation: Orientation, inclination: f64) -> f64 {
        (0..MONTHS_PER_YEAR)
            .map(|month_idx| {
                watt_days_to_kwh(
                    DAYS_IN_MONTH[month_idx] as f64
                        * self.solar_radiation(orientation, inclination, month_idx),
                )
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn reference_data() -> ReferenceData {
        ReferenceData::sap_2012().unwrap()
    }

    #[rstest]
    fn should_reject_unknown_region(reference_data: ReferenceData) {
        assert!(ExternalConditions::new(&reference_data, 22).is_err());
        assert_eq!(
            ExternalConditions::new(&reference_data, 1)
                .unwrap()
                .region_name(),
            "Thames"
        );
    }

    #[rstest]
    fn should_lower_air_temperature_with_altitude(reference_data: ReferenceData) {
        let conditions = ExternalConditions::new(&reference_data, 0).unwrap();

        assert_eq!(conditions.air_temp_monthly(0.)[0], 4.5);
        assert_relative_eq!(conditions.air_temp_monthly(100.)[0], 3.9);
        assert_relative_eq!(conditions.air_temp_monthly(100.)[6], 16.3);
    }

    #[rstest]
    fn should_return_horizontal_irradiance_for_flat_surface(reference_data: ReferenceData) {
        let conditions = ExternalConditions::new(&reference_data, 0).unwrap();

        for orientation in [Orientation::North, Orientation::South, Orientation::East] {
            assert_relative_eq!(conditions.solar_radiation(orientation, 0., 0), 26.);
            assert_relative_eq!(conditions.solar_radiation(orientation, 0., 5), 201.);
        }
    }

    #[rstest]
    fn should_favour_south_facing_vertical_surfaces_in_winter(reference_data: ReferenceData) {
        let conditions = ExternalConditions::new(&reference_data, 0).unwrap();

        let south = conditions.solar_radiation(Orientation::South, 90., 0);
        let north = conditions.solar_radiation(Orientation::North, 90., 0);

        assert!(south > north);
        assert!(north > 0.);
    }

    #[rstest]
    fn should_mirror_secondary_orientations(reference_data: ReferenceData) {
        let conditions = ExternalConditions::new(&reference_data, 3).unwrap();

        assert_eq!(
            conditions.solar_radiation_monthly(Orientation::SouthWest, 45.),
            conditions.solar_radiation_monthly(Orientation::SouthEast, 45.)
        );
    }

    #[rstest]
    fn should_integrate_annual_radiation_over_days_in_month(reference_data: ReferenceData) {
        let conditions = ExternalConditions::new(&reference_data, 0).unwrap();

        let expected: f64 = reference_data.horizontal_irradiance[0]
            .iter()
            .zip(DAYS_IN_MONTH)
            .map(|(irradiance, days)| 0.024 * days as f64 * irradiance)
            .sum();

        assert_relative_eq!(
            conditions.annual_solar_radiation(Orientation::South, 0.),
            expected,
            max_relative = 1e-12
        );
    }
}
