use crate::core::monthly::MonthVector;
use crate::core::units::{DAYS_IN_MONTH, DAYS_PER_YEAR};
use crate::external_conditions::ExternalConditions;
use crate::input::{value_or_nan, SolarHotWaterInput};
use serde::Serialize;
use serde_json::{json, Value};

/// Standard collector used when none is described (Appendix H).
pub(crate) fn defaults() -> Value {
    json!({
        "use_SHW": false,
        "SHW": {
            "A": 1.25,
            "n0": 0.599,
            "a1": 2.772,
            "a2": 0.009,
            "inclination": 35,
            "orientation": 4,
            "overshading": 1.0
        }
    })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SolarHotWaterResults {
    /// effective collector heat loss coefficient
    pub a: f64,
    pub collector_performance_ratio: f64,
    /// kWh/m² on the collector
    pub annual_solar: f64,
    /// kWh
    pub solar_energy_available: f64,
    pub solar_load_ratio: f64,
    pub utilisation_factor: f64,
    pub collector_performance_factor: f64,
    /// effective solar volume (litres)
    #[serde(rename = "Veff")]
    pub effective_solar_volume: f64,
    pub volume_ratio: f64,
    /// solar storage volume factor
    pub f2: f64,
    /// kWh/year
    #[serde(rename = "Qs")]
    pub solar_input: f64,
    /// kWh per month, negative as it offsets water heater output
    #[serde(rename = "Qs_monthly")]
    pub solar_input_monthly: MonthVector,
}

fn collector_performance_factor(collector_performance_ratio: f64) -> f64 {
    let factor = if collector_performance_ratio < 20. {
        0.97 - 0.0367 * collector_performance_ratio + 0.0006 * collector_performance_ratio.powi(2)
    } else {
        0.693 - 0.0108 * collector_performance_ratio
    };

    if factor < 0. {
        0.
    } else {
        factor
    }
}

/// Solar input to the hot water system (Appendix H) for a dwelling with the given annual hot
/// water energy content (kWh) and average daily hot water volume (litres).
pub fn solar_hot_water(
    collector: &SolarHotWaterInput,
    conditions: &ExternalConditions,
    annual_energy_content: f64,
    daily_hot_water_volume: f64,
) -> SolarHotWaterResults {
    let a = 0.892 * (collector.a1 + 45. * collector.a2);
    let collector_performance_ratio = a / collector.n0;
    let annual_solar =
        conditions.annual_solar_radiation(collector.orientation, collector.inclination);
    let solar_energy_available =
        collector.aperture_area * collector.n0 * annual_solar * collector.overshading;

    let solar_load_ratio = solar_energy_available / annual_energy_content;
    let utilisation_factor = if solar_load_ratio > 0. {
        1. - (-1. / solar_load_ratio).exp()
    } else {
        0.
    };

    let dedicated_volume = value_or_nan(collector.dedicated_storage_volume);
    let effective_solar_volume = match collector.combined_cylinder_volume {
        Some(combined) if combined > 0. => {
            dedicated_volume + 0.3 * (combined - dedicated_volume)
        }
        _ => dedicated_volume,
    };
    let volume_ratio = effective_solar_volume / daily_hot_water_volume;
    let f2 = {
        let f2 = 1. + 0.2 * volume_ratio.ln();
        if f2 > 1. {
            1.
        } else {
            f2
        }
    };

    let collector_performance_factor = collector_performance_factor(collector_performance_ratio);
    let solar_input =
        solar_energy_available * utilisation_factor * collector_performance_factor * f2;

    let radiation =
        conditions.solar_radiation_monthly(collector.orientation, collector.inclination);
    let mean_radiation = radiation.mean();
    let solar_input_monthly = MonthVector::from_fn(|m| {
        -solar_input * (radiation[m] / mean_radiation) * DAYS_IN_MONTH[m] as f64
            / DAYS_PER_YEAR as f64
    });

    SolarHotWaterResults {
        a,
        collector_performance_ratio,
        annual_solar,
        solar_energy_available,
        solar_load_ratio,
        utilisation_factor,
        collector_performance_factor,
        effective_solar_volume,
        volume_ratio,
        f2,
        solar_input,
        solar_input_monthly,
    }
}
