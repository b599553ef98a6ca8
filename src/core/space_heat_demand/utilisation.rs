/// Gain to loss ratios are rounded to this many decimal places to keep the utilisation factor
/// stable close to a ratio of 1.
const GAIN_LOSS_RATIO_SCALE: f64 = 1e8;

/// The monthly heat balance of a dwelling (or part of one) from which the utilisation factor
/// for gains (Table 9a) and the temperature reduction during off periods (Table 9b) follow.
///
/// Symbols and units:
/// * `thermal_mass_parameter` - TMP, thermal capacity per unit floor area (kJ/m²K)
/// * `heat_loss_parameter` - HLP, heat transfer coefficient per unit floor area (W/m²K)
/// * `heat_transfer_coefficient` - H (W/K)
/// * `internal_temperature` - Ti (°C)
/// * `external_temperature` - Te (°C)
/// * `gains` - G, total gains (W)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatBalance {
    pub thermal_mass_parameter: f64,
    pub heat_loss_parameter: f64,
    pub heat_transfer_coefficient: f64,
    pub internal_temperature: f64,
    pub external_temperature: f64,
    pub gains: f64,
}

impl HeatBalance {
    /// Time constant τ (h). A dwelling with no heat loss parameter never cools, so τ is infinite.
    pub fn time_constant(&self) -> f64 {
        if self.heat_loss_parameter <= 0. {
            f64::INFINITY
        } else {
            self.thermal_mass_parameter / (3.6 * self.heat_loss_parameter)
        }
    }

    fn heat_loss_rate(&self) -> f64 {
        self.heat_transfer_coefficient * (self.internal_temperature - self.external_temperature)
    }

    fn gain_loss_ratio(&self) -> f64 {
        (self.gains / self.heat_loss_rate() * GAIN_LOSS_RATIO_SCALE).round() / GAIN_LOSS_RATIO_SCALE
    }

    /// Utilisation factor η for gains.
    ///
    /// Limits:
    /// * η = 0 when there are no positive gains or no positive loss rate
    /// * η = a/(a+1) when the gain to loss ratio γ is exactly 1
    /// * η = min(1, 1/γ) when τ is infinite
    /// * η = 0 when any input is undefined
    pub fn utilisation_factor(&self) -> f64 {
        let eta = self.unchecked_utilisation_factor();
        if eta.is_nan() {
            0.
        } else {
            eta
        }
    }

    /// η before undefined values are zeroed. Overflow of γ^a for large time constants gives NaN.
    fn unchecked_utilisation_factor(&self) -> f64 {
        let loss_rate = self.heat_loss_rate();
        if !(self.gains > 0. && loss_rate > 0.) {
            return 0.;
        }

        let gamma = self.gain_loss_ratio();
        if !(gamma > 0.) {
            return 0.;
        }

        let tau = self.time_constant();
        if tau.is_infinite() {
            gamma.recip().min(1.)
        } else {
            let a = 1. + tau / 15.;
            if gamma == 1. {
                a / (a + 1.)
            } else {
                (1. - gamma.powf(a)) / (1. - gamma.powf(a + 1.))
            }
        }
    }

    /// Mean temperature reduction (°C) over a day with one off period of `off_hours`, for a
    /// heating system of the given `responsiveness` and demand temperature `heating_temperature`.
    /// Undefined results, including those from an undefined η, are treated as no reduction.
    pub fn temperature_reduction(
        &self,
        responsiveness: f64,
        heating_temperature: f64,
        off_hours: f64,
    ) -> f64 {
        let tau = self.time_constant();
        let eta = self.unchecked_utilisation_factor();
        let characteristic_time = 4. + 0.25 * tau;

        let setback_temperature = (1. - responsiveness) * (heating_temperature - 2.)
            + responsiveness
                * (self.external_temperature
                    + eta * self.gains / self.heat_transfer_coefficient);

        let reduction = if off_hours <= characteristic_time {
            0.5 * off_hours.powi(2) * (heating_temperature - setback_temperature)
                / (24. * characteristic_time)
        } else {
            (heating_temperature - setback_temperature) * (off_hours - 0.5 * characteristic_time)
                / 24.
        };

        if reduction.is_nan() {
            0.
        } else {
            reduction
        }
    }
}
