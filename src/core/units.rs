pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const MONTHS_PER_YEAR: usize = 12;
/// Table 1a: number of days in each month, January first.
pub const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
/// Summer months (June to September) as zero-based month indices.
pub(crate) const SUMMER_MONTHS: std::ops::RangeInclusive<usize> = 5..=8;

/// kWh delivered by one watt sustained for one day.
pub const KWH_PER_WATT_DAY: f64 = HOURS_PER_DAY as f64 / WATTS_PER_KILOWATT as f64;

/// Given a number of watt-days, produce a number of kWh.
pub fn watt_days_to_kwh(watt_days: f64) -> f64 {
    watt_days * KWH_PER_WATT_DAY
}

/// Given a constant wattage, give kWh per year.
pub fn watts_to_kwh_per_year(watts: f64) -> f64 {
    watts * KWH_PER_WATT_DAY * DAYS_PER_YEAR as f64
}

/// Average power in W over a month in which `kwh` was delivered.
pub(crate) fn kwh_per_month_to_watts(kwh: f64, month_idx: usize) -> f64 {
    kwh * WATTS_PER_KILOWATT as f64 / (DAYS_IN_MONTH[month_idx] * HOURS_PER_DAY) as f64
}

pub(crate) fn is_summer_month(month_idx: usize) -> bool {
    SUMMER_MONTHS.contains(&month_idx)
}

pub(crate) fn average_monthly_to_annual(list_monthly_averages: [f64; 12]) -> f64 {
    list_monthly_averages
        .iter()
        .enumerate()
        .map(|(month_idx, month_ave)| month_ave * DAYS_IN_MONTH[month_idx] as f64)
        .sum::<f64>()
        / DAYS_IN_MONTH.iter().sum::<u32>() as f64
}

/// Division used for per-floor-area and per-person figures: an empty dwelling (zero divisor)
/// yields 0 rather than an infinite or undefined value.
pub(crate) fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0. {
        0.
    } else {
        numerator / denominator
    }
}

pub(crate) fn degrees_to_radians(degrees: f64) -> f64 {
    degrees / 360. * 2. * std::f64::consts::PI
}
