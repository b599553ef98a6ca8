pub mod solar_hot_water;
pub mod water_heating;
