pub mod assessment;
pub mod energy_supply;
pub mod geometry;
pub mod monthly;
pub mod pipeline;
pub mod rating;
pub mod space_heat_demand;
pub mod units;
pub mod water_heat_demand;
