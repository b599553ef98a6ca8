pub mod fabric;
pub mod internal_gains;
pub mod space_heating;
pub mod temperature;
pub mod utilisation;
pub mod ventilation;
