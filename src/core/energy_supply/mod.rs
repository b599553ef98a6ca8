pub mod current_energy;
pub mod energy_systems;
pub mod generation;
