pub mod group;
pub mod sensor;
pub mod state;
