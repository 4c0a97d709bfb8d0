pub mod executor;
pub mod sample;
pub mod workers;
