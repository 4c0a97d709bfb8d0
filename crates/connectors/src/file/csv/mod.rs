pub mod destination;
pub mod settings;
pub mod source;
