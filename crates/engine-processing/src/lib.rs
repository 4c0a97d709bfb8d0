pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod transform;
pub mod worker;
