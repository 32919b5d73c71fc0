//! Live trip, speed and connectivity summary from inside an ICE train
pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod render;
pub mod services;
pub mod utils;
