#![allow(dead_code)]

pub mod config;
pub mod error;
pub mod ml;
pub mod models;
pub mod scoring;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use services::EngineState;
