pub mod config;
pub mod dashboard;
pub mod descriptor;
pub mod error;
pub mod progress;
pub mod render;
pub mod result;
pub mod strategy;

pub use config::ArcvaultConfig;
pub use error::{ArcvaultError, Result};
