pub mod config;
pub mod games;
pub mod predict;
pub mod sampler;
pub mod schools;
pub mod stats;
pub mod weights;
pub mod wheel;

pub use config::EngineConfig;
pub use predict::{Engine, PredictRequest, predict};
pub use schools::SchoolId;
