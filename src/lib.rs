pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod harvest;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod util;
pub mod worksheet;
