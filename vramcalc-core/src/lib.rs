//! Hardware estimates for running a quantized LLM locally: VRAM, system
//! RAM, disk footprint and how many GPUs it takes.
//!
//! Every estimator function is pure. Build a [`Configuration`], pass it in,
//! render what comes back.

pub mod config;
pub mod error;
pub mod estimate;
pub mod hardware;
pub mod quant;
pub mod report;

pub use config::{Configuration, DeploymentMode};
pub use error::{ConfigError, Result};
pub use estimate::{
    ComplexityTier, Recommendation, UtilizationClass, hardware_recommendation,
    max_usable_unified_memory_gb, on_disk_size_gb, required_vram_gb, round_half_up,
    utilization_class,
};
pub use quant::{KvCacheQuantization, ModelQuantization};
pub use report::EstimateReport;
