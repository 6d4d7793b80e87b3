use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::quant::{KvCacheQuantization, ModelQuantization};

pub const PARAMS_MIN_B: f64 = 1.0;
pub const PARAMS_MAX_B: f64 = 1000.0;

pub const CONTEXT_MIN: u32 = 128;
pub const CONTEXT_MAX: u32 = 32768;
pub const CONTEXT_STEP: u32 = 128;

pub const SYSTEM_MEMORY_MIN_GB: f64 = 8.0;
pub const SYSTEM_MEMORY_MAX_GB: f64 = 512.0;
pub const SYSTEM_MEMORY_STEP_GB: f64 = 8.0;

/// Discrete GPU sizes offered by the picker.
pub const GPU_MEMORY_OPTIONS_GB: &[f64] = &[8.0, 12.0, 16.0, 24.0, 32.0, 40.0, 48.0, 80.0];

/// Where the model weights live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentMode {
    /// One or more identical dedicated GPUs.
    DiscreteGpu,
    /// GPU and CPU share system RAM (Apple silicon, Ryzen AI Max).
    UnifiedMemory,
}

impl DeploymentMode {
    pub fn label(&self) -> &'static str {
        match self {
            DeploymentMode::DiscreteGpu => "Discrete GPU",
            DeploymentMode::UnifiedMemory => "Unified memory",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            DeploymentMode::DiscreteGpu => DeploymentMode::UnifiedMemory,
            DeploymentMode::UnifiedMemory => DeploymentMode::DiscreteGpu,
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "discrete" | "discrete-gpu" | "gpu" => Ok(DeploymentMode::DiscreteGpu),
            "unified" | "unified-memory" | "uma" => Ok(DeploymentMode::UnifiedMemory),
            _ => Err(ConfigError::UnknownDeploymentMode(s.to_string())),
        }
    }
}

/// Inputs to a single estimate. Passed by value; nothing is cached between
/// calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Model size in billions of parameters.
    pub params_billions: f64,
    pub model_quantization: ModelQuantization,
    pub use_kv_cache: bool,
    /// Ignored unless `use_kv_cache` is set.
    pub kv_cache_quantization: KvCacheQuantization,
    /// Context window in tokens.
    pub context_length: u32,
    pub deployment_mode: DeploymentMode,
    pub system_memory_gb: f64,
    /// Per-GPU memory. Ignored in unified memory mode.
    pub gpu_memory_gb: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            params_billions: 65.0,
            model_quantization: ModelQuantization::Q4,
            use_kv_cache: true,
            kv_cache_quantization: KvCacheQuantization::F16,
            context_length: 4096,
            deployment_mode: DeploymentMode::DiscreteGpu,
            system_memory_gb: 128.0,
            gpu_memory_gb: 24.0,
        }
    }
}

impl Configuration {
    /// Load a JSON preset. Missing fields fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Configuration =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(?path, ?config, "loaded preset");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_unified(&self) -> bool {
        self.deployment_mode == DeploymentMode::UnifiedMemory
    }

    /// Reject NaN and infinite sizes. Applies even to what-if input that
    /// skips [`Configuration::validate`].
    pub fn check_finite(&self) -> Result<()> {
        ensure_finite("params_billions", self.params_billions)?;
        ensure_finite("system_memory_gb", self.system_memory_gb)?;
        ensure_finite("gpu_memory_gb", self.gpu_memory_gb)
    }

    /// Check the configuration against the input domain the calculator is
    /// calibrated for. Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.check_finite()?;

        check_range(
            "params_billions",
            self.params_billions,
            PARAMS_MIN_B,
            PARAMS_MAX_B,
        )?;

        check_range(
            "context_length",
            self.context_length as f64,
            CONTEXT_MIN as f64,
            CONTEXT_MAX as f64,
        )?;
        if self.context_length % CONTEXT_STEP != 0 {
            return Err(ConfigError::NotAMultiple {
                field: "context_length",
                value: self.context_length as f64,
                step: CONTEXT_STEP as f64,
            });
        }

        check_range(
            "system_memory_gb",
            self.system_memory_gb,
            SYSTEM_MEMORY_MIN_GB,
            SYSTEM_MEMORY_MAX_GB,
        )?;
        if self.system_memory_gb % SYSTEM_MEMORY_STEP_GB != 0.0 {
            return Err(ConfigError::NotAMultiple {
                field: "system_memory_gb",
                value: self.system_memory_gb,
                step: SYSTEM_MEMORY_STEP_GB,
            });
        }

        if self.deployment_mode == DeploymentMode::DiscreteGpu
            && !GPU_MEMORY_OPTIONS_GB.contains(&self.gpu_memory_gb)
        {
            return Err(ConfigError::UnsupportedGpuMemory(self.gpu_memory_gb));
        }

        Ok(())
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite(field))
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
