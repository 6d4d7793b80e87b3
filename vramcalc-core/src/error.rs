use std::path::PathBuf;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Everything that can go wrong before an estimate is computed.
/// The estimator itself is total and never returns one of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown model quantization '{0}' (expected one of F32, F16, Q8, Q6, Q5, Q4, Q3, Q2, GPTQ, AWQ)")]
    UnknownModelQuantization(String),
    #[error("unknown KV cache quantization '{0}' (expected one of F32, F16, Q8, Q5, Q4)")]
    UnknownKvCacheQuantization(String),
    #[error("unknown deployment mode '{0}' (expected 'discrete' or 'unified')")]
    UnknownDeploymentMode(String),
    #[error("could not parse memory size '{0}' (expected e.g. 24G, 24576M, 0.5T)")]
    InvalidMemorySize(String),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be a multiple of {step}, got {value}")]
    NotAMultiple {
        field: &'static str,
        value: f64,
        step: f64,
    },
    #[error("GPU memory {0} GB is not a selectable size (8, 12, 16, 24, 32, 40, 48 or 80 GB)")]
    UnsupportedGpuMemory(f64),
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("failed to read preset {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse preset {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
