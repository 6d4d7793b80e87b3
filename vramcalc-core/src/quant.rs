use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weight quantization formats, ordered from widest to most compressed
/// (GPTQ and AWQ trail the plain integer formats, as in the format picker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelQuantization {
    F32,
    F16,
    Q8,
    Q6,
    Q5,
    Q4,
    Q3,
    Q2,
    #[serde(rename = "GPTQ")]
    Gptq,
    #[serde(rename = "AWQ")]
    Awq,
}

impl ModelQuantization {
    pub const ALL: &'static [ModelQuantization] = &[
        ModelQuantization::F32,
        ModelQuantization::F16,
        ModelQuantization::Q8,
        ModelQuantization::Q6,
        ModelQuantization::Q5,
        ModelQuantization::Q4,
        ModelQuantization::Q3,
        ModelQuantization::Q2,
        ModelQuantization::Gptq,
        ModelQuantization::Awq,
    ];

    /// Memory multiplier relative to one byte per parameter (Q8 = 1.0).
    pub fn factor(&self) -> f64 {
        match self {
            ModelQuantization::F32 => 4.0,
            ModelQuantization::F16 => 2.0,
            ModelQuantization::Q8 => 1.0,
            ModelQuantization::Q6 => 0.75,
            ModelQuantization::Q5 => 0.625,
            ModelQuantization::Q4 => 0.5,
            ModelQuantization::Q3 => 0.375,
            ModelQuantization::Q2 => 0.25,
            ModelQuantization::Gptq => 0.4,
            ModelQuantization::Awq => 0.35,
        }
    }

    /// Storage width used for the on-disk estimate. GPTQ and AWQ pack
    /// 4-bit weights even though their in-memory factor differs.
    pub fn bits_per_param(&self) -> u32 {
        match self {
            ModelQuantization::F32 => 32,
            ModelQuantization::F16 => 16,
            ModelQuantization::Q8 => 8,
            ModelQuantization::Q6 => 6,
            ModelQuantization::Q5 => 5,
            ModelQuantization::Q4 => 4,
            ModelQuantization::Q3 => 3,
            ModelQuantization::Q2 => 2,
            ModelQuantization::Gptq => 4,
            ModelQuantization::Awq => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelQuantization::F32 => "F32",
            ModelQuantization::F16 => "F16",
            ModelQuantization::Q8 => "Q8",
            ModelQuantization::Q6 => "Q6",
            ModelQuantization::Q5 => "Q5",
            ModelQuantization::Q4 => "Q4",
            ModelQuantization::Q3 => "Q3",
            ModelQuantization::Q2 => "Q2",
            ModelQuantization::Gptq => "GPTQ",
            ModelQuantization::Awq => "AWQ",
        }
    }

    pub fn next(&self) -> Self {
        cycle(Self::ALL, *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(Self::ALL, *self, -1)
    }
}

impl fmt::Display for ModelQuantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelQuantization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // llama.cpp file-name spellings map onto the nearest plain format
        match s.trim().to_uppercase().as_str() {
            "F32" | "FP32" => Ok(ModelQuantization::F32),
            "F16" | "FP16" | "BF16" => Ok(ModelQuantization::F16),
            "Q8" | "Q8_0" => Ok(ModelQuantization::Q8),
            "Q6" | "Q6_K" => Ok(ModelQuantization::Q6),
            "Q5" | "Q5_K_M" | "Q5_0" => Ok(ModelQuantization::Q5),
            "Q4" | "Q4_K_M" | "Q4_0" => Ok(ModelQuantization::Q4),
            "Q3" | "Q3_K_M" => Ok(ModelQuantization::Q3),
            "Q2" | "Q2_K" => Ok(ModelQuantization::Q2),
            "GPTQ" => Ok(ModelQuantization::Gptq),
            "AWQ" => Ok(ModelQuantization::Awq),
            _ => Err(ConfigError::UnknownModelQuantization(s.to_string())),
        }
    }
}

/// KV cache element formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KvCacheQuantization {
    F32,
    F16,
    Q8,
    Q5,
    Q4,
}

impl KvCacheQuantization {
    pub const ALL: &'static [KvCacheQuantization] = &[
        KvCacheQuantization::F32,
        KvCacheQuantization::F16,
        KvCacheQuantization::Q8,
        KvCacheQuantization::Q5,
        KvCacheQuantization::Q4,
    ];

    pub fn factor(&self) -> f64 {
        match self {
            KvCacheQuantization::F32 => 4.0,
            KvCacheQuantization::F16 => 2.0,
            KvCacheQuantization::Q8 => 1.0,
            KvCacheQuantization::Q5 => 0.625,
            KvCacheQuantization::Q4 => 0.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KvCacheQuantization::F32 => "F32",
            KvCacheQuantization::F16 => "F16",
            KvCacheQuantization::Q8 => "Q8",
            KvCacheQuantization::Q5 => "Q5",
            KvCacheQuantization::Q4 => "Q4",
        }
    }

    pub fn next(&self) -> Self {
        cycle(Self::ALL, *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(Self::ALL, *self, -1)
    }
}

impl fmt::Display for KvCacheQuantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for KvCacheQuantization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "F32" | "FP32" => Ok(KvCacheQuantization::F32),
            "F16" | "FP16" | "BF16" => Ok(KvCacheQuantization::F16),
            "Q8" | "Q8_0" => Ok(KvCacheQuantization::Q8),
            "Q5" | "Q5_0" | "Q5_1" => Ok(KvCacheQuantization::Q5),
            "Q4" | "Q4_0" | "Q4_1" => Ok(KvCacheQuantization::Q4),
            _ => Err(ConfigError::UnknownKvCacheQuantization(s.to_string())),
        }
    }
}

/// Free-function forms of the lookup tables.
pub fn model_quantization_factor(format: ModelQuantization) -> f64 {
    format.factor()
}

pub fn kv_cache_quantization_factor(format: KvCacheQuantization) -> f64 {
    format.factor()
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: isize) -> T {
    let len = all.len() as isize;
    let idx = all.iter().position(|q| *q == current).unwrap_or(0) as isize;
    all[(idx + step).rem_euclid(len) as usize]
}
