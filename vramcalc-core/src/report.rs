use serde::Serialize;

use crate::config::{Configuration, DeploymentMode};
use crate::estimate::{
    self, ComplexityTier, Recommendation, UtilizationClass, hardware_recommendation,
    kv_cache_memory_gb, max_usable_unified_memory_gb, on_disk_size_gb, required_vram_gb,
};

/// Everything the results screen shows for one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub config: Configuration,
    pub required_vram_gb: f64,
    pub kv_cache_gb: f64,
    pub recommendation: Recommendation,
    pub on_disk_size_gb: f64,
    /// GPU memory in discrete mode, the usable unified pool otherwise.
    pub available_memory_gb: f64,
    /// Rounded VRAM figure over the available pool, not capped.
    pub utilization_pct: f64,
    pub utilization_class: UtilizationClass,
    pub complexity_tier: ComplexityTier,
    pub notes: Vec<String>,
}

impl EstimateReport {
    pub fn build(config: &Configuration) -> Self {
        let required_vram = required_vram_gb(config);
        let kv_cache_gb = kv_cache_memory_gb(config);
        let recommendation = hardware_recommendation(config);
        let on_disk = on_disk_size_gb(config);
        let available = available_memory_gb(config);

        // Percent is taken from the displayed (rounded) figure so the bar
        // agrees with the number printed next to it
        let utilization_pct = if available > 0.0 {
            recommendation.vram_needed_gb / available * 100.0
        } else {
            f64::INFINITY
        };
        let utilization_class = estimate::utilization_class(utilization_pct);

        let mut notes = Vec::new();
        match config.deployment_mode {
            DeploymentMode::UnifiedMemory => {
                if recommendation.fits_unified_memory {
                    notes.push("Model fits in unified memory".to_string());
                } else {
                    notes.push("Model exceeds unified memory capacity".to_string());
                    notes.push(format!(
                        "Need {:.1} GB but only {:.1} GB of {:.0} GB is GPU-addressable",
                        required_vram, available, config.system_memory_gb
                    ));
                }
            }
            DeploymentMode::DiscreteGpu => {
                if recommendation.gpus_required > 1 {
                    notes.push(format!(
                        "Model sharded across {} x {}GB GPUs",
                        recommendation.gpus_required, config.gpu_memory_gb
                    ));
                } else {
                    notes.push("Model fits on a single GPU".to_string());
                }
                if recommendation.system_ram_needed_gb > config.system_memory_gb {
                    notes.push(format!(
                        "System RAM raised to {:.1} GB to stage the weights",
                        recommendation.system_ram_needed_gb
                    ));
                }
            }
        }
        if kv_cache_gb > 0.0 {
            notes.push(format!(
                "KV cache ({}): {:.1} GB of the VRAM estimate",
                config.kv_cache_quantization, kv_cache_gb
            ));
        }

        let report = EstimateReport {
            config: *config,
            required_vram_gb: required_vram,
            kv_cache_gb,
            recommendation,
            on_disk_size_gb: on_disk,
            available_memory_gb: available,
            utilization_pct,
            utilization_class,
            complexity_tier: estimate::complexity_tier(config),
            notes,
        };
        tracing::debug!(
            required_vram_gb = report.required_vram_gb,
            gpus = report.recommendation.gpus_required,
            utilization = report.utilization_class.label(),
            "built estimate report"
        );
        report
    }

    /// Bar fill for gauges, always within 0.0..=1.0 (NaN reads as empty).
    pub fn utilization_ratio(&self) -> f64 {
        if self.utilization_pct.is_nan() {
            return 0.0;
        }
        (self.utilization_pct / 100.0).clamp(0.0, 1.0)
    }

    /// GPU label with a multiplier suffix when sharding.
    pub fn gpu_configuration(&self) -> String {
        if self.recommendation.gpus_required > 1 {
            format!(
                "{} ({}x)",
                self.recommendation.gpu_type, self.recommendation.gpus_required
            )
        } else {
            self.recommendation.gpu_type.clone()
        }
    }
}

/// The memory ceiling utilization is measured against.
pub fn available_memory_gb(config: &Configuration) -> f64 {
    match config.deployment_mode {
        DeploymentMode::DiscreteGpu => config.gpu_memory_gb,
        DeploymentMode::UnifiedMemory => max_usable_unified_memory_gb(config.system_memory_gb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quant::{KvCacheQuantization, ModelQuantization};

    #[test]
    fn test_report_reference_discrete() {
        let report = EstimateReport::build(&Configuration::default());
        assert_eq!(report.recommendation.gpus_required, 5);
        assert_eq!(report.available_memory_gb, 24.0);
        assert!((report.utilization_pct - 487.5).abs() < 1e-9);
        assert_eq!(report.utilization_class, UtilizationClass::Extreme);
        assert_eq!(report.utilization_ratio(), 1.0);
        assert_eq!(report.gpu_configuration(), "Discrete GPUs (24GB each) (5x)");
        assert!(report.notes.iter().any(|n| n.contains("sharded across 5")));
        assert!(report.notes.iter().any(|n| n.contains("KV cache (F16)")));
    }

    #[test]
    fn test_report_reference_unified() {
        let config = Configuration {
            deployment_mode: DeploymentMode::UnifiedMemory,
            ..Default::default()
        };
        let report = EstimateReport::build(&config);
        assert_eq!(report.available_memory_gb, 96.0);
        assert!(!report.recommendation.fits_unified_memory);
        assert_eq!(report.gpu_configuration(), "Unified memory (insufficient)");
        assert!(
            report
                .notes
                .iter()
                .any(|n| n.contains("exceeds unified memory"))
        );
    }

    #[test]
    fn test_utilization_uses_rounded_vram() {
        // 7.04 GB rounds to 7.0; 7.0 / 8 = 87.5%
        let config = Configuration {
            params_billions: 7.04,
            model_quantization: ModelQuantization::Q8,
            use_kv_cache: false,
            context_length: 2048,
            gpu_memory_gb: 8.0,
            ..Default::default()
        };
        let report = EstimateReport::build(&config);
        assert_eq!(report.recommendation.vram_needed_gb, 7.0);
        assert!((report.utilization_pct - 87.5).abs() < 1e-9);
        assert_eq!(report.utilization_class, UtilizationClass::High);
        assert_eq!(report.gpu_configuration(), "Single 8GB GPU");
    }

    #[test]
    fn test_class_follows_exactly_rounded_vram() {
        // 14.35 is stored just below the midpoint: 14.3 GB of 16 is "high"
        let config = Configuration {
            params_billions: 1.0,
            model_quantization: ModelQuantization::F32,
            kv_cache_quantization: KvCacheQuantization::Q4,
            context_length: 7168,
            gpu_memory_gb: 16.0,
            ..Default::default()
        };
        let report = EstimateReport::build(&config);
        assert_eq!(report.recommendation.vram_needed_gb, 14.3);
        assert_eq!(report.utilization_class, UtilizationClass::High);
    }

    #[test]
    fn test_utilization_ratio_stays_in_unit_range() {
        let mut report = EstimateReport::build(&Configuration::default());
        report.utilization_pct = f64::NAN;
        assert_eq!(report.utilization_ratio(), 0.0);
        report.utilization_pct = f64::INFINITY;
        assert_eq!(report.utilization_ratio(), 1.0);
        report.utilization_pct = -5.0;
        assert_eq!(report.utilization_ratio(), 0.0);

        let report = EstimateReport::build(&Configuration {
            params_billions: f64::NAN,
            ..Default::default()
        });
        assert_eq!(report.utilization_ratio(), 0.0);
    }

    #[test]
    fn test_system_ram_note_only_when_raised() {
        let config = Configuration {
            system_memory_gb: 64.0,
            ..Default::default()
        };
        let report = EstimateReport::build(&config);
        assert!(report.notes.iter().any(|n| n.contains("System RAM raised")));

        let report = EstimateReport::build(&Configuration::default());
        assert!(!report.notes.iter().any(|n| n.contains("System RAM raised")));
    }

    #[test]
    fn test_report_serializes() {
        let report = EstimateReport::build(&Configuration::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recommendation"]["gpus_required"], 5);
        assert_eq!(json["utilization_class"], "extreme");
        assert_eq!(json["config"]["deployment_mode"], "DISCRETE_GPU");
        assert_eq!(json["complexity_tier"], "small");
    }
}
