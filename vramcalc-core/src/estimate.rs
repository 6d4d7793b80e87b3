use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::{Configuration, DeploymentMode};
use crate::quant::{kv_cache_quantization_factor, model_quantization_factor};

/// Context windows up to this many tokens carry no scaling penalty.
pub const REFERENCE_CONTEXT: f64 = 2048.0;
/// KV cache cost as a fraction of model size, per unit of context scale.
pub const KV_CACHE_OVERHEAD: f64 = 0.2;
/// Share of system RAM addressable by the GPU on unified memory machines.
pub const UNIFIED_MEMORY_FRACTION: f64 = 0.75;
/// File format and metadata overhead on top of raw weights.
pub const DISK_OVERHEAD: f64 = 1.1;

pub const UNIFIED_FITS_LABEL: &str = "Unified memory (ex: Apple silicon, AMD Ryzen™ AI Max+ 395)";
pub const UNIFIED_INSUFFICIENT_LABEL: &str = "Unified memory (insufficient)";

/// Hardware needed for a configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Recommendation {
    pub gpu_type: String,
    /// Required VRAM rounded to one decimal, for display.
    pub vram_needed_gb: f64,
    /// Only meaningful in unified memory mode; always false for discrete GPUs.
    pub fits_unified_memory: bool,
    pub system_ram_needed_gb: f64,
    /// Zero means the model cannot run on this machine.
    pub gpus_required: u32,
}

impl Recommendation {
    pub fn is_feasible(&self) -> bool {
        self.gpus_required > 0
    }
}

/// How full the memory pool is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationClass {
    Low,
    Medium,
    High,
    Extreme,
}

impl UtilizationClass {
    pub fn label(&self) -> &'static str {
        match self {
            UtilizationClass::Low => "low",
            UtilizationClass::Medium => "medium",
            UtilizationClass::High => "high",
            UtilizationClass::Extreme => "extreme",
        }
    }
}

/// Coarse size bucket of a configuration. Cosmetic: front ends use it to
/// pick an accent colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Tiny,
    Small,
    Medium,
    Large,
    XLarge,
    Massive,
}

impl ComplexityTier {
    pub fn label(&self) -> &'static str {
        match self {
            ComplexityTier::Tiny => "tiny",
            ComplexityTier::Small => "small",
            ComplexityTier::Medium => "medium",
            ComplexityTier::Large => "large",
            ComplexityTier::XLarge => "xlarge",
            ComplexityTier::Massive => "massive",
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score <= 15.0 {
            ComplexityTier::Tiny
        } else if score <= 32.0 {
            ComplexityTier::Small
        } else if score <= 70.0 {
            ComplexityTier::Medium
        } else if score <= 200.0 {
            ComplexityTier::Large
        } else if score <= 500.0 {
            ComplexityTier::XLarge
        } else {
            ComplexityTier::Massive
        }
    }
}

/// `max(1, context / 2048)`: short windows are free, longer ones scale linearly.
pub fn context_scale(context_length: u32) -> f64 {
    (context_length as f64 / REFERENCE_CONTEXT).max(1.0)
}

/// KV cache share of the VRAM estimate, zero when the cache is disabled.
pub fn kv_cache_memory_gb(config: &Configuration) -> f64 {
    if !config.use_kv_cache {
        return 0.0;
    }
    config.params_billions
        * kv_cache_quantization_factor(config.kv_cache_quantization)
        * context_scale(config.context_length)
        * KV_CACHE_OVERHEAD
}

/// Estimated GPU memory in GB. One billion parameters at Q8 counts as 1 GB.
pub fn required_vram_gb(config: &Configuration) -> f64 {
    let base_model_mem = config.params_billions * model_quantization_factor(config.model_quantization);
    let model_mem = base_model_mem * context_scale(config.context_length);
    model_mem + kv_cache_memory_gb(config)
}

pub fn max_usable_unified_memory_gb(system_memory_gb: f64) -> f64 {
    system_memory_gb * UNIFIED_MEMORY_FRACTION
}

pub fn hardware_recommendation(config: &Configuration) -> Recommendation {
    let required_vram = required_vram_gb(config);
    let vram_needed_gb = round1(required_vram);
    let system_memory = config.system_memory_gb;

    match config.deployment_mode {
        DeploymentMode::UnifiedMemory => {
            let unified_limit = max_usable_unified_memory_gb(system_memory);
            if required_vram <= unified_limit {
                Recommendation {
                    gpu_type: UNIFIED_FITS_LABEL.to_string(),
                    vram_needed_gb,
                    fits_unified_memory: true,
                    system_ram_needed_gb: system_memory,
                    gpus_required: 1,
                }
            } else {
                Recommendation {
                    gpu_type: UNIFIED_INSUFFICIENT_LABEL.to_string(),
                    vram_needed_gb,
                    fits_unified_memory: false,
                    system_ram_needed_gb: system_memory,
                    gpus_required: 0,
                }
            }
        }
        DeploymentMode::DiscreteGpu => {
            let single_gpu = config.gpu_memory_gb;
            // Weights are staged through host RAM, so it must hold them too
            let system_ram_needed_gb = system_memory.max(required_vram);
            if required_vram <= single_gpu {
                Recommendation {
                    gpu_type: format!("Single {}GB GPU", single_gpu),
                    vram_needed_gb,
                    fits_unified_memory: false,
                    system_ram_needed_gb,
                    gpus_required: 1,
                }
            } else {
                Recommendation {
                    gpu_type: format!("Discrete GPUs ({}GB each)", single_gpu),
                    vram_needed_gb,
                    fits_unified_memory: false,
                    system_ram_needed_gb,
                    gpus_required: (required_vram / single_gpu).ceil() as u32,
                }
            }
        }
    }
}

/// Model file size in GB, with 10% format overhead.
pub fn on_disk_size_gb(config: &Configuration) -> f64 {
    let bits_per_param = config.model_quantization.bits_per_param() as f64;
    let total_bits = config.params_billions * 1e9 * bits_per_param;
    let gigabytes = total_bits / 8.0 / 1e9;
    gigabytes * DISK_OVERHEAD
}

pub fn utilization_class(utilization_pct: f64) -> UtilizationClass {
    if utilization_pct < 50.0 {
        UtilizationClass::Low
    } else if utilization_pct < 75.0 {
        UtilizationClass::Medium
    } else if utilization_pct < 90.0 {
        UtilizationClass::High
    } else {
        UtilizationClass::Extreme
    }
}

pub fn complexity_score(config: &Configuration) -> f64 {
    let kv_multiplier = if config.use_kv_cache {
        1.0 + KV_CACHE_OVERHEAD * kv_cache_quantization_factor(config.kv_cache_quantization)
    } else {
        1.0
    };
    config.params_billions
        * (model_quantization_factor(config.model_quantization) / 4.0)
        * context_scale(config.context_length)
        * kv_multiplier
}

pub fn complexity_tier(config: &Configuration) -> ComplexityTier {
    ComplexityTier::from_score(complexity_score(config))
}

/// Round to `dp` decimal places, taking the exact binary value of `v` and
/// sending true midpoints away from zero (`Number.toFixed` semantics).
/// Non-finite and out-of-range values come back unchanged.
pub fn round_half_up(v: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(v)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse().ok())
        .unwrap_or(v)
}

pub(crate) fn round1(v: f64) -> f64 {
    round_half_up(v, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quant::{KvCacheQuantization, ModelQuantization};
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    // ────────────────────────────────────────────────────────────────────
    // Helpers
    // ────────────────────────────────────────────────────────────────────

    fn reference_config() -> Configuration {
        Configuration {
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

    fn small_config(params: f64, quant: ModelQuantization) -> Configuration {
        Configuration {
            params_billions: params,
            model_quantization: quant,
            use_kv_cache: false,
            context_length: 2048,
            ..reference_config()
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // required_vram_gb
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_required_vram_reference_example() {
        // 65 * 0.5 * 2 + 65 * 2.0 * 2 * 0.2 = 65 + 52
        assert!(approx(required_vram_gb(&reference_config()), 117.0));
        assert!(approx(kv_cache_memory_gb(&reference_config()), 52.0));
    }

    #[test]
    fn test_required_vram_without_kv_cache() {
        let config = small_config(7.0, ModelQuantization::Q8);
        assert!(approx(required_vram_gb(&config), 7.0));
        assert_eq!(kv_cache_memory_gb(&config), 0.0);
    }

    #[test]
    fn test_kv_format_ignored_when_cache_disabled() {
        let mut a = small_config(13.0, ModelQuantization::Q5);
        let mut b = a;
        a.kv_cache_quantization = KvCacheQuantization::F32;
        b.kv_cache_quantization = KvCacheQuantization::Q4;
        assert_eq!(required_vram_gb(&a), required_vram_gb(&b));
    }

    #[test]
    fn test_short_context_has_no_penalty() {
        let base = reference_config();
        let at_ref = required_vram_gb(&Configuration {
            context_length: 2048,
            ..base
        });
        for ctx in [128, 512, 1024, 1920, 2048] {
            let vram = required_vram_gb(&Configuration {
                context_length: ctx,
                ..base
            });
            assert_eq!(vram, at_ref, "ctx {}", ctx);
        }
        assert_eq!(context_scale(128), 1.0);
        assert_eq!(context_scale(8192), 4.0);
    }

    // ────────────────────────────────────────────────────────────────────
    // hardware_recommendation
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_recommendation_discrete_multi_gpu() {
        let rec = hardware_recommendation(&reference_config());
        assert_eq!(rec.gpus_required, 5);
        assert_eq!(rec.gpu_type, "Discrete GPUs (24GB each)");
        assert_eq!(rec.vram_needed_gb, 117.0);
        assert_eq!(rec.system_ram_needed_gb, 128.0);
        assert!(!rec.fits_unified_memory);
    }

    #[test]
    fn test_recommendation_discrete_single_gpu() {
        let config = Configuration {
            gpu_memory_gb: 8.0,
            ..small_config(7.0, ModelQuantization::Q8)
        };
        let rec = hardware_recommendation(&config);
        assert_eq!(rec.gpus_required, 1);
        assert_eq!(rec.gpu_type, "Single 8GB GPU");
        assert!(rec.is_feasible());
    }

    #[test]
    fn test_recommendation_exact_fit_is_single_gpu() {
        // 24 * 1.0 = 24 GB on a 24 GB card
        let config = small_config(24.0, ModelQuantization::Q8);
        let rec = hardware_recommendation(&config);
        assert_eq!(rec.gpus_required, 1);
    }

    #[test]
    fn test_recommendation_raises_system_ram_to_vram() {
        let config = Configuration {
            system_memory_gb: 64.0,
            ..reference_config()
        };
        let rec = hardware_recommendation(&config);
        assert_eq!(rec.system_ram_needed_gb, 117.0);
    }

    #[test]
    fn test_recommendation_unified_insufficient() {
        let config = Configuration {
            deployment_mode: DeploymentMode::UnifiedMemory,
            ..reference_config()
        };
        let rec = hardware_recommendation(&config);
        assert!(!rec.fits_unified_memory);
        assert_eq!(rec.gpus_required, 0);
        assert_eq!(rec.gpu_type, UNIFIED_INSUFFICIENT_LABEL);
        assert_eq!(rec.system_ram_needed_gb, 128.0);
        assert!(!rec.is_feasible());
    }

    #[test]
    fn test_recommendation_unified_fits() {
        let config = Configuration {
            deployment_mode: DeploymentMode::UnifiedMemory,
            system_memory_gb: 192.0, // limit 144 >= 117
            ..reference_config()
        };
        let rec = hardware_recommendation(&config);
        assert!(rec.fits_unified_memory);
        assert_eq!(rec.gpus_required, 1);
        assert_eq!(rec.gpu_type, UNIFIED_FITS_LABEL);
        assert_eq!(rec.system_ram_needed_gb, 192.0);
    }

    #[test]
    fn test_vram_needed_is_rounded_but_comparison_is_not() {
        // 24.04 GB needed: rounds to 24.0 for display but still overflows a 24 GB card
        let config = small_config(24.04, ModelQuantization::Q8);
        let rec = hardware_recommendation(&config);
        assert_eq!(rec.vram_needed_gb, 24.0);
        assert_eq!(rec.gpus_required, 2);
    }

    #[test]
    fn test_round_half_up_uses_exact_value() {
        // 6.05 is stored as 6.04999..., so it rounds down
        assert_eq!(round1(6.05), 6.0);
        // 0.25 is exact: a true midpoint goes up, not to even
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(117.0), 117.0);
        assert_eq!(round_half_up(1.005, 2), 1.0);
        assert_eq!(round_half_up(1.125, 2), 1.13);
        assert!(round1(f64::NAN).is_nan());
        assert_eq!(round1(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_vram_needed_rounds_like_the_results_screen() {
        // 5.5 + 0.55 lands on the f64 nearest 6.05, which sits below the midpoint
        let config = Configuration {
            params_billions: 1.0,
            model_quantization: ModelQuantization::F32,
            kv_cache_quantization: KvCacheQuantization::F16,
            context_length: 2816,
            ..reference_config()
        };
        let required = required_vram_gb(&config);
        assert_eq!(required, 6.05);
        assert_eq!(hardware_recommendation(&config).vram_needed_gb, 6.0);
    }

    #[test]
    fn test_unified_limit() {
        assert_eq!(max_usable_unified_memory_gb(128.0), 96.0);
        assert_eq!(max_usable_unified_memory_gb(8.0), 6.0);
    }

    // ────────────────────────────────────────────────────────────────────
    // on_disk_size_gb
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_on_disk_size() {
        // 7B at 8 bits = 7 GB, plus 10%
        let config = small_config(7.0, ModelQuantization::Q8);
        assert!((on_disk_size_gb(&config) - 7.7).abs() < 1e-6);

        let config = small_config(70.0, ModelQuantization::Q4);
        assert!((on_disk_size_gb(&config) - 38.5).abs() < 1e-6);
    }

    #[test]
    fn test_on_disk_size_ignores_context_and_kv() {
        let a = small_config(13.0, ModelQuantization::Q6);
        let b = Configuration {
            context_length: 32768,
            use_kv_cache: true,
            ..a
        };
        assert_eq!(on_disk_size_gb(&a), on_disk_size_gb(&b));
    }

    #[test]
    fn test_on_disk_size_ordered_by_bit_width() {
        use ModelQuantization::*;
        let size = |q| on_disk_size_gb(&small_config(30.0, q));
        assert!(size(Q2) < size(Q3));
        assert!(size(Q3) < size(Q4));
        assert_eq!(size(Q4), size(Gptq));
        assert_eq!(size(Gptq), size(Awq));
        assert!(size(Awq) < size(Q5));
        assert!(size(Q5) < size(Q6));
        assert!(size(Q6) < size(Q8));
        assert!(size(Q8) < size(F16));
        assert!(size(F16) < size(F32));
    }

    // ────────────────────────────────────────────────────────────────────
    // Classification
    // ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_utilization_class_thresholds() {
        assert_eq!(utilization_class(0.0), UtilizationClass::Low);
        assert_eq!(utilization_class(49.9), UtilizationClass::Low);
        assert_eq!(utilization_class(50.0), UtilizationClass::Medium);
        assert_eq!(utilization_class(74.9), UtilizationClass::Medium);
        assert_eq!(utilization_class(75.0), UtilizationClass::High);
        assert_eq!(utilization_class(89.9), UtilizationClass::High);
        assert_eq!(utilization_class(90.0), UtilizationClass::Extreme);
        assert_eq!(utilization_class(487.5), UtilizationClass::Extreme);
    }

    #[test]
    fn test_complexity_tier() {
        // 65 * 0.125 * 2 * 1.4 = 22.75
        assert!((complexity_score(&reference_config()) - 22.75).abs() < EPS);
        assert_eq!(complexity_tier(&reference_config()), ComplexityTier::Small);

        let tiny = small_config(7.0, ModelQuantization::Q4);
        assert_eq!(complexity_tier(&tiny), ComplexityTier::Tiny);

        let massive = Configuration {
            params_billions: 1000.0,
            model_quantization: ModelQuantization::F32,
            context_length: 32768,
            ..reference_config()
        };
        assert_eq!(complexity_tier(&massive), ComplexityTier::Massive);
    }

    #[test]
    fn test_complexity_tier_boundaries() {
        assert_eq!(ComplexityTier::from_score(15.0), ComplexityTier::Tiny);
        assert_eq!(ComplexityTier::from_score(15.1), ComplexityTier::Small);
        assert_eq!(ComplexityTier::from_score(32.0), ComplexityTier::Small);
        assert_eq!(ComplexityTier::from_score(70.0), ComplexityTier::Medium);
        assert_eq!(ComplexityTier::from_score(200.0), ComplexityTier::Large);
        assert_eq!(ComplexityTier::from_score(500.0), ComplexityTier::XLarge);
        assert_eq!(ComplexityTier::from_score(500.1), ComplexityTier::Massive);
    }

    // ────────────────────────────────────────────────────────────────────
    // Properties
    // ────────────────────────────────────────────────────────────────────

    fn any_model_quant() -> impl Strategy<Value = ModelQuantization> {
        prop::sample::select(ModelQuantization::ALL.to_vec())
    }

    fn any_kv_quant() -> impl Strategy<Value = KvCacheQuantization> {
        prop::sample::select(KvCacheQuantization::ALL.to_vec())
    }

    prop_compose! {
        fn any_config()(
            params in 1.0f64..1000.0,
            model_quantization in any_model_quant(),
            use_kv_cache in any::<bool>(),
            kv_cache_quantization in any_kv_quant(),
            ctx_steps in 1u32..=256,
            unified in any::<bool>(),
            mem_steps in 1u32..=64,
            gpu in prop::sample::select(crate::config::GPU_MEMORY_OPTIONS_GB.to_vec()),
        ) -> Configuration {
            Configuration {
                params_billions: params,
                model_quantization,
                use_kv_cache,
                kv_cache_quantization,
                context_length: ctx_steps * 128,
                deployment_mode: if unified {
                    DeploymentMode::UnifiedMemory
                } else {
                    DeploymentMode::DiscreteGpu
                },
                system_memory_gb: mem_steps as f64 * 8.0,
                gpu_memory_gb: gpu,
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_vram_strictly_increasing_in_params(config in any_config(), extra in 0.5f64..100.0) {
            let bigger = Configuration { params_billions: config.params_billions + extra, ..config };
            prop_assert!(required_vram_gb(&bigger) > required_vram_gb(&config));
        }

        #[test]
        fn prop_disk_non_decreasing_in_params(config in any_config(), extra in 0.0f64..100.0) {
            let bigger = Configuration { params_billions: config.params_billions + extra, ..config };
            prop_assert!(on_disk_size_gb(&bigger) >= on_disk_size_gb(&config));
        }

        #[test]
        fn prop_context_floor(config in any_config(), ctx_steps in 1u32..=16) {
            let short = Configuration { context_length: ctx_steps * 128, ..config };
            let reference = Configuration { context_length: 2048, ..config };
            prop_assert_eq!(required_vram_gb(&short), required_vram_gb(&reference));
        }

        #[test]
        fn prop_discrete_gpu_count(config in any_config()) {
            let config = Configuration { deployment_mode: DeploymentMode::DiscreteGpu, ..config };
            let required = required_vram_gb(&config);
            let rec = hardware_recommendation(&config);
            if required > config.gpu_memory_gb {
                prop_assert_eq!(rec.gpus_required, (required / config.gpu_memory_gb).ceil() as u32);
                prop_assert!(rec.gpus_required >= 2);
            } else {
                prop_assert_eq!(rec.gpus_required, 1);
            }
            prop_assert!(rec.system_ram_needed_gb >= config.system_memory_gb);
        }

        #[test]
        fn prop_unified_fit(config in any_config()) {
            let config = Configuration { deployment_mode: DeploymentMode::UnifiedMemory, ..config };
            let rec = hardware_recommendation(&config);
            let fits = required_vram_gb(&config) <= config.system_memory_gb * 0.75;
            prop_assert_eq!(rec.fits_unified_memory, fits);
            prop_assert_eq!(rec.gpus_required, if fits { 1 } else { 0 });
        }

        #[test]
        fn prop_idempotent(config in any_config()) {
            prop_assert_eq!(required_vram_gb(&config).to_bits(), required_vram_gb(&config).to_bits());
            prop_assert_eq!(on_disk_size_gb(&config).to_bits(), on_disk_size_gb(&config).to_bits());
            prop_assert_eq!(hardware_recommendation(&config), hardware_recommendation(&config));
        }
    }
}
