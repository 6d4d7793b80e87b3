use vramcalc_core::config::{
    CONTEXT_MAX, CONTEXT_MIN, CONTEXT_STEP, GPU_MEMORY_OPTIONS_GB, PARAMS_MAX_B, PARAMS_MIN_B,
    SYSTEM_MEMORY_MAX_GB, SYSTEM_MEMORY_MIN_GB, SYSTEM_MEMORY_STEP_GB,
};
use vramcalc_core::{Configuration, DeploymentMode, EstimateReport};

/// Form rows, in on-screen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Params,
    ModelQuant,
    Context,
    KvCache,
    KvQuant,
    Mode,
    GpuMemory,
    SystemMemory,
}

impl Field {
    pub const ALL: &'static [Field] = &[
        Field::Params,
        Field::ModelQuant,
        Field::Context,
        Field::KvCache,
        Field::KvQuant,
        Field::Mode,
        Field::GpuMemory,
        Field::SystemMemory,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Params => "Parameters",
            Field::ModelQuant => "Model quantization",
            Field::Context => "Context length",
            Field::KvCache => "KV cache",
            Field::KvQuant => "KV cache quantization",
            Field::Mode => "System type",
            Field::GpuMemory => "GPU VRAM",
            Field::SystemMemory => "System memory",
        }
    }

    /// Whether the field affects the estimate under this configuration.
    pub fn is_active(&self, config: &Configuration) -> bool {
        match self {
            Field::KvQuant => config.use_kv_cache,
            Field::GpuMemory => config.deployment_mode == DeploymentMode::DiscreteGpu,
            _ => true,
        }
    }

    pub fn value_text(&self, config: &Configuration) -> String {
        match self {
            Field::Params => format!("{}B", config.params_billions),
            Field::ModelQuant => config.model_quantization.label().to_string(),
            Field::Context => format!("{} tokens", config.context_length),
            Field::KvCache => (if config.use_kv_cache { "on" } else { "off" }).to_string(),
            Field::KvQuant => config.kv_cache_quantization.label().to_string(),
            Field::Mode => config.deployment_mode.label().to_string(),
            Field::GpuMemory => format!("{} GB", config.gpu_memory_gb),
            Field::SystemMemory => format!("{} GB", config.system_memory_gb),
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub config: Configuration,
    pub report: EstimateReport,
    pub selected: Field,
    /// Configuration the session started from; `r` returns here.
    initial: Configuration,
}

impl App {
    pub fn new(config: Configuration) -> Self {
        App {
            should_quit: false,
            config,
            report: EstimateReport::build(&config),
            selected: Field::Params,
            initial: config,
        }
    }

    fn recompute(&mut self) {
        self.report = EstimateReport::build(&self.config);
        if !self.selected.is_active(&self.config) {
            self.move_down();
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.step_selection(-1);
    }

    pub fn move_down(&mut self) {
        self.selected = self.step_selection(1);
    }

    /// Next active field in `direction`, wrapping. Params and the other
    /// always-active rows guarantee this terminates.
    fn step_selection(&self, direction: isize) -> Field {
        let len = Field::ALL.len() as isize;
        let mut idx = Field::ALL
            .iter()
            .position(|f| *f == self.selected)
            .unwrap_or(0) as isize;
        loop {
            idx = (idx + direction).rem_euclid(len);
            let field = Field::ALL[idx as usize];
            if field.is_active(&self.config) {
                return field;
            }
        }
    }

    pub fn increase(&mut self) {
        self.adjust(1);
    }

    pub fn decrease(&mut self) {
        self.adjust(-1);
    }

    pub fn page_up(&mut self) {
        self.adjust(10);
    }

    pub fn page_down(&mut self) {
        self.adjust(-10);
    }

    /// Move the selected field `steps` input steps. Numeric fields clamp at
    /// their range ends; choice fields cycle one entry per call.
    pub fn adjust(&mut self, steps: i64) {
        if steps == 0 {
            return;
        }
        let c = &mut self.config;
        match self.selected {
            Field::Params => {
                c.params_billions =
                    (c.params_billions.round() + steps as f64).clamp(PARAMS_MIN_B, PARAMS_MAX_B);
            }
            Field::ModelQuant => {
                c.model_quantization = if steps > 0 {
                    c.model_quantization.next()
                } else {
                    c.model_quantization.prev()
                };
            }
            Field::Context => {
                let step = CONTEXT_STEP as i64;
                let snapped = (c.context_length as i64 / step) * step;
                c.context_length =
                    (snapped + steps * step).clamp(CONTEXT_MIN as i64, CONTEXT_MAX as i64) as u32;
            }
            Field::KvCache => c.use_kv_cache = !c.use_kv_cache,
            Field::KvQuant => {
                c.kv_cache_quantization = if steps > 0 {
                    c.kv_cache_quantization.next()
                } else {
                    c.kv_cache_quantization.prev()
                };
            }
            Field::Mode => c.deployment_mode = c.deployment_mode.toggle(),
            Field::GpuMemory => {
                let current = nearest_gpu_option(c.gpu_memory_gb) as i64;
                let last = GPU_MEMORY_OPTIONS_GB.len() as i64 - 1;
                let idx = (current + steps).clamp(0, last) as usize;
                c.gpu_memory_gb = GPU_MEMORY_OPTIONS_GB[idx];
            }
            Field::SystemMemory => {
                let snapped =
                    (c.system_memory_gb / SYSTEM_MEMORY_STEP_GB).round() * SYSTEM_MEMORY_STEP_GB;
                c.system_memory_gb = (snapped + steps as f64 * SYSTEM_MEMORY_STEP_GB)
                    .clamp(SYSTEM_MEMORY_MIN_GB, SYSTEM_MEMORY_MAX_GB);
            }
        }
        self.recompute();
    }

    /// Space: flip toggles, advance choices.
    pub fn toggle(&mut self) {
        match self.selected {
            Field::KvCache | Field::Mode | Field::ModelQuant | Field::KvQuant => self.adjust(1),
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        self.config = self.initial;
        self.recompute();
    }
}

fn nearest_gpu_option(gb: f64) -> usize {
    GPU_MEMORY_OPTIONS_GB
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - gb)
                .abs()
                .partial_cmp(&(*b - gb).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
