mod display;
mod tui_app;
mod tui_events;
mod tui_ui;

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vramcalc_core::hardware;
use vramcalc_core::{
    ConfigError, Configuration, DeploymentMode, EstimateReport, KvCacheQuantization,
    ModelQuantization,
};

#[derive(Parser)]
#[command(name = "vramcalc")]
#[command(about = "Estimate the VRAM, RAM and disk an LLM needs on your hardware", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use classic CLI output instead of TUI
    #[arg(long)]
    cli: bool,

    /// Output results as JSON (for tool integration)
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

/// Configuration overrides, applied on top of the preset file.
#[derive(Args)]
struct ConfigArgs {
    /// JSON preset to start from.
    /// Falls back to VRAMCALC_CONFIG if not set.
    #[arg(long = "config", value_name = "PATH", global = true)]
    preset: Option<PathBuf>,

    /// Model size in billions of parameters
    #[arg(short, long, value_name = "BILLIONS", global = true)]
    params: Option<f64>,

    /// Weight format: F32, F16, Q8, Q6, Q5, Q4, Q3, Q2, GPTQ, AWQ
    #[arg(short, long, value_name = "FORMAT", global = true)]
    quant: Option<ModelQuantization>,

    /// Enable the KV cache
    #[arg(long, global = true, conflicts_with = "no_kv_cache")]
    kv_cache: bool,

    /// Disable the KV cache
    #[arg(long, global = true)]
    no_kv_cache: bool,

    /// KV cache format: F32, F16, Q8, Q5, Q4
    #[arg(long, value_name = "FORMAT", global = true)]
    kv_quant: Option<KvCacheQuantization>,

    /// Context window in tokens
    #[arg(short, long, value_name = "TOKENS", global = true)]
    context: Option<u32>,

    /// Deployment: discrete or unified
    #[arg(short, long, value_name = "MODE", global = true)]
    mode: Option<DeploymentMode>,

    /// System RAM (e.g. "64G", "65536M", "0.5T")
    #[arg(long, value_name = "SIZE", global = true)]
    system_memory: Option<String>,

    /// Memory per GPU (e.g. "24G")
    #[arg(long, value_name = "SIZE", global = true)]
    gpu_memory: Option<String>,

    /// Take system RAM from this machine
    #[arg(long, global = true, conflicts_with = "system_memory")]
    detect_memory: bool,

    /// Skip the input range check (what-if exploration)
    #[arg(long, global = true)]
    no_validate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate hardware for the current configuration
    Estimate,

    /// List quantization formats and their memory factors
    Quants,

    /// Compare every selectable GPU size for the current configuration
    Gpus,

    /// Print the resolved configuration as a JSON preset
    Config,
}

fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `--config` wins over the `VRAMCALC_CONFIG` value; an empty variable is unset.
fn resolve_preset_path(flag: Option<PathBuf>, env_value: Option<OsString>) -> Option<PathBuf> {
    if flag.is_some() {
        return flag;
    }

    let raw = env_value?;
    if raw.is_empty() {
        None
    } else {
        Some(PathBuf::from(raw))
    }
}

fn parse_size(raw: &str) -> Result<f64, ConfigError> {
    hardware::parse_memory_size(raw).ok_or_else(|| ConfigError::InvalidMemorySize(raw.to_string()))
}

/// Defaults, then preset, then detected RAM, then individual flags.
fn resolve_config(args: ConfigArgs, env_preset: Option<OsString>) -> Result<Configuration> {
    let mut config = match resolve_preset_path(args.preset, env_preset) {
        Some(path) => Configuration::load(&path)
            .with_context(|| format!("could not load preset {}", path.display()))?,
        None => Configuration::default(),
    };

    if args.detect_memory {
        let detected = hardware::detect_total_memory_gb();
        config.system_memory_gb = hardware::snap_system_memory_gb(detected);
        tracing::info!(
            detected_gb = detected,
            snapped_gb = config.system_memory_gb,
            "using detected system memory"
        );
    }

    if let Some(params) = args.params {
        config.params_billions = params;
    }
    if let Some(quant) = args.quant {
        config.model_quantization = quant;
    }
    if args.kv_cache {
        config.use_kv_cache = true;
    }
    if args.no_kv_cache {
        config.use_kv_cache = false;
    }
    if let Some(kv_quant) = args.kv_quant {
        if !config.use_kv_cache {
            tracing::warn!("--kv-quant has no effect while the KV cache is disabled");
        }
        config.kv_cache_quantization = kv_quant;
    }
    if let Some(context) = args.context {
        config.context_length = context;
    }
    if let Some(mode) = args.mode {
        config.deployment_mode = mode;
    }
    if let Some(raw) = args.system_memory.as_deref() {
        config.system_memory_gb = parse_size(raw)?;
    }
    if let Some(raw) = args.gpu_memory.as_deref() {
        config.gpu_memory_gb = parse_size(raw)?;
    }

    if args.no_validate {
        tracing::debug!("skipping input range check");
        config
            .check_finite()
            .context("configuration values must be finite numbers")?;
    } else {
        config
            .validate()
            .context("configuration is outside the supported range (pass --no-validate to estimate anyway)")?;
    }

    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn run_estimate(config: &Configuration, json: bool) -> Result<()> {
    let report = EstimateReport::build(config);
    if json {
        display::display_json_report(&report)
    } else {
        display::display_report(&report);
        Ok(())
    }
}

fn run_tui(config: Configuration) -> Result<()> {
    // Setup terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = tui_app::App::new(config);
    tracing::debug!("tui started");

    // Main loop
    let outcome = (|| -> std::io::Result<()> {
        loop {
            terminal.draw(|frame| {
                tui_ui::draw(frame, &app);
            })?;

            tui_events::handle_events(&mut app)?;

            if app.should_quit {
                return Ok(());
            }
        }
    })();

    // Restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    tracing::debug!("tui stopped");

    outcome.context("terminal UI failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns stderr's terminal, so stay quiet there unless asked
    let interactive = cli.command.is_none() && !cli.cli;
    init_logging(if interactive { "off" } else { "warn" });
    let env_preset = std::env::var_os("VRAMCALC_CONFIG");

    match cli.command {
        Some(Commands::Quants) => display::display_quant_table(cli.json),
        Some(Commands::Estimate) => {
            let config = resolve_config(cli.config, env_preset)?;
            run_estimate(&config, cli.json)
        }
        Some(Commands::Gpus) => {
            let config = resolve_config(cli.config, env_preset)?;
            display::display_gpu_options(&config, cli.json)
        }
        Some(Commands::Config) => {
            let config = resolve_config(cli.config, env_preset)?;
            println!("{}", config.to_json_pretty()?);
            Ok(())
        }
        None if cli.cli => {
            let config = resolve_config(cli.config, env_preset)?;
            run_estimate(&config, cli.json)
        }
        None => {
            let config = resolve_config(cli.config, env_preset)?;
            run_tui(config)
        }
    }
}
