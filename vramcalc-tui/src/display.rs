use anyhow::{Context, Result};
use colored::*;
use tabled::{Table, Tabled, settings::Style};
use vramcalc_core::config::GPU_MEMORY_OPTIONS_GB;
use vramcalc_core::{
    Configuration, DeploymentMode, EstimateReport, KvCacheQuantization, ModelQuantization,
    UtilizationClass, on_disk_size_gb, round_half_up,
};

#[derive(Tabled)]
struct QuantRow {
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Factor")]
    factor: String,
    #[tabled(rename = "Bits")]
    bits: String,
    #[tabled(rename = "Disk GB / 1B params")]
    disk: String,
}

#[derive(Tabled)]
struct GpuRow {
    #[tabled(rename = "Configuration")]
    gpu: String,
    #[tabled(rename = "Count")]
    count: String,
    #[tabled(rename = "VRAM Needed")]
    vram: String,
    #[tabled(rename = "Mem %")]
    utilization: String,
    #[tabled(rename = "System RAM")]
    system_ram: String,
}

fn colorize_utilization(text: String, class: UtilizationClass) -> ColoredString {
    match class {
        UtilizationClass::Low => text.green(),
        UtilizationClass::Medium => text.yellow(),
        UtilizationClass::High => text.magenta(),
        UtilizationClass::Extreme => text.red().bold(),
    }
}

pub fn display_report(report: &EstimateReport) {
    let c = &report.config;
    let rec = &report.recommendation;

    println!("\n{}", "=== LLM Hardware Estimate ===".bold().cyan());
    println!();
    println!("{}: {}B", "Parameters".bold(), c.params_billions);
    println!("{}: {}", "Quantization".bold(), c.model_quantization);
    println!("{}: {} tokens", "Context Length".bold(), c.context_length);
    if c.use_kv_cache {
        println!("{}: {}", "KV Cache".bold(), c.kv_cache_quantization);
    } else {
        println!("{}: {}", "KV Cache".bold(), "disabled".dimmed());
    }
    println!("{}: {}", "System Type".bold(), c.deployment_mode.label());
    match c.deployment_mode {
        DeploymentMode::DiscreteGpu => {
            println!("{}: {} GB", "GPU VRAM".bold(), c.gpu_memory_gb);
            println!("{}: {} GB", "System Memory".bold(), c.system_memory_gb);
        }
        DeploymentMode::UnifiedMemory => {
            println!("{}: {} GB", "Unified Memory".bold(), c.system_memory_gb);
        }
    }
    println!();

    println!("{}", "Hardware Requirements:".bold().underline());
    println!("  VRAM Needed: {:.1} GB", rec.vram_needed_gb);
    if report.kv_cache_gb > 0.0 {
        println!("  of which KV cache: {:.1} GB", report.kv_cache_gb);
    }
    println!("  On-disk Size: {:.1} GB", report.on_disk_size_gb);
    println!("  GPU Configuration: {}", report.gpu_configuration());
    println!("  System Memory: {:.1} GB Required", rec.system_ram_needed_gb);
    println!(
        "  Utilization: {} of {:.1} GB",
        colorize_utilization(
            format!("{:.1}%", report.utilization_pct),
            report.utilization_class
        ),
        report.available_memory_gb
    );
    println!("  Size Tier: {}", report.complexity_tier.label());

    if c.is_unified() {
        println!();
        if rec.fits_unified_memory {
            println!("{}", "Model fits in unified memory".green().bold());
        } else {
            println!("{}", "Model exceeds unified memory capacity".red().bold());
        }
    }

    if !report.notes.is_empty() {
        println!();
        println!("{}", "Notes:".bold().underline());
        for note in &report.notes {
            println!("  {}", note);
        }
    }
    println!();
}

/// Weight and KV cache formats with their memory factors.
pub fn display_quant_table(json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "model_quantization": ModelQuantization::ALL
                .iter()
                .map(|q| serde_json::json!({
                    "format": q.label(),
                    "factor": q.factor(),
                    "bits_per_param": q.bits_per_param(),
                    "disk_gb_per_billion": round2(disk_per_billion(*q)),
                }))
                .collect::<Vec<_>>(),
            "kv_cache_quantization": KvCacheQuantization::ALL
                .iter()
                .map(|q| serde_json::json!({
                    "format": q.label(),
                    "factor": q.factor(),
                }))
                .collect::<Vec<_>>(),
        });
        return print_json(&output);
    }

    println!("\n{}", "=== Model Quantization ===".bold().cyan());
    let rows: Vec<QuantRow> = ModelQuantization::ALL
        .iter()
        .map(|q| QuantRow {
            format: q.label().to_string(),
            factor: format!("{}", q.factor()),
            bits: q.bits_per_param().to_string(),
            disk: format!("{:.2}", disk_per_billion(*q)),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    println!("\n{}", "=== KV Cache Quantization ===".bold().cyan());
    let rows: Vec<QuantRow> = KvCacheQuantization::ALL
        .iter()
        .map(|q| QuantRow {
            format: q.label().to_string(),
            factor: format!("{}", q.factor()),
            bits: "-".to_string(),
            disk: "-".to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn disk_per_billion(quant: ModelQuantization) -> f64 {
    on_disk_size_gb(&Configuration {
        params_billions: 1.0,
        model_quantization: quant,
        ..Default::default()
    })
}

/// One estimate per selectable GPU size, holding everything else fixed.
pub fn display_gpu_options(config: &Configuration, json: bool) -> Result<()> {
    if config.is_unified() {
        tracing::warn!("GPU size has no effect in unified memory mode; comparing discrete GPUs");
    }

    let reports: Vec<EstimateReport> = GPU_MEMORY_OPTIONS_GB
        .iter()
        .map(|&gb| {
            EstimateReport::build(&Configuration {
                deployment_mode: DeploymentMode::DiscreteGpu,
                gpu_memory_gb: gb,
                ..*config
            })
        })
        .collect();

    if json {
        let options: Vec<serde_json::Value> = reports.iter().map(report_to_json).collect();
        return print_json(&serde_json::json!({ "options": options }));
    }

    println!("\n{}", "=== GPU Options ===".bold().cyan());
    println!(
        "{}B {} at {} tokens\n",
        config.params_billions, config.model_quantization, config.context_length
    );

    let rows: Vec<GpuRow> = reports
        .iter()
        .map(|r| GpuRow {
            gpu: r.gpu_configuration(),
            count: r.recommendation.gpus_required.to_string(),
            vram: format!("{:.1} GB", r.recommendation.vram_needed_gb),
            utilization: format!("{:.1}% ({})", r.utilization_pct, r.utilization_class.label()),
            system_ram: format!("{:.1} GB", r.recommendation.system_ram_needed_gb),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

// ────────────────────────────────────────────────────────────────────
// JSON output for scripts
// ────────────────────────────────────────────────────────────────────

pub fn display_json_report(report: &EstimateReport) -> Result<()> {
    print_json(&serde_json::json!({ "estimate": report_to_json(report) }))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{}", text);
    Ok(())
}

fn report_to_json(report: &EstimateReport) -> serde_json::Value {
    let rec = &report.recommendation;
    serde_json::json!({
        "config": report.config,
        "required_vram_gb": round2(report.required_vram_gb),
        "kv_cache_gb": round2(report.kv_cache_gb),
        "vram_needed_gb": rec.vram_needed_gb,
        "gpu_type": rec.gpu_type,
        "gpu_configuration": report.gpu_configuration(),
        "gpus_required": rec.gpus_required,
        "fits_unified_memory": rec.fits_unified_memory,
        "system_ram_needed_gb": rec.system_ram_needed_gb,
        "on_disk_size_gb": round1(report.on_disk_size_gb),
        "available_memory_gb": round2(report.available_memory_gb),
        "utilization_pct": round1(report.utilization_pct),
        "utilization_class": report.utilization_class,
        "complexity_tier": report.complexity_tier,
        "notes": report.notes,
    })
}

fn round1(v: f64) -> f64 {
    round_half_up(v, 1)
}

fn round2(v: f64) -> f64 {
    round_half_up(v, 2)
}
