use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use moecalc_core::{
    ConfigOverrides, EstimateReport, Estimator, FlopBreakdown, ModelConfig, Precision, Summary,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "moecalc")]
#[command(about = "MoE Calculator - memory and FLOP estimates for Mixture-of-Experts models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate weight, KV-cache and compute cost
    Estimate(EstimateArgs),

    /// Print or write the default model config as JSON
    Template {
        /// File to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported precisions
    Precisions,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// JSON config file; missing fields use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Precision (float32, bfloat16, float16, int8, int4)
    #[arg(short, long, default_value = "bfloat16")]
    precision: String,

    /// Vocabulary size (V)
    #[arg(long)]
    vocab_size: Option<f64>,

    /// Hidden dimension (h)
    #[arg(long)]
    hidden_size: Option<f64>,

    /// Decoder layer count (l)
    #[arg(long)]
    layers: Option<f64>,

    /// Attention head count (a)
    #[arg(long)]
    heads: Option<f64>,

    /// Number of experts (N)
    #[arg(long)]
    experts: Option<f64>,

    /// Expert feed-forward width multiplier
    #[arg(long)]
    f_mult: Option<f64>,

    /// Sequence length (s)
    #[arg(long)]
    seq_len: Option<f64>,

    /// Experts activated per token
    #[arg(long)]
    top_k: Option<f64>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Show per-component weight and FLOP figures
    #[arg(long)]
    breakdown: bool,

    /// Reject zero, negative or non-finite config values
    #[arg(long)]
    strict: bool,
}

impl EstimateArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            vocab_size: self.vocab_size.map(Into::into),
            hidden_size: self.hidden_size.map(Into::into),
            num_layers: self.layers.map(Into::into),
            num_heads: self.heads.map(Into::into),
            num_experts: self.experts.map(Into::into),
            f_mult: self.f_mult.map(Into::into),
            seq_len: self.seq_len.map(Into::into),
            top_k: self.top_k.map(Into::into),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate(args) => cmd_estimate(&args)?,
        Commands::Template { output } => cmd_template(output)?,
        Commands::Precisions => cmd_precisions(),
    }

    Ok(())
}

/// Defaults, then the config file, then individual flags.
fn resolve_config(args: &EstimateArgs) -> Result<ModelConfig> {
    let base = match &args.config {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ModelConfig::default(),
    };
    let config = base.with_overrides(&args.overrides())?;
    if args.strict {
        config.validate()?;
    }
    Ok(config)
}

fn cmd_estimate(args: &EstimateArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let estimator = Estimator::new(config, &args.precision)?;
    let report = estimator.report();

    tracing::info!("Estimating {} at {}", describe(&config), estimator.precision());

    let rendered = match args.output.as_str() {
        "json" => render_json(&config, &report)?,
        "csv" => render_csv(&report),
        _ => render_table(&report, args.breakdown),
    };
    println!("{}", rendered);

    Ok(())
}

fn describe(config: &ModelConfig) -> String {
    format!(
        "N={} top_k={} l={} h={} s={}",
        config.num_experts, config.top_k, config.num_layers, config.hidden_size, config.seq_len
    )
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    config: &'a ModelConfig,
    #[serde(flatten)]
    report: &'a EstimateReport,
    prefill_tflops: f64,
    decode_tflops: f64,
}

fn render_json(config: &ModelConfig, report: &EstimateReport) -> Result<String> {
    let out = JsonOutput {
        config,
        report,
        prefill_tflops: report.metrics.prefill_tflops(),
        decode_tflops: report.metrics.decode_tflops(),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

fn render_csv(report: &EstimateReport) -> String {
    let m = &report.metrics;
    let mut out = String::from("metric,value\n");
    let _ = writeln!(out, "precision,{}", m.precision);
    let _ = writeln!(out, "weights_bytes,{}", m.weights_bytes);
    let _ = writeln!(out, "kv_cache_bytes,{}", m.kv_cache_bytes);
    let _ = writeln!(out, "total_bytes,{}", m.total_bytes);
    let _ = writeln!(out, "weights_gb,{:.2}", m.weights_gb);
    let _ = writeln!(out, "kv_cache_gb,{:.2}", m.kv_cache_gb);
    let _ = writeln!(out, "total_gb,{:.2}", m.total_gb);
    let _ = writeln!(out, "prefill_tflops,{:.2}", m.prefill_tflops());
    let _ = write!(out, "decode_tflops,{:.6}", m.decode_tflops());
    out
}

fn render_table(report: &EstimateReport, breakdown: bool) -> String {
    let mut out = Summary::new(&report.metrics).to_string();
    if !breakdown {
        return out;
    }

    let w = &report.weights;
    let _ = writeln!(out, "\n\nWeights (bytes, per layer unless noted):");
    let _ = writeln!(out, "{:-<40}", "");
    let _ = writeln!(out, "  {:<16} {:>20.0}", "embedding (all)", w.embedding);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "layernorm", w.layernorm);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "attention", w.attention);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "router", w.router);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "moe", w.moe_layer);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "decoder layer", w.decoder_layer);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "total (all)", w.total);

    push_flops(&mut out, "Prefill", &report.prefill);
    push_flops(&mut out, "Decode", &report.decode);
    out.truncate(out.trim_end().len());
    out
}

fn push_flops(out: &mut String, title: &str, f: &FlopBreakdown) {
    let _ = writeln!(out, "\n{} (FLOPs, per layer unless noted):", title);
    let _ = writeln!(out, "{:-<40}", "");
    let _ = writeln!(out, "  {:<16} {:>20.0}", "embedding (all)", f.embedding);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "layernorm", f.layernorm);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "attention", f.attention);
    let _ = writeln!(out, "  {:<16} {:>20.2}", "rope", f.rope);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "router", f.router);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "moe", f.moe_layer);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "decoder layer", f.decoder_layer);
    let _ = writeln!(out, "  {:<16} {:>20.0}", "total (all)", f.total);
}

fn cmd_template(output: Option<PathBuf>) -> Result<()> {
    let config = ModelConfig::default();
    match output {
        Some(path) => {
            config
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
        None => println!("{}", config.to_json()?),
    }
    Ok(())
}

fn cmd_precisions() {
    println!();
    println!("Supported Precisions:");
    println!("{:-<40}", "");
    println!("  {:<12} {}", "Label", "Bytes/param");
    println!("{:-<40}", "");
    for p in Precision::all() {
        let marker = if *p == Precision::default() { " (default)" } else { "" };
        println!("  {:<12} {}{}", p.label(), p.bytes_per_parameter(), marker);
    }
    println!();
}
