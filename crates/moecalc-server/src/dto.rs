use moecalc_core::{
    ConfigOverrides, EstimateReport, FlopBreakdown, MetricsResult, ModelConfig, Precision,
    Summary, WeightBreakdown,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub config: ConfigOverrides,
    #[serde(default)]
    pub precision: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Breakdown {
    pub weights: WeightBreakdown,
    pub prefill: FlopBreakdown,
    pub decode: FlopBreakdown,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub config: ModelConfig,
    pub metrics: MetricsResult,
    pub prefill_tflops: f64,
    pub decode_tflops: f64,
    pub summary: String,
    pub breakdown: Breakdown,
}

impl EstimateResponse {
    pub fn new(config: ModelConfig, report: EstimateReport) -> Self {
        let EstimateReport {
            metrics,
            weights,
            prefill,
            decode,
        } = report;
        Self {
            config,
            prefill_tflops: metrics.prefill_tflops(),
            decode_tflops: metrics.decode_tflops(),
            summary: Summary::new(&metrics).compact(),
            metrics,
            breakdown: Breakdown {
                weights,
                prefill,
                decode,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrecisionInfo {
    pub label: &'static str,
    pub bytes_per_parameter: f64,
}

impl From<Precision> for PrecisionInfo {
    fn from(p: Precision) -> Self {
        Self {
            label: p.label(),
            bytes_per_parameter: p.bytes_per_parameter(),
        }
    }
}
