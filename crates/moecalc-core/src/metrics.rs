use serde::{Deserialize, Serialize};

use crate::precision::Precision;

pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
pub const FLOPS_PER_TFLOP: f64 = 1e12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub precision: Precision,
    pub weights_bytes: f64,
    pub kv_cache_bytes: f64,
    pub total_bytes: f64,
    pub weights_gb: f64,
    pub kv_cache_gb: f64,
    pub total_gb: f64,
    /// One forward pass over the full sequence.
    pub prefill_flops: f64,
    /// One additional token against the cached context.
    pub decode_flops: f64,
}

impl MetricsResult {
    pub fn new(
        precision: Precision,
        weights_bytes: f64,
        kv_cache_bytes: f64,
        prefill_flops: f64,
        decode_flops: f64,
    ) -> Self {
        let total_bytes = weights_bytes + kv_cache_bytes;
        Self {
            precision,
            weights_bytes,
            kv_cache_bytes,
            total_bytes,
            weights_gb: weights_bytes / BYTES_PER_GIB,
            kv_cache_gb: kv_cache_bytes / BYTES_PER_GIB,
            total_gb: total_bytes / BYTES_PER_GIB,
            prefill_flops,
            decode_flops,
        }
    }

    pub fn prefill_tflops(&self) -> f64 {
        self.prefill_flops / FLOPS_PER_TFLOP
    }

    pub fn decode_tflops(&self) -> f64 {
        self.decode_flops / FLOPS_PER_TFLOP
    }
}

/// Parameter bytes per component. Per-layer entries are for a single decoder layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBreakdown {
    pub embedding: f64,
    pub layernorm: f64,
    pub attention: f64,
    pub router: f64,
    pub moe_layer: f64,
    pub decoder_layer: f64,
    pub total: f64,
}

/// FLOPs per component. Per-layer entries are for a single decoder layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlopBreakdown {
    pub embedding: f64,
    pub layernorm: f64,
    pub attention: f64,
    pub rope: f64,
    pub router: f64,
    pub moe_layer: f64,
    pub decoder_layer: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub metrics: MetricsResult,
    pub weights: WeightBreakdown,
    pub prefill: FlopBreakdown,
    pub decode: FlopBreakdown,
}
