//! Closed-form memory and compute estimates for an MoE transformer.
//!
//! All quantities are plain `f64` arithmetic with no intermediate rounding.
//! FLOP counts come from one pure function of two inputs: the number of
//! tokens processed and the context length attention reads over. Prefill
//! evaluates it with both set to `s`; decode processes one token against the
//! full `s`-token context.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::metrics::{EstimateReport, FlopBreakdown, MetricsResult, WeightBreakdown};
use crate::precision::Precision;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimator {
    config: ModelConfig,
    precision: Precision,
}

impl Estimator {
    /// Fails with `UnknownPrecision` if the label is not one of the known kinds.
    pub fn new(config: ModelConfig, precision: &str) -> Result<Self> {
        Ok(Self::with_precision(config, precision.parse()?))
    }

    pub fn with_precision(config: ModelConfig, precision: Precision) -> Self {
        Self { config, precision }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn bytes_per_parameter(&self) -> f64 {
        self.precision.bytes_per_parameter()
    }

    pub fn weight_breakdown(&self) -> WeightBreakdown {
        let k = self.bytes_per_parameter();
        let ModelConfig {
            vocab_size: v,
            hidden_size: h,
            num_layers: l,
            num_experts: n,
            f_mult,
            ..
        } = self.config;

        // input and output embedding matrices
        let embedding = 2.0 * k * v * h;
        let layernorm = 4.0 * k * h;
        // Q/K/V/O projections with bias
        let attention = 4.0 * k * h * (h + 1.0);
        let router = k * n * (h + 1.0);
        let moe_layer = k * n * h * (3.0 * f_mult * h + 2.0 * f_mult + 1.0);
        let decoder_layer = layernorm + attention + router + moe_layer;

        WeightBreakdown {
            embedding,
            layernorm,
            attention,
            router,
            moe_layer,
            decoder_layer,
            total: embedding + l * decoder_layer,
        }
    }

    pub fn weights_bytes(&self) -> f64 {
        self.weight_breakdown().total
    }

    /// Keys and values for every layer across the full sequence.
    pub fn kv_cache_bytes(&self) -> f64 {
        let c = &self.config;
        2.0 * self.bytes_per_parameter() * c.num_layers * c.seq_len * c.hidden_size
    }

    /// FLOPs for processing `tokens` tokens while attending over `context` positions.
    pub fn flop_breakdown(&self, tokens: f64, context: f64) -> FlopBreakdown {
        let ModelConfig {
            vocab_size: v,
            hidden_size: h,
            num_layers: l,
            num_heads: a,
            num_experts: n,
            f_mult,
            top_k,
            ..
        } = self.config;

        let embedding = 4.0 * tokens * v * h;
        let layernorm = 14.0 * tokens * h;
        let attention = tokens * (8.0 * h * h + 4.0 * context * h + 3.0 * context * a);
        // fixed per layer, independent of token count
        let rope = 0.75 * h;
        let router = tokens * n * (2.0 * h + 3.0);
        let moe_layer = 2.0 * top_k * tokens * f_mult * h * (4.0 * h + 3.0);
        let decoder_layer = layernorm + attention + rope + router + moe_layer;

        FlopBreakdown {
            embedding,
            layernorm,
            attention,
            rope,
            router,
            moe_layer,
            decoder_layer,
            total: embedding + l * decoder_layer,
        }
    }

    pub fn prefill_breakdown(&self) -> FlopBreakdown {
        let s = self.config.seq_len;
        self.flop_breakdown(s, s)
    }

    /// One new token; attention still spans the full cached context.
    pub fn decode_breakdown(&self) -> FlopBreakdown {
        self.flop_breakdown(1.0, self.config.seq_len)
    }

    pub fn estimate(&self) -> MetricsResult {
        self.report().metrics
    }

    pub fn report(&self) -> EstimateReport {
        let weights = self.weight_breakdown();
        let prefill = self.prefill_breakdown();
        let decode = self.decode_breakdown();

        let metrics = MetricsResult::new(
            self.precision,
            weights.total,
            self.kv_cache_bytes(),
            prefill.total,
            decode.total,
        );

        tracing::debug!(
            precision = %self.precision,
            weights_bytes = metrics.weights_bytes,
            kv_cache_bytes = metrics.kv_cache_bytes,
            prefill_flops = metrics.prefill_flops,
            decode_flops = metrics.decode_flops,
            "Estimated MoE footprint"
        );

        EstimateReport {
            metrics,
            weights,
            prefill,
            decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoeCalcError;
    use crate::metrics::BYTES_PER_GIB;

    fn default_bf16() -> Estimator {
        Estimator::with_precision(ModelConfig::default(), Precision::Bfloat16)
    }

    #[test]
    fn test_golden_weights() {
        let w = default_bf16().weight_breakdown();
        assert_eq!(w.embedding, 524_288_000.0);
        assert_eq!(w.layernorm, 32_768.0);
        assert_eq!(w.attention, 134_250_496.0);
        assert_eq!(w.router, 65_552.0);
        assert_eq!(w.moe_layer, 1_006_862_336.0);
        assert_eq!(w.decoder_layer, 1_141_211_152.0);
        assert_eq!(w.total, 37_043_044_864.0);
    }

    #[test]
    fn test_golden_kv_cache() {
        assert_eq!(default_bf16().kv_cache_bytes(), 1_073_741_824.0);
    }

    #[test]
    fn test_golden_prefill() {
        let f = default_bf16().prefill_breakdown();
        assert_eq!(f.embedding, 1_073_741_824_000.0);
        assert_eq!(f.layernorm, 117_440_512.0);
        assert_eq!(f.attention, 344_000_036_864.0);
        assert_eq!(f.rope, 3_072.0);
        assert_eq!(f.router, 134_266_880.0);
        assert_eq!(f.moe_layer, 687_320_596_480.0);
        assert_eq!(f.decoder_layer, 1_031_572_343_808.0);
        assert_eq!(f.total, 34_084_056_825_856.0);
    }

    #[test]
    fn test_golden_decode() {
        let f = default_bf16().decode_breakdown();
        assert_eq!(f.embedding, 524_288_000.0);
        assert_eq!(f.layernorm, 57_344.0);
        assert_eq!(f.attention, 167_968_768.0);
        assert_eq!(f.rope, 3_072.0);
        assert_eq!(f.router, 65_560.0);
        assert_eq!(f.moe_layer, 335_605_760.0);
        assert_eq!(f.total, 16_642_704_128.0);
    }

    #[test]
    fn test_golden_metrics() {
        let m = default_bf16().estimate();
        assert_eq!(m.precision, Precision::Bfloat16);
        assert_eq!(m.weights_bytes, 37_043_044_864.0);
        assert_eq!(m.kv_cache_bytes, 1_073_741_824.0);
        assert_eq!(m.total_bytes, 38_116_786_688.0);
        assert_eq!(m.kv_cache_gb, 1.0);
        assert_eq!(m.prefill_flops, 34_084_056_825_856.0);
        assert_eq!(m.decode_flops, 16_642_704_128.0);
    }

    #[test]
    fn test_decode_attends_over_full_context() {
        let est = default_bf16();
        let decode = est.estimate().decode_flops;
        let single_position = est.flop_breakdown(1.0, 1.0).total;

        assert_eq!(single_position, 15_563_198_208.0);
        assert!(decode > single_position);

        // the gap is exactly the context-dependent attention work per layer
        let c = est.config();
        let per_layer_gap = (c.seq_len - 1.0) * (4.0 * c.hidden_size + 3.0 * c.num_heads);
        assert_eq!(decode - single_position, c.num_layers * per_layer_gap);
    }

    #[test]
    fn test_decode_does_not_touch_config() {
        let est = default_bf16();
        let _ = est.decode_breakdown();
        assert_eq!(est.config().seq_len, 2048.0);
        assert_eq!(est.prefill_breakdown().total, 34_084_056_825_856.0);
    }

    #[test]
    fn test_totals_round_trip() {
        for &p in Precision::all() {
            let config = ModelConfig {
                f_mult: 3.5,
                seq_len: 8192.0,
                ..Default::default()
            };
            let m = Estimator::with_precision(config, p).estimate();
            assert_eq!(m.total_bytes, m.weights_bytes + m.kv_cache_bytes);
            assert_eq!(m.total_gb, m.total_bytes / BYTES_PER_GIB);
        }
    }

    #[test]
    fn test_precision_scaling() {
        let config = ModelConfig::default();
        let base = Estimator::with_precision(config, Precision::Float32).estimate();
        for &p in Precision::all() {
            let m = Estimator::with_precision(config, p).estimate();
            let ratio = p.bytes_per_parameter() / 4.0;
            assert_eq!(m.weights_bytes / base.weights_bytes, ratio);
            assert_eq!(m.kv_cache_bytes / base.kv_cache_bytes, ratio);
            // compute cost does not depend on storage format
            assert_eq!(m.prefill_flops, base.prefill_flops);
            assert_eq!(m.decode_flops, base.decode_flops);
        }

        let int4 = Estimator::with_precision(config, Precision::Int4).estimate();
        assert_eq!(int4.weights_bytes * 8.0, base.weights_bytes);
    }

    #[test]
    fn test_monotonic_in_every_field() {
        let base = ModelConfig::default();
        let before = Estimator::with_precision(base, Precision::Bfloat16).estimate();

        let bumps: [fn(&mut ModelConfig); 8] = [
            |c| c.vocab_size *= 2.0,
            |c| c.hidden_size *= 2.0,
            |c| c.num_layers *= 2.0,
            |c| c.num_heads *= 2.0,
            |c| c.num_experts *= 2.0,
            |c| c.f_mult *= 2.0,
            |c| c.seq_len *= 2.0,
            |c| c.top_k *= 2.0,
        ];

        for bump in bumps {
            let mut config = base;
            bump(&mut config);
            let after = Estimator::with_precision(config, Precision::Bfloat16).estimate();
            assert!(after.weights_bytes >= before.weights_bytes, "{:?}", config);
            assert!(after.kv_cache_bytes >= before.kv_cache_bytes, "{:?}", config);
            assert!(after.prefill_flops >= before.prefill_flops, "{:?}", config);
            assert!(after.decode_flops >= before.decode_flops, "{:?}", config);
        }
    }

    #[test]
    fn test_kv_cache_linear_in_seq_len_and_layers() {
        let base = default_bf16().kv_cache_bytes();
        let longer = ModelConfig {
            seq_len: 3.0 * 2048.0,
            ..Default::default()
        };
        let deeper = ModelConfig {
            num_layers: 5.0 * 32.0,
            ..Default::default()
        };
        let kv = |c: ModelConfig| Estimator::with_precision(c, Precision::Bfloat16).kv_cache_bytes();
        assert_eq!(kv(longer), 3.0 * base);
        assert_eq!(kv(deeper), 5.0 * base);
    }

    #[test]
    fn test_prefill_scaling_in_seq_len() {
        let at = |s: f64| {
            let config = ModelConfig {
                seq_len: s,
                ..Default::default()
            };
            Estimator::with_precision(config, Precision::Bfloat16).prefill_breakdown()
        };
        let (one, two, three) = (at(512.0), at(1024.0), at(1536.0));

        assert_eq!(two.embedding, 2.0 * one.embedding);
        assert_eq!(two.router, 2.0 * one.router);
        assert_eq!(two.rope, one.rope);

        // attention = 8h²·s + (4h + 3a)·s², so the second difference is constant
        let c = ModelConfig::default();
        let quadratic = 4.0 * c.hidden_size + 3.0 * c.num_heads;
        let linear = 8.0 * c.hidden_size * c.hidden_size;
        assert_eq!(one.attention, linear * 512.0 + quadratic * 512.0 * 512.0);
        assert_eq!(
            three.attention - 2.0 * two.attention + one.attention,
            2.0 * quadratic * 512.0 * 512.0
        );
    }

    #[test]
    fn test_unknown_precision_rejected() {
        let err = Estimator::new(ModelConfig::default(), "fp99").unwrap_err();
        assert!(matches!(err, MoeCalcError::UnknownPrecision(_)));
    }

    #[test]
    fn test_new_resolves_label() {
        let est = Estimator::new(ModelConfig::default(), "int8").unwrap();
        assert_eq!(est.precision(), Precision::Int8);
        assert_eq!(est.bytes_per_parameter(), 1.0);
        assert!(!est.estimate().weights_bytes.is_nan());
    }

    #[test]
    fn test_zero_config_stays_finite() {
        let zeros = ModelConfig {
            vocab_size: 0.0,
            hidden_size: 0.0,
            num_layers: 0.0,
            num_heads: 0.0,
            num_experts: 0.0,
            f_mult: 0.0,
            seq_len: 0.0,
            top_k: 0.0,
        };
        let m = Estimator::with_precision(zeros, Precision::Float32).estimate();
        assert_eq!(m.total_bytes, 0.0);
        assert_eq!(m.prefill_flops, 0.0);
        assert_eq!(m.decode_flops, 0.0);
    }
}
