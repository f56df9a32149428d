pub mod config;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod precision;
pub mod summary;

pub use config::{ConfigOverrides, ModelConfig, NumericInput};
pub use error::{MoeCalcError, Result};
pub use estimator::Estimator;
pub use metrics::{
    EstimateReport, FlopBreakdown, MetricsResult, WeightBreakdown, BYTES_PER_GIB, FLOPS_PER_TFLOP,
};
pub use precision::Precision;
pub use summary::Summary;
