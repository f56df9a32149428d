use std::fmt;

use crate::metrics::MetricsResult;

const DIVIDER_WIDTH: usize = 40;

/// Human-readable rendering of a [`MetricsResult`].
#[derive(Debug, Clone, Copy)]
pub struct Summary<'a> {
    metrics: &'a MetricsResult,
}

impl<'a> Summary<'a> {
    pub fn new(metrics: &'a MetricsResult) -> Self {
        Self { metrics }
    }

    /// The summary without divider lines, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        self.to_string()
            .lines()
            .filter(|line| !is_divider(line))
            .map(str::to_string)
            .collect()
    }

    pub fn compact(&self) -> String {
        self.lines().join("\n")
    }
}

fn is_divider(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '-')
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.metrics;
        writeln!(f, "Precision: {}", m.precision)?;
        writeln!(f, "{:-<width$}", "", width = DIVIDER_WIDTH)?;
        writeln!(f, "Weights:      {:.2} GB", m.weights_gb)?;
        writeln!(f, "KV Cache:     {:.2} GB", m.kv_cache_gb)?;
        writeln!(f, "Total:        {:.2} GB", m.total_gb)?;
        writeln!(f, "Prefill:      {:.2} TFLOPs", m.prefill_tflops())?;
        write!(f, "Decode:       {:.6} TFLOPs/token", m.decode_tflops())
    }
}
