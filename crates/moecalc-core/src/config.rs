use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MoeCalcError, Result};

/// Architectural hyperparameters of a Mixture-of-Experts transformer.
///
/// Serialized with the short names used in config files (`V`, `h`, `l`, `a`,
/// `N`, `f_mult`, `s`, `top_k`). Values are trusted as given; see
/// [`ModelConfig::validate`] for an opt-in check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Vocabulary size.
    #[serde(rename = "V")]
    pub vocab_size: f64,
    /// Hidden dimension.
    #[serde(rename = "h")]
    pub hidden_size: f64,
    /// Decoder layer count.
    #[serde(rename = "l")]
    pub num_layers: f64,
    /// Attention head count.
    #[serde(rename = "a")]
    pub num_heads: f64,
    /// Number of experts per MoE layer.
    #[serde(rename = "N")]
    pub num_experts: f64,
    /// Expert feed-forward width multiplier.
    pub f_mult: f64,
    /// Sequence length.
    #[serde(rename = "s")]
    pub seq_len: f64,
    /// Experts activated per token.
    pub top_k: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vocab_size: 32000.0,
            hidden_size: 4096.0,
            num_layers: 32.0,
            num_heads: 32.0,
            num_experts: 8.0,
            f_mult: 1.25,
            seq_len: 2048.0,
            top_k: 2.0,
        }
    }
}

impl ModelConfig {
    /// Defaults merged with an uploaded (possibly partial) config file.
    pub fn from_json(content: &str) -> Result<Self> {
        let overrides: ConfigOverrides = serde_json::from_str(content)?;
        Self::default().with_overrides(&overrides)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Returns a copy with every field present in `overrides` replaced.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Result<Self> {
        let mut merged = *self;
        for (name, input, slot) in [
            ("V", &overrides.vocab_size, &mut merged.vocab_size),
            ("h", &overrides.hidden_size, &mut merged.hidden_size),
            ("l", &overrides.num_layers, &mut merged.num_layers),
            ("a", &overrides.num_heads, &mut merged.num_heads),
            ("N", &overrides.num_experts, &mut merged.num_experts),
            ("f_mult", &overrides.f_mult, &mut merged.f_mult),
            ("s", &overrides.seq_len, &mut merged.seq_len),
            ("top_k", &overrides.top_k, &mut merged.top_k),
        ] {
            if let Some(input) = input {
                if let Some(value) = input.coerce(name)? {
                    *slot = value;
                }
            }
        }
        Ok(merged)
    }

    /// Strict check that every field is finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.fields() {
            if !value.is_finite() || value <= 0.0 {
                return Err(MoeCalcError::InvalidField {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("V", self.vocab_size),
            ("h", self.hidden_size),
            ("l", self.num_layers),
            ("a", self.num_heads),
            ("N", self.num_experts),
            ("f_mult", self.f_mult),
            ("s", self.seq_len),
            ("top_k", self.top_k),
        ]
    }
}

/// A numeric field as it arrives from a form or file: either a number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    fn coerce(&self, field: &'static str) -> Result<Option<f64>> {
        match self {
            NumericInput::Number(n) => Ok(Some(*n)),
            NumericInput::Text(t) if t.trim().is_empty() => Ok(None),
            NumericInput::Text(t) => t
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| MoeCalcError::InvalidField {
                    field,
                    value: t.clone(),
                }),
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

/// Caller-supplied values layered over the defaults. Blank text is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, rename = "V", alias = "vocab_size")]
    pub vocab_size: Option<NumericInput>,
    #[serde(default, rename = "h", alias = "hidden_size")]
    pub hidden_size: Option<NumericInput>,
    #[serde(default, rename = "l", alias = "num_layers")]
    pub num_layers: Option<NumericInput>,
    #[serde(default, rename = "a", alias = "num_heads")]
    pub num_heads: Option<NumericInput>,
    #[serde(default, rename = "N", alias = "num_experts")]
    pub num_experts: Option<NumericInput>,
    #[serde(default)]
    pub f_mult: Option<NumericInput>,
    #[serde(default, rename = "s", alias = "seq_len")]
    pub seq_len: Option<NumericInput>,
    #[serde(default)]
    pub top_k: Option<NumericInput>,
}

impl From<&ModelConfig> for ConfigOverrides {
    fn from(config: &ModelConfig) -> Self {
        Self {
            vocab_size: Some(config.vocab_size.into()),
            hidden_size: Some(config.hidden_size.into()),
            num_layers: Some(config.num_layers.into()),
            num_heads: Some(config.num_heads.into()),
            num_experts: Some(config.num_experts.into()),
            f_mult: Some(config.f_mult.into()),
            seq_len: Some(config.seq_len.into()),
            top_k: Some(config.top_k.into()),
        }
    }
}
