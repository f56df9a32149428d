use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MoeCalcError;

/// Numeric format the weights and KV cache are stored in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float32,
    #[default]
    Bfloat16,
    Float16,
    Int8,
    Int4,
}

impl Precision {
    pub fn label(&self) -> &'static str {
        match self {
            Precision::Float32 => "float32",
            Precision::Bfloat16 => "bfloat16",
            Precision::Float16 => "float16",
            Precision::Int8 => "int8",
            Precision::Int4 => "int4",
        }
    }

    pub fn bytes_per_parameter(&self) -> f64 {
        match self {
            Precision::Float32 => 4.0,
            Precision::Bfloat16 => 2.0,
            Precision::Float16 => 2.0,
            Precision::Int8 => 1.0,
            Precision::Int4 => 0.5,
        }
    }

    pub fn all() -> &'static [Precision] {
        &[
            Precision::Float32,
            Precision::Bfloat16,
            Precision::Float16,
            Precision::Int8,
            Precision::Int4,
        ]
    }

    /// Parse a label, substituting the default for anything unrecognized.
    pub fn parse_or_default(label: &str) -> Precision {
        label.parse().unwrap_or_else(|e: MoeCalcError| {
            let fallback = Precision::default();
            tracing::warn!("{}, falling back to {}", e, fallback);
            fallback
        })
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Precision {
    type Err = MoeCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Precision::all()
            .iter()
            .copied()
            .find(|p| p.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| MoeCalcError::UnknownPrecision(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_parameter_table() {
        assert_eq!(Precision::Float32.bytes_per_parameter(), 4.0);
        assert_eq!(Precision::Bfloat16.bytes_per_parameter(), 2.0);
        assert_eq!(Precision::Float16.bytes_per_parameter(), 2.0);
        assert_eq!(Precision::Int8.bytes_per_parameter(), 1.0);
        assert_eq!(Precision::Int4.bytes_per_parameter(), 0.5);
    }

    #[test]
    fn test_parse_labels() {
        for p in Precision::all() {
            assert_eq!(p.label().parse::<Precision>().unwrap(), *p);
        }
        assert_eq!(" BFloat16 ".parse::<Precision>().unwrap(), Precision::Bfloat16);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "fp99".parse::<Precision>().unwrap_err();
        assert!(matches!(err, MoeCalcError::UnknownPrecision(ref l) if l == "fp99"));
        assert!("".parse::<Precision>().is_err());
    }

    #[test]
    fn test_parse_or_default_falls_back_to_bfloat16() {
        assert_eq!(Precision::parse_or_default("fp99"), Precision::Bfloat16);
        assert_eq!(Precision::parse_or_default("int4"), Precision::Int4);
    }

    #[test]
    fn test_serde_uses_lowercase_labels() {
        assert_eq!(serde_json::to_string(&Precision::Int8).unwrap(), "\"int8\"");
        let p: Precision = serde_json::from_str("\"float16\"").unwrap();
        assert_eq!(p, Precision::Float16);
    }
}
