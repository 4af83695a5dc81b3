use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// ThresholdKind
// ---------------------------------------------------------------------------

/// Direction of a threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdKind {
    Upper,
    Lower,
}

impl ThresholdKind {
    /// Value stored in `notifications.notification_type`.
    pub fn ledger_type(self) -> &'static str {
        match self {
            Self::Upper => "threshold_upper",
            Self::Lower => "threshold_lower",
        }
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
        })
    }
}

impl FromStr for ThresholdKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "upper" => Ok(Self::Upper),
            "lower" => Ok(Self::Lower),
            other => Err(anyhow::anyhow!("unknown threshold kind: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A reading value crossing one of the sensor's configured bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub kind: ThresholdKind,
    /// The bound that was crossed.
    pub limit: f64,
}

/// Compare a reading against the sensor's optional bounds.
///
/// The upper bound is checked first; the lower bound only when no upper
/// breach occurred, so upper wins if a misconfigured sensor (upper < lower)
/// lets a value satisfy both. Equality with a bound is never a breach, and
/// there is no hysteresis.
pub fn evaluate(value: f64, upper: Option<f64>, lower: Option<f64>) -> Option<Breach> {
    if let Some(limit) = upper {
        if value > limit {
            return Some(Breach {
                kind: ThresholdKind::Upper,
                limit,
            });
        }
    }
    if let Some(limit) = lower {
        if value < limit {
            return Some(Breach {
                kind: ThresholdKind::Lower,
                limit,
            });
        }
    }
    None
}
