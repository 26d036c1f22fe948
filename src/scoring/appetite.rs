use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ScoringError;

/// Which side of the thresholds is desirable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::LowerIsBetter => "Lower is better",
            Direction::HigherIsBetter => "Higher is better",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "lower" | "lower_is_better" => Ok(Direction::LowerIsBetter),
            "higher" | "higher_is_better" => Ok(Direction::HigherIsBetter),
            other => Err(format!(
                "unknown direction '{}' (expected lower_is_better or higher_is_better)",
                other
            )),
        }
    }
}

/// Red / Amber / Green status of a metric against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rag {
    Green,
    Amber,
    Red,
}

impl Rag {
    pub const REPORT_ORDER: [Rag; 3] = [Rag::Red, Rag::Amber, Rag::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rag::Green => "GREEN",
            Rag::Amber => "AMBER",
            Rag::Red => "RED",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Rag::Green => "🟢",
            Rag::Amber => "🟡",
            Rag::Red => "🔴",
        }
    }

    pub fn is_breach(&self) -> bool {
        matches!(self, Rag::Red)
    }
}

impl fmt::Display for Rag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "Improving",
            Trend::Worsening => "Worsening",
            Trend::Stable => "Stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Improving => "▲",
            Trend::Worsening => "▼",
            Trend::Stable => "▶",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare a metric value against its appetite and tolerance thresholds.
///
/// Exact equality with a threshold stays on the better side of it.
pub fn rag(current: f64, appetite: f64, tolerance: f64, direction: Direction) -> Rag {
    match direction {
        Direction::LowerIsBetter => {
            if current > tolerance {
                Rag::Red
            } else if current > appetite {
                Rag::Amber
            } else {
                Rag::Green
            }
        }
        Direction::HigherIsBetter => {
            if current < tolerance {
                Rag::Red
            } else if current < appetite {
                Rag::Amber
            } else {
                Rag::Green
            }
        }
    }
}

/// Movement since the prior period, if one is known.
pub fn trend(current: f64, prior: Option<f64>, direction: Direction) -> Option<Trend> {
    let prior = prior?;
    if current == prior {
        return Some(Trend::Stable);
    }
    let improved = match direction {
        Direction::LowerIsBetter => current < prior,
        Direction::HigherIsBetter => current > prior,
    };
    Some(if improved {
        Trend::Improving
    } else {
        Trend::Worsening
    })
}

/// Appetite must sit on the better side of (or equal to) tolerance.
pub fn validate_thresholds(
    appetite: f64,
    tolerance: f64,
    direction: Direction,
) -> Result<(), ScoringError> {
    if !appetite.is_finite() || !tolerance.is_finite() {
        return Err(ScoringError::InconsistentThresholds(
            "appetite and tolerance must be finite numbers".to_string(),
        ));
    }
    match direction {
        Direction::LowerIsBetter if tolerance < appetite => {
            Err(ScoringError::InconsistentThresholds(format!(
                "lower-is-better metric needs tolerance >= appetite (appetite {}, tolerance {})",
                appetite, tolerance
            )))
        }
        Direction::HigherIsBetter if appetite < tolerance => {
            Err(ScoringError::InconsistentThresholds(format!(
                "higher-is-better metric needs appetite >= tolerance (appetite {}, tolerance {})",
                appetite, tolerance
            )))
        }
        _ => Ok(()),
    }
}

/// A metric evaluated against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStatus {
    pub rag: Rag,
    pub trend: Option<Trend>,
    pub period_change: Option<f64>,
}

impl MetricStatus {
    pub fn breach(&self) -> bool {
        self.rag.is_breach()
    }
}

pub fn evaluate(
    current: f64,
    appetite: f64,
    tolerance: f64,
    direction: Direction,
    prior: Option<f64>,
) -> Result<MetricStatus, ScoringError> {
    validate_thresholds(appetite, tolerance, direction)?;
    Ok(MetricStatus {
        rag: rag(current, appetite, tolerance, direction),
        trend: trend(current, prior, direction),
        period_change: prior.map(|p| current - p),
    })
}
