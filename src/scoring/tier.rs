use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal risk severity derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
    Critical,
}

impl Tier {
    /// Display order for summaries: most severe first.
    pub const REPORT_ORDER: [Tier; 4] = [Tier::Critical, Tier::High, Tier::Medium, Tier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
            Tier::Critical => "CRITICAL",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Tier::Low => "🟢",
            Tier::Medium => "🟡",
            Tier::High => "🟠",
            Tier::Critical => "🔴",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Critical > Tier::High);
        assert!(Tier::High > Tier::Medium);
        assert!(Tier::Medium > Tier::Low);
    }

    #[test]
    fn test_report_order_most_severe_first() {
        let order = Tier::REPORT_ORDER;
        assert!(order.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tier::Critical.to_string(), "CRITICAL");
        assert_eq!(Tier::Low.to_string(), "LOW");
    }
}
