//! Relevance and threat classification.
//!
//! Two scoring strategies share one interface: the full keyword classifier
//! and the quick variant used for offline batch work. They are intentionally
//! not numerically equivalent; [`ScoringStrategy`] picks one.

pub mod gate;
pub mod keywords;
pub mod strategy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use gate::RelevanceGate;
pub use strategy::{FullScorer, QuickScorer, ThreatScorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
        }
    }

    /// MEDIUM and HIGH articles carry an alert.
    pub fn raises_alert(&self) -> bool {
        matches!(self, ThreatLevel::Medium | ThreatLevel::High)
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ThreatLevel {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => ThreatLevel::High,
            "MEDIUM" => ThreatLevel::Medium,
            _ => ThreatLevel::Low,
        }
    }
}

/// Result of classifying one article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_relevant: bool,
    /// Always within 0..=100.
    pub relevance_score: u32,
    /// Detected category tags, in table order.
    pub detected_categories: Vec<String>,
    /// Per-category score, same order as `detected_categories`.
    pub category_scores: Vec<(String, u32)>,
    pub threat_level: ThreatLevel,
    pub key_indicators: Vec<String>,
}

impl Classification {
    pub fn empty() -> Self {
        Classification {
            is_relevant: false,
            relevance_score: 0,
            detected_categories: Vec::new(),
            category_scores: Vec::new(),
            threat_level: ThreatLevel::Low,
            key_indicators: Vec::new(),
        }
    }

    pub fn total_category_score(&self) -> u32 {
        self.category_scores.iter().map(|(_, score)| score).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    #[default]
    Full,
    Quick,
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::Full => write!(f, "full"),
            ScoringStrategy::Quick => write!(f, "quick"),
        }
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(ScoringStrategy::Full),
            "quick" | "simple" | "simplified" => Ok(ScoringStrategy::Quick),
            other => Err(format!("unknown scoring strategy '{}'", other)),
        }
    }
}

/// Configured classifier; dispatches to the selected strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    strategy: ScoringStrategy,
}

impl Classifier {
    pub fn new(strategy: ScoringStrategy) -> Self {
        Classifier { strategy }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    pub fn classify(&self, text: &str) -> Classification {
        match self.strategy {
            ScoringStrategy::Full => FullScorer.classify(text),
            ScoringStrategy::Quick => QuickScorer.classify(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_level_round_trip_strings() {
        for level in [ThreatLevel::Low, ThreatLevel::Medium, ThreatLevel::High] {
            assert_eq!(ThreatLevel::from(level.as_str()), level);
        }
        assert_eq!(ThreatLevel::from("garbage"), ThreatLevel::Low);
        assert!(ThreatLevel::High.raises_alert());
        assert!(ThreatLevel::Medium.raises_alert());
        assert!(!ThreatLevel::Low.raises_alert());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("full".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Full));
        assert_eq!(" Quick ".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Quick));
        assert_eq!("simplified".parse::<ScoringStrategy>(), Ok(ScoringStrategy::Quick));
        assert!("fancy".parse::<ScoringStrategy>().is_err());
    }

    #[test]
    fn test_classifier_dispatches_to_strategy() {
        let text = "Army soldiers joined the operation near the border.";
        assert_eq!(
            Classifier::new(ScoringStrategy::Full).classify(text),
            FullScorer.classify(text)
        );
        assert_eq!(
            Classifier::new(ScoringStrategy::Quick).classify(text),
            QuickScorer.classify(text)
        );
    }

    #[test]
    fn test_terrorist_attack_scenario() {
        let result = Classifier::default()
            .classify("A terrorist attack near the border triggered a security alert.");
        assert!(result.is_relevant);
        assert!(result.detected_categories.contains(&"terrorism".to_string()));
        assert!(result.detected_categories.contains(&"border_security".to_string()));
        assert!(result.key_indicators.contains(&"security alert".to_string()));
        assert_eq!(result.threat_level, ThreatLevel::High);
    }
}
