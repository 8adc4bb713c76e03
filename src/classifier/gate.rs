//! Fetch-time relevance gate.
//!
//! A binary accept/reject test applied to title and body before a page is
//! kept. It is separate from the 0-100 score computed at classification time.

use super::keywords::{GENERAL_KEYWORDS, HIGH_IMPACT_KEYWORDS};

pub const MIN_GENERAL_KEYWORDS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct RelevanceGate {
    high_impact: &'static [&'static str],
    general: &'static [&'static str],
    min_general: usize,
}

impl Default for RelevanceGate {
    fn default() -> Self {
        RelevanceGate {
            high_impact: HIGH_IMPACT_KEYWORDS,
            general: GENERAL_KEYWORDS,
            min_general: MIN_GENERAL_KEYWORDS,
        }
    }
}

impl RelevanceGate {
    /// One high-impact keyword, or at least three distinct general keywords.
    pub fn accepts(&self, title: &str, body: &str) -> bool {
        let text = format!("{} {}", title, body).to_lowercase();

        if self.high_impact.iter().any(|keyword| text.contains(keyword)) {
            return true;
        }

        let general_hits = self
            .general
            .iter()
            .filter(|keyword| text.contains(*keyword))
            .count();
        general_hits >= self.min_general
    }
}
