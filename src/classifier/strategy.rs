use super::keywords::{DEFENSE_CATEGORIES, QUICK_CATEGORIES, QUICK_THREAT_WORDS, THREAT_INDICATORS};
use super::{Classification, ThreatLevel};

const FULL_POINTS_PER_OCCURRENCE: u32 = 10;
const FULL_MEDIUM_THRESHOLD: u32 = 5;

const QUICK_POINTS_PER_CATEGORY_HIT: u32 = 5;
const QUICK_POINTS_PER_INDICATOR: u32 = 10;
const QUICK_MEDIUM_THRESHOLD: u32 = 15;

const MAX_SCORE: u32 = 100;

/// A keyword scoring strategy.
pub trait ThreatScorer {
    fn classify(&self, text: &str) -> Classification;
}

/// Counts every occurrence of every category keyword.
///
/// `relevance = min(100, 10 * occurrences)`; HIGH on any indicator or a
/// terrorism hit, MEDIUM above 5 occurrences.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullScorer;

/// Flat weights: +5 per matched category keyword, +10 per threat word.
///
/// HIGH on any threat word, MEDIUM when the category part exceeds 15.
/// A high total score alone never yields HIGH; both scorers share the same
/// ordered level decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickScorer;

/// Non-overlapping occurrences, same as a plain substring count.
fn occurrences(haystack: &str, needle: &str) -> u32 {
    haystack.matches(needle).count() as u32
}

fn matched_phrases(text_lower: &str, phrases: &[&str]) -> Vec<String> {
    phrases
        .iter()
        .filter(|phrase| text_lower.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

fn decide_threat_level(
    key_indicators: &[String],
    detected_categories: &[String],
    category_score: u32,
    medium_threshold: u32,
) -> ThreatLevel {
    if !key_indicators.is_empty() || detected_categories.iter().any(|c| c == "terrorism") {
        ThreatLevel::High
    } else if category_score > medium_threshold {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

impl ThreatScorer for FullScorer {
    fn classify(&self, text: &str) -> Classification {
        if text.is_empty() {
            return Classification::empty();
        }
        let text_lower = text.to_lowercase();

        let category_scores: Vec<(String, u32)> = DEFENSE_CATEGORIES
            .iter()
            .map(|(category, keywords)| {
                let score = keywords
                    .iter()
                    .map(|keyword| occurrences(&text_lower, keyword))
                    .sum();
                (category.to_string(), score)
            })
            .filter(|(_, score)| *score > 0)
            .collect();

        let detected_categories: Vec<String> =
            category_scores.iter().map(|(c, _)| c.clone()).collect();
        let key_indicators = matched_phrases(&text_lower, THREAT_INDICATORS);

        let total: u32 = category_scores.iter().map(|(_, score)| score).sum();
        let relevance_score = total.saturating_mul(FULL_POINTS_PER_OCCURRENCE).min(MAX_SCORE);
        let threat_level = decide_threat_level(
            &key_indicators,
            &detected_categories,
            total,
            FULL_MEDIUM_THRESHOLD,
        );

        Classification {
            is_relevant: !detected_categories.is_empty(),
            relevance_score,
            detected_categories,
            category_scores,
            threat_level,
            key_indicators,
        }
    }
}

impl ThreatScorer for QuickScorer {
    fn classify(&self, text: &str) -> Classification {
        if text.is_empty() {
            return Classification::empty();
        }
        let text_lower = text.to_lowercase();

        let category_scores: Vec<(String, u32)> = QUICK_CATEGORIES
            .iter()
            .map(|(category, keywords)| {
                let hits = keywords
                    .iter()
                    .filter(|keyword| text_lower.contains(*keyword))
                    .count() as u32;
                (category.to_string(), hits * QUICK_POINTS_PER_CATEGORY_HIT)
            })
            .filter(|(_, score)| *score > 0)
            .collect();

        let detected_categories: Vec<String> =
            category_scores.iter().map(|(c, _)| c.clone()).collect();
        let key_indicators = matched_phrases(&text_lower, QUICK_THREAT_WORDS);

        let category_total: u32 = category_scores.iter().map(|(_, score)| score).sum();
        let indicator_total = key_indicators.len() as u32 * QUICK_POINTS_PER_INDICATOR;
        let relevance_score = (category_total + indicator_total).min(MAX_SCORE);
        let threat_level = decide_threat_level(
            &key_indicators,
            &detected_categories,
            category_total,
            QUICK_MEDIUM_THRESHOLD,
        );

        Classification {
            is_relevant: !detected_categories.is_empty(),
            relevance_score,
            detected_categories,
            category_scores,
            threat_level,
            key_indicators,
        }
    }
}
