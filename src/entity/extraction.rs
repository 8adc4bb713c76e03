use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::ExtractedEntities;
use super::TARGET_ENTITY;

/// Pluggable named-entity recognition.
///
/// The pipeline calls this once per article body and persists whatever it
/// returns. Implementations must be deterministic for a given text so that
/// re-ingestion yields the same entity rows.
pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> ExtractedEntities;
}

/// Regex heuristics used when no NER backend is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternEntityExtractor;

const MIN_ENTITY_CHARS: usize = 2;
const MIN_WEAPON_CHARS: usize = 4;

/// Last word of a capitalized phrase that marks it as an organization.
const ORGANIZATION_HEADS: &[&str] = &[
    "army",
    "navy",
    "force",
    "forces",
    "ministry",
    "agency",
    "corps",
    "police",
    "guard",
    "guards",
    "command",
    "council",
    "regiment",
    "brigade",
    "battalion",
    "division",
    "organisation",
    "organization",
    "department",
    "commission",
    "service",
    "services",
    "nations",
    "alliance",
    "front",
    "party",
];

/// Organizations containing any of these are also military units.
const MILITARY_TERMS: &[&str] = &[
    "army",
    "navy",
    "force",
    "military",
    "defense",
    "defence",
    "regiment",
    "brigade",
    "battalion",
];

const NOT_LOCATIONS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

static WEAPON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\w*(?:missile|rocket|bomb|gun|rifle|tank|aircraft|drone)\w*\b")
        .expect("static regex")
});

static CAPITALIZED_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Z][a-zA-Z]+|[A-Z]{2,})(?:\s+(?:of\s+(?:the\s+)?)?(?:[A-Z][a-zA-Z]+|[A-Z]{2,}))*")
        .expect("static regex")
});

static ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3,}$").expect("static regex"));

static TITLED_PERSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:General|Gen\.|Lieutenant|Lt\.|Colonel|Col\.|Major|Maj\.|Captain|Capt\.|Admiral|Adm\.|Brigadier|Minister|President|Secretary|Mr\.|Mrs\.|Ms\.|Dr\.)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})",
    )
    .expect("static regex")
});

static PLACE_AFTER_PREPOSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:in|near|at|from|across|along)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})")
        .expect("static regex")
});

fn strip_determiner(phrase: &str) -> &str {
    phrase.strip_prefix("The ").unwrap_or(phrase).trim()
}

fn last_word_lower(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_lowercase()
}

impl PatternEntityExtractor {
    fn organizations(text: &str, extracted: &mut ExtractedEntities) {
        for found in CAPITALIZED_PHRASE.find_iter(text) {
            let phrase = strip_determiner(found.as_str());
            if phrase.chars().count() < MIN_ENTITY_CHARS {
                continue;
            }

            let is_org = ORGANIZATION_HEADS.contains(&last_word_lower(phrase).as_str())
                || ACRONYM.is_match(phrase);
            if !is_org {
                continue;
            }

            extracted.organizations.insert(phrase.to_string());

            let lower = phrase.to_lowercase();
            if MILITARY_TERMS.iter().any(|term| lower.contains(term)) {
                extracted.military_units.insert(phrase.to_string());
            }
        }
    }

    fn persons(text: &str, extracted: &mut ExtractedEntities) {
        for captures in TITLED_PERSON.captures_iter(text) {
            if let Some(name) = captures.get(1) {
                let name = name.as_str().trim();
                if name.chars().count() >= MIN_ENTITY_CHARS {
                    extracted.persons.insert(name.to_string());
                }
            }
        }
    }

    fn locations(text: &str, extracted: &mut ExtractedEntities) {
        for captures in PLACE_AFTER_PREPOSITION.captures_iter(text) {
            let Some(place) = captures.get(1) else {
                continue;
            };
            let place = place.as_str().trim();
            let first_word = place.split_whitespace().next().unwrap_or_default();

            if place.chars().count() < MIN_ENTITY_CHARS
                || first_word == "The"
                || NOT_LOCATIONS.contains(&first_word)
                || ORGANIZATION_HEADS.contains(&last_word_lower(place).as_str())
            {
                continue;
            }
            extracted.locations.insert(place.to_string());
        }
    }

    fn weapons(text: &str, extracted: &mut ExtractedEntities) {
        for found in WEAPON_PATTERN.find_iter(text) {
            if found.as_str().chars().count() >= MIN_WEAPON_CHARS {
                extracted.weapons.insert(found.as_str().to_string());
            }
        }
    }
}

impl EntityExtractor for PatternEntityExtractor {
    fn extract_entities(&self, text: &str) -> ExtractedEntities {
        let mut extracted = ExtractedEntities::new();
        if text.trim().is_empty() {
            return extracted;
        }

        Self::organizations(text, &mut extracted);
        Self::persons(text, &mut extracted);
        Self::locations(text, &mut extracted);
        Self::weapons(text, &mut extracted);

        debug!(
            target: TARGET_ENTITY,
            "Extracted {} entities ({} persons, {} orgs, {} locations, {} units, {} weapons)",
            extracted.len(),
            extracted.persons.len(),
            extracted.organizations.len(),
            extracted.locations.len(),
            extracted.military_units.len(),
            extracted.weapons.len()
        );

        extracted
    }
}
