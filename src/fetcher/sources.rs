//! News sources and the sections scanned on each of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::environment::split_trimmed;
use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub base_url: String,
    pub sections: Vec<String>,
}

impl Source {
    pub fn new(name: &str, base_url: &str, sections: &[&str]) -> Self {
        Source {
            name: name.to_string(),
            base_url: base_url.to_string(),
            sections: sections.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn base(&self) -> Result<Url, FetchError> {
        // Without a trailing slash, joining would replace the last path segment.
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).map_err(|e| FetchError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Listing page URL for every configured section.
    pub fn section_urls(&self) -> Result<Vec<Url>, FetchError> {
        let base = self.base()?;
        self.sections
            .iter()
            .map(|section| {
                base.join(section.trim_start_matches('/'))
                    .map_err(|e| FetchError::InvalidUrl {
                        url: format!("{}{}", base, section),
                        reason: e.to_string(),
                    })
            })
            .collect()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.base_url)
    }
}

/// Parses `name|base_url|section1,section2`.
impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').map(str::trim).collect();
        let [name, base_url, sections] = parts.as_slice() else {
            return Err(format!(
                "expected name|base_url|sections, got {} fields",
                parts.len()
            ));
        };

        if name.is_empty() {
            return Err("source name is empty".to_string());
        }
        let sections = split_trimmed(sections, ',');
        if sections.is_empty() {
            return Err(format!("source '{}' has no sections", name));
        }

        let source = Source {
            name: name.to_string(),
            base_url: base_url.to_string(),
            sections,
        };
        source.base().map_err(|e| e.to_string())?;
        Ok(source)
    }
}

/// Built-in catalogue: Indian defence outlets followed by international wires.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(
            "Indian Defence News",
            "https://www.indiandefencenews.in/",
            &["defence", "security", "terrorism", "border-security"],
        ),
        Source::new(
            "Financial Express Defence",
            "https://www.financialexpress.com/",
            &["defence", "defence/security"],
        ),
        Source::new(
            "Economic Times Defence",
            "https://economictimes.indiatimes.com/",
            &["news/defence", "news/politics-and-nation"],
        ),
        Source::new(
            "Hindustan Times India News",
            "https://www.hindustantimes.com/",
            &["india-news", "india-news/terrorism", "world-news"],
        ),
        Source::new(
            "Times of India India",
            "https://timesofindia.indiatimes.com/",
            &["india", "world", "india/mumbai-terror-attacks"],
        ),
        Source::new(
            "BBC Security",
            "https://www.bbc.com/",
            &["news/world", "news/uk", "news/technology"],
        ),
        Source::new(
            "Reuters World",
            "https://www.reuters.com/",
            &["world", "technology", "world/middle-east"],
        ),
        Source::new(
            "CNN Security",
            "https://edition.cnn.com/",
            &["world", "asia", "middleeast"],
        ),
    ]
}
