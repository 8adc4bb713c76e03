use anyhow::{Context, Result};
use argus_defense::classifier::{Classifier, RelevanceGate};
use argus_defense::config::Config;
use argus_defense::entity::{EntityExtractor, PatternEntityExtractor};
use argus_defense::extract::{word_count, ContentExtractor};
use argus_defense::fetcher::{HttpPageSource, PageSource};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    argus_defense::logging::configure_logging();

    let url = env::args()
        .nth(1)
        .context("Usage: test_extraction <url>")?;
    let config = Config::from_env();

    let pages = HttpPageSource::new(config.fetch.request_timeout)?;
    let markup = pages.fetch_page(&url).await?;
    println!("Fetched {} bytes from {}", markup.len(), url);

    let article = match ContentExtractor::new(config.fetch.min_content_length).extract(&markup, &url) {
        Ok(article) => article,
        Err(reason) => {
            println!("Extraction failed: {}", reason);
            return Ok(());
        }
    };

    println!("Title: {}", article.title);
    println!(
        "Body: {} chars, {} words",
        article.body_text.chars().count(),
        word_count(&article.body_text)
    );
    match article.publication_date {
        Some(date) => println!("Published: {}", date),
        None => println!("Published: unknown"),
    }
    println!(
        "Relevance gate: {}",
        if RelevanceGate::default().accepts(&article.title, &article.body_text) {
            "accepted"
        } else {
            "rejected"
        }
    );

    let classification = Classifier::new(config.scoring).classify(&article.body_text);
    println!("\nClassification ({}):", config.scoring);
    println!("{}", serde_json::to_string_pretty(&classification)?);

    let entities = PatternEntityExtractor.extract_entities(&article.body_text);
    println!("\nEntities:");
    for entity in entities.to_entities() {
        println!("  {:<14} {}", entity.entity_type.as_str(), entity.text);
    }

    let preview: String = article.body_text.chars().take(500).collect();
    println!("\nPreview:\n{}", preview);

    Ok(())
}
