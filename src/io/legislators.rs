use anyhow::{Context, Result};
use tracing::info;

use crate::models::LegislatorEntry;
use crate::stages::LegislatorRegistry;

pub const CURRENT_LEGISLATORS_URL: &str =
    "https://unitedstates.github.io/congress-legislators/legislators-current.json";
pub const HISTORICAL_LEGISLATORS_URL: &str =
    "https://unitedstates.github.io/congress-legislators/legislators-historical.json";

/// Load and index every source (local path or http(s) URL)
pub async fn load_registry(sources: &[String]) -> Result<LegislatorRegistry> {
    let mut entries = Vec::new();

    for source in sources {
        let loaded = load_entries(source).await?;
        info!("Loaded {} legislators from {}", loaded.len(), source);
        entries.extend(loaded);
    }

    let registry = LegislatorRegistry::from_entries(entries);
    info!(
        "Legislator registry: {} legislators, {} terms",
        registry.legislator_count(),
        registry.term_count()
    );
    Ok(registry)
}

async fn load_entries(source: &str) -> Result<Vec<LegislatorEntry>> {
    let content = if is_url(source) {
        let response = reqwest::get(source)
            .await
            .with_context(|| format!("Failed to fetch legislator data from {}", source))?;

        if !response.status().is_success() {
            anyhow::bail!("Legislator data request failed: {} - {}", response.status(), source);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read legislator data from {}", source))?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read file: {:?}", source))?
    };

    parse_legislators_json(&content).with_context(|| format!("Invalid legislator data in {}", source))
}

/// Parse a congress-legislators JSON array
pub fn parse_legislators_json(json: &str) -> Result<Vec<LegislatorEntry>> {
    serde_json::from_str(json).context("Failed to parse legislator JSON")
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
