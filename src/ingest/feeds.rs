// src/ingest/feeds.rs
//! Feed registry: built-in defaults or a TOML/JSON file.

use serde::Deserialize;
use std::path::Path;

use super::types::FeedSpec;
use crate::config::{load_document, resolve_path};
use crate::error::{BriefError, Result};

pub const ENV_FEEDS_PATH: &str = "DAILY_BRIEF_FEEDS_PATH";

#[derive(Debug, Deserialize)]
struct FeedsDoc {
    feeds: Vec<FeedSpec>,
}

/// Load a registry from an explicit path (`[[feeds]]` tables in TOML, or
/// `{"feeds": [...]}` in JSON).
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSpec>> {
    let doc: FeedsDoc = load_document(path)?;
    clean_feeds(doc.feeds)
}

/// Load using env var + fallbacks:
/// 1) $DAILY_BRIEF_FEEDS_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in registry
pub fn load_feeds_default() -> Result<Vec<FeedSpec>> {
    match resolve_path(ENV_FEEDS_PATH, &["config/feeds.toml", "config/feeds.json"])? {
        Some(p) => load_feeds_from(&p),
        None => Ok(default_feeds()),
    }
}

fn clean_feeds(items: Vec<FeedSpec>) -> Result<Vec<FeedSpec>> {
    let mut out: Vec<FeedSpec> = Vec::with_capacity(items.len());
    for mut f in items {
        f.source_key = f.source_key.trim().to_string();
        f.section = f.section.trim().to_string();
        f.url = f.url.trim().to_string();
        if f.source_key.is_empty() || f.section.is_empty() || f.url.is_empty() {
            return Err(BriefError::config(format!(
                "feed entry needs source_key, section and url: {f:?}"
            )));
        }
        if f.source_name.trim().is_empty() {
            f.source_name = f.source_key.clone();
        }
        if !out.iter().any(|o| o.url == f.url && o.section == f.section) {
            out.push(f);
        }
    }
    Ok(out)
}

fn feed(key: &str, name: &str, section: &str, url: &str, mixed: bool) -> FeedSpec {
    FeedSpec {
        source_key: key.to_string(),
        source_name: name.to_string(),
        section: section.to_string(),
        url: url.to_string(),
        mixed,
    }
}

/// Built-in registry.
pub fn default_feeds() -> Vec<FeedSpec> {
    const GN: &str = "https://news.google.com/rss/search?hl=ta&gl=IN&ceid=IN:ta&q=";
    vec![
        feed("the_hindu", "The Hindu", "india", "https://www.thehindu.com/news/national/feeder/default.rss", false),
        feed("the_hindu", "The Hindu", "business", "https://www.thehindu.com/business/feeder/default.rss", false),
        feed("the_hindu", "The Hindu", "tamil_nadu", "https://www.thehindu.com/news/national/tamil-nadu/feeder/default.rss", false),
        feed("indian_express", "Indian Express", "world", "https://indianexpress.com/feed/", true),
        feed("indian_express", "Indian Express", "india", "https://indianexpress.com/section/india/feed/", false),
        feed("indian_express", "Indian Express", "world", "https://indianexpress.com/section/world/feed/", false),
        feed("indian_express", "Indian Express", "editorial", "https://indianexpress.com/section/opinion/editorials/feed/", false),
        feed("dinamani", "Dinamani", "tamil_nadu", &format!("{GN}site:dinamani.com+when:1d"), false),
        feed("dinamani", "Dinamani", "tamil_nadu", &format!("{GN}site:dinamani.com+Tamil+Nadu+when:1d"), false),
        feed("daily_thanthi", "Daily Thanthi", "tamil_nadu", &format!("{GN}site:dailythanthi.com+when:1d"), false),
        feed("daily_thanthi", "Daily Thanthi", "entertainment", &format!("{GN}site:dailythanthi.com+cinema+when:1d"), false),
        feed("bbc", "BBC News", "world", "https://feeds.bbci.co.uk/news/world/rss.xml", false),
        feed("bbc", "BBC News", "business", "https://feeds.bbci.co.uk/news/business/rss.xml", false),
        feed("bbc", "BBC News", "technology", "https://feeds.bbci.co.uk/news/technology/rss.xml", false),
        feed("bbc", "BBC News", "sports", "https://feeds.bbci.co.uk/sport/rss.xml", false),
    ]
}
