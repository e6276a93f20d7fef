// src/ingest/rss.rs
//! RSS 2.0 → `Article` parsing.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::normalize_text;
use super::types::FeedSpec;
use crate::article::Article;

const TITLE_MAX_CHARS: usize = 300;
const DESCRIPTION_MAX_CHARS: usize = 1500;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "category", default)]
    category: Vec<TextNode>,
    /// Aggregator feeds (Google News) name the real outlet here.
    source: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

pub fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

/// Map a free-form category label onto a section key.
pub fn section_for_category(category: &str) -> Option<&'static str> {
    let c = category.to_lowercase();
    let table: [(&[&str], &str); 8] = [
        (&["tamil nadu", "chennai"], "tamil_nadu"),
        (&["opinion", "editorial"], "editorial"),
        (&["business", "economy", "market"], "business"),
        (&["technology", "tech", "science"], "technology"),
        (&["sport", "cricket", "football"], "sports"),
        (&["entertainment", "cinema", "movie"], "entertainment"),
        (&["world", "international"], "world"),
        (&["india", "national"], "india"),
    ];
    table
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| c.contains(n)))
        .map(|(_, key)| *key)
}

/// Entities that are valid HTML but not XML show up in real feeds.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

/// Parse one feed document. Items without a title or link are skipped.
pub fn parse_feed(xml: &str, feed: &FeedSpec) -> Result<Vec<Article>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean)
        .with_context(|| format!("parsing rss from {}", feed.source_key))?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = normalize_text(it.title.as_deref().unwrap_or_default(), TITLE_MAX_CHARS);
        let link = it.link.as_deref().unwrap_or_default().trim().to_string();
        if title.is_empty() || link.is_empty() {
            continue;
        }

        let categories: Vec<&str> = it.category.iter().map(|c| c.value.trim()).collect();
        let section = if feed.mixed {
            categories
                .iter()
                .find_map(|c| section_for_category(c))
                .unwrap_or(feed.section.as_str())
                .to_string()
        } else {
            feed.section.clone()
        };

        let source = it
            .source
            .as_ref()
            .map(|s| s.value.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(feed.source_name.as_str())
            .to_string();

        let mut article = Article::new(title, link, source, section);
        article.description = it
            .description
            .as_deref()
            .map(|d| normalize_text(d, DESCRIPTION_MAX_CHARS))
            .filter(|d| !d.is_empty());
        article.published_at = it.pub_date.as_deref().and_then(parse_rfc2822);
        article.breaking_hint = categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case("breaking") || c.eq_ignore_ascii_case("breaking news"));
        out.push(article);
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_items_parsed_total").increment(out.len() as u64);

    Ok(out)
}
