// src/ingest/mod.rs
//! Source adapters: feed registry, transports, RSS parsing, and the cache
//! layer the engine invalidates on settings changes.

pub mod adapter;
pub mod cache;
pub mod feeds;
pub mod rss;
pub mod transport;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub use adapter::RssSectionAdapter;
pub use cache::CachedAdapter;
pub use feeds::{default_feeds, load_feeds_default, load_feeds_from};
pub use transport::{FixtureTransport, HttpTransport};
pub use types::{FeedSpec, FeedTransport, SectionAdapter};

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_parsed_total", "Items parsed from feeds.");
        describe_counter!("ingest_feed_errors_total", "Feed fetch/parse errors.");
        describe_counter!("brief_cache_hits_total", "Section fetches served from cache.");
        describe_counter!(
            "brief_cache_invalidations_total",
            "Full cache invalidations."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, fold quotes, collapse
/// whitespace, cap at `max_chars`.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. NBSP)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }

    out
}
