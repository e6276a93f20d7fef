// src/scoring/breaking.rs
//! Breaking-news signal and the top-K shortlist.

use once_cell::sync::OnceCell;
use regex::Regex;

use super::ScoringContext;
use crate::article::Article;

/// Articles above this score qualify for the shortlist even without a marker.
pub const BREAKING_THRESHOLD: f64 = 1.5;
pub const SHORTLIST_LEN: usize = 3;

const MARKER_WEIGHT: f64 = 2.0;
const CORROBORATION_WEIGHT: f64 = 0.75;
const MAX_CORROBORATIONS: usize = 3;
const WINDOW_HOURS: f64 = 2.0;
const RECENCY_WEIGHT: f64 = 0.5;
const TITLE_SIMILARITY: f64 = 0.6;

fn marker_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(breaking|just in|live updates?|news flash)\b").expect("marker regex")
    })
}

/// Explicit breaking marker: adapter flag or a marker phrase in the title.
pub fn has_breaking_marker(article: &Article) -> bool {
    article.breaking_hint || marker_re().is_match(&article.title)
}

/// `corroborations` = number of distinct other sources carrying a similar
/// headline within the breaking window (see `count_corroborations`).
pub fn breaking_score(article: &Article, corroborations: usize, ctx: &ScoringContext<'_>) -> f64 {
    let mut score = 0.0;
    if has_breaking_marker(article) {
        score += MARKER_WEIGHT;
    }
    score += CORROBORATION_WEIGHT * corroborations.min(MAX_CORROBORATIONS) as f64;
    if let Some(age) = article.age_hours(ctx.now) {
        if age < WINDOW_HOURS {
            score += RECENCY_WEIGHT * (1.0 - age / WINDOW_HOURS);
        }
    }
    score
}

fn title_key(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// For each article, the number of distinct *other* sources that published
/// a similar headline within the window. Undated articles never corroborate.
/// Quadratic in the number of articles.
pub fn count_corroborations(articles: &[Article]) -> Vec<usize> {
    let keys: Vec<String> = articles.iter().map(|a| title_key(&a.title)).collect();
    let sources: Vec<String> = articles.iter().map(|a| a.source.to_lowercase()).collect();

    (0..articles.len())
        .map(|i| {
            let Some(at_i) = articles[i].published_at else {
                return 0;
            };
            let mut seen: Vec<&str> = Vec::new();
            for j in 0..articles.len() {
                if i == j || sources[i] == sources[j] || seen.contains(&sources[j].as_str()) {
                    continue;
                }
                let Some(at_j) = articles[j].published_at else {
                    continue;
                };
                let gap_h = (at_i - at_j).num_seconds().abs() as f64 / 3600.0;
                if gap_h > WINDOW_HOURS {
                    continue;
                }
                if strsim::normalized_levenshtein(&keys[i], &keys[j]) >= TITLE_SIMILARITY {
                    seen.push(sources[j].as_str());
                }
            }
            seen.len()
        })
        .collect()
}

/// Top `SHORTLIST_LEN` by breaking score among qualifying articles.
/// Ties keep input order.
pub fn shortlist<'a, I>(articles: I) -> Vec<Article>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut picked: Vec<&Article> = articles
        .into_iter()
        .filter(|a| a.is_breaking || a.breaking_score > BREAKING_THRESHOLD)
        .collect();
    picked.sort_by(|a, b| b.breaking_score.total_cmp(&a.breaking_score));
    picked.into_iter().take(SHORTLIST_LEN).cloned().collect()
}
