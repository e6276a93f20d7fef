// src/classify.rs
//! Section classifier: trusts the adapter-declared section, nothing else.

use std::collections::BTreeMap;

use crate::article::{Article, UNCATEGORIZED};

/// Section key an article belongs to.
pub fn classify(article: &Article) -> &str {
    let s = article.section.trim();
    if s.is_empty() {
        UNCATEGORIZED
    } else {
        s
    }
}

/// Group articles by their classified section, preserving input order
/// within each bucket.
pub fn rebucket<I>(articles: I) -> BTreeMap<String, Vec<Article>>
where
    I: IntoIterator<Item = Article>,
{
    let mut out: BTreeMap<String, Vec<Article>> = BTreeMap::new();
    for a in articles {
        let key = classify(&a).to_string();
        out.entry(key).or_default().push(a);
    }
    out
}
