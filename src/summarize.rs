//! Optional per-section briefing: a provider turns a bucket's top headlines
//! into a short bullet summary that rides along with the exported snapshot.
//!
//! Providers sit behind [`Summarizer`]. The remote one is only built when
//! an API key is present; [`CachingSummarizer`] adds a memory cache and a
//! daily call limit in front of any provider.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::feed::FeedSnapshot;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "DAILY_BRIEF_SUMMARY_MODEL";
pub const ENV_DAILY_LIMIT: &str = "DAILY_BRIEF_SUMMARY_DAILY_LIMIT";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_DAILY_LIMIT: u32 = 200;

/// Headlines per section sent to the provider.
pub const MAX_HEADLINES: usize = 15;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `headlines` of `section`. Implementations see at most
    /// [`MAX_HEADLINES`] entries.
    async fn summarize(&self, section: &str, headlines: &[String]) -> Result<String>;

    fn name(&self) -> &'static str;
}

pub fn build_prompt(section: &str, headlines: &[String]) -> String {
    let mut prompt = format!(
        "You are a professional news editor. Summarize the following news headlines \
         from the {section} section into a concise, insightful daily briefing.\n\
         Requirements:\n\
         - Output in English (translate headlines that are not in English).\n\
         - Use 3-4 bullet points.\n\
         - Keep a professional, objective, journalistic tone.\n\
         - Do not include introductory text; return only the bullet points.\n\n\
         Headlines:\n"
    );
    for h in headlines.iter().take(MAX_HEADLINES) {
        prompt.push_str("- ");
        prompt.push_str(h.trim());
        prompt.push('\n');
    }
    prompt
}

/// Google Generative Language `generateContent` provider.
pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("daily-brief/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("summary http client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// `None` when `GEMINI_API_KEY` is unset or blank.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(key) = std::env::var(ENV_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty())
        else {
            return Ok(None);
        };
        let model = std::env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(key.trim(), model).map(Some)
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateReq<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn first_text(resp: GenerateResp) -> Option<String> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, section: &str, headlines: &[String]) -> Result<String> {
        let prompt = build_prompt(section, headlines);
        let req = GenerateReq {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };
        let url = format!("{GEMINI_BASE}/{}:generateContent", self.model);
        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .context("summary request")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("summary provider returned {status}"));
        }
        let body: GenerateResp = resp.json().await.context("summary response")?;
        first_text(body).ok_or_else(|| anyhow!("summary provider returned no text"))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Debug)]
struct DailyCounter {
    day: NaiveDate,
    count: u32,
}

/// Memory cache keyed by section and headlines, plus a per-day cap on
/// provider calls. Cache hits do not count against the cap.
pub struct CachingSummarizer<S: Summarizer> {
    inner: S,
    daily_limit: u32,
    cache: Mutex<HashMap<String, String>>,
    counter: Mutex<DailyCounter>,
}

impl<S: Summarizer> CachingSummarizer<S> {
    pub fn new(inner: S, daily_limit: u32) -> Self {
        Self {
            inner,
            daily_limit,
            cache: Mutex::new(HashMap::new()),
            counter: Mutex::new(DailyCounter {
                day: Utc::now().date_naive(),
                count: 0,
            }),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Provider calls made today.
    pub fn calls_today(&self) -> u32 {
        self.counter.lock().map(|c| c.count).unwrap_or(0)
    }

    fn cache_key(section: &str, headlines: &[String]) -> String {
        let mut h = Sha256::new();
        h.update(section.as_bytes());
        for line in headlines.iter().take(MAX_HEADLINES) {
            h.update([0u8]);
            h.update(line.as_bytes());
        }
        h.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }

    fn take_slot(&self) -> Result<()> {
        let mut c = self
            .counter
            .lock()
            .map_err(|_| anyhow!("summary counter poisoned"))?;
        let today = Utc::now().date_naive();
        if c.day != today {
            c.day = today;
            c.count = 0;
        }
        if c.count >= self.daily_limit {
            return Err(anyhow!("daily summary limit of {} reached", self.daily_limit));
        }
        c.count += 1;
        Ok(())
    }
}

#[async_trait]
impl<S: Summarizer> Summarizer for CachingSummarizer<S> {
    async fn summarize(&self, section: &str, headlines: &[String]) -> Result<String> {
        let key = Self::cache_key(section, headlines);
        let hit = self.cache.lock().ok().and_then(|c| c.get(&key).cloned());
        if let Some(hit) = hit {
            return Ok(hit);
        }

        self.take_slot()?;
        let fresh = self.inner.summarize(section, headlines).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, fresh.clone());
        }
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Build the production summarizer from the environment, or `None` when no
/// API key is configured.
pub fn summarizer_from_env() -> Result<Option<CachingSummarizer<GeminiSummarizer>>> {
    let limit = std::env::var(ENV_DAILY_LIMIT)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_DAILY_LIMIT);
    Ok(GeminiSummarizer::from_env()?.map(|p| CachingSummarizer::new(p, limit)))
}

/// One summary per non-empty bucket. A failing section is logged and left
/// out; it never fails the export.
pub async fn summarize_sections(
    summarizer: &dyn Summarizer,
    snapshot: &FeedSnapshot,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (section, bucket) in &snapshot.sections {
        if bucket.is_empty() {
            continue;
        }
        let headlines: Vec<String> = bucket
            .iter()
            .take(MAX_HEADLINES)
            .map(|a| a.title.clone())
            .collect();
        match summarizer.summarize(section, &headlines).await {
            Ok(text) if !text.trim().is_empty() => {
                out.insert(section.clone(), text.trim().to_string());
            }
            Ok(_) => {
                tracing::debug!(target: "export", %section, provider = summarizer.name(), "empty summary skipped");
            }
            Err(e) => {
                tracing::warn!(target: "export", %section, provider = summarizer.name(), error = %e, "summary failed");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for Echo {
        async fn summarize(&self, section: &str, headlines: &[String]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{section}: {}", headlines.len()))
        }
        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Headline {i}")).collect()
    }

    #[test]
    fn prompt_caps_headlines() {
        let p = build_prompt("world", &lines(20));
        assert!(p.contains("world section"));
        assert!(p.contains("- Headline 14\n"));
        assert!(!p.contains("Headline 15"));
        assert!(p.contains("3-4 bullet points"));
    }

    #[test]
    fn response_text_is_joined_and_trimmed() {
        let body: GenerateResp = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":" * one\n"},{"text":"* two "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(body).as_deref(), Some("* one\n* two"));

        let empty: GenerateResp = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(first_text(empty).is_none());
    }

    #[tokio::test]
    async fn cache_hits_skip_the_provider() {
        let s = CachingSummarizer::new(Echo { calls: AtomicUsize::new(0) }, 10);
        let a = s.summarize("world", &lines(3)).await.unwrap();
        let b = s.summarize("world", &lines(3)).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(s.inner().calls.load(Ordering::SeqCst), 1);
        s.summarize("india", &lines(3)).await.unwrap();
        assert_eq!(s.calls_today(), 2);
    }

    #[tokio::test]
    async fn daily_limit_stops_provider_calls() {
        let s = CachingSummarizer::new(Echo { calls: AtomicUsize::new(0) }, 1);
        s.summarize("world", &lines(2)).await.unwrap();
        let err = s.summarize("india", &lines(2)).await.unwrap_err();
        assert!(err.to_string().contains("limit"), "{err}");
        // Cached entries are still served.
        assert!(s.summarize("world", &lines(2)).await.is_ok());
        assert_eq!(s.inner().calls.load(Ordering::SeqCst), 1);
    }
}
