// tests/breaking_shortlist.rs
//
// Breaking shortlist as published by the engine.

mod common;

use common::{article, articles, harness, settings, StubAdapter};

#[tokio::test]
async fn shortlist_is_capped_at_three() {
    let flagged: Vec<_> = (0..5)
        .map(|i| article("BBC News", &format!("Breaking: storm update {i}"), "world", 10 + i))
        .collect();
    let h = harness(
        settings(&[("world", 10)]),
        StubAdapter::new().with_articles("world", flagged),
    );

    h.engine.refresh(None).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.breaking_news.len(), 3);
    assert!(snap.breaking_news.iter().all(|a| a.is_breaking));
    // Youngest flagged items score highest.
    assert_eq!(snap.breaking_news[0].title, "Breaking: storm update 0");
    for pair in snap.breaking_news.windows(2) {
        assert!(pair[0].breaking_score >= pair[1].breaking_score);
    }
}

#[tokio::test]
async fn empty_without_markers_or_high_scores() {
    let h = harness(
        settings(&[("world", 10), ("india", 10)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 5))
            .with_articles("india", articles("india", 5)),
    );

    h.engine.refresh(None).await;

    assert!(h.feed.snapshot().breaking_news.is_empty());
}

#[tokio::test]
async fn corroborated_story_qualifies_without_marker() {
    let title = "Cyclone makes landfall near Chennai coast";
    let h = harness(
        settings(&[("world", 10), ("india", 10)]),
        StubAdapter::new()
            .with_articles(
                "world",
                vec![
                    article("BBC News", title, "world", 30),
                    article("Indian Express", title, "world", 35),
                ],
            )
            .with_articles(
                "india",
                vec![
                    article("The Hindu", title, "india", 25),
                    article("The Hindu", "Budget session opens quietly", "india", 30),
                ],
            ),
    );

    h.engine.refresh(None).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.breaking_news.len(), 3);
    assert!(snap.breaking_news.iter().all(|a| a.title == title));
    assert!(snap.breaking_news.iter().all(|a| !a.is_breaking));
    assert!(snap.breaking_news.iter().all(|a| a.breaking_score > 1.5));
}

#[tokio::test]
async fn adapter_hint_marks_article_breaking() {
    let hinted = article("The Hindu", "Assembly adjourned after walkout", "india", 600).flagged_breaking();
    let h = harness(
        settings(&[("india", 10)]),
        StubAdapter::new().with_articles("india", vec![hinted]),
    );

    h.engine.refresh(None).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.breaking_news.len(), 1);
    assert!(snap.breaking_news[0].is_breaking);
    assert!(snap.section("india")[0].is_breaking);
}
