// tests/engine_refresh.rs
//
// Refresh-cycle behaviour of the aggregation engine against a stub adapter.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Barrier, Notify};

use common::{article, articles, harness, settings, StubAdapter};
use daily_brief::config::Settings;
use daily_brief::feed::FeedSnapshot;

fn assert_sorted(snap: &FeedSnapshot) {
    for (key, bucket) in &snap.sections {
        for pair in bucket.windows(2) {
            assert!(
                pair[0].impact_score >= pair[1].impact_score,
                "bucket {key} not sorted: {} < {}",
                pair[0].impact_score,
                pair[1].impact_score
            );
        }
    }
}

#[tokio::test]
async fn world_and_india_scenario_publishes_everything_sorted() {
    let h = harness(
        settings(&[("world", 5), ("india", 3)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 8))
            .with_articles("india", articles("india", 4)),
    );

    h.engine.refresh(None).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.section("world").len(), 8);
    assert_eq!(snap.section("india").len(), 4);
    assert!(snap.errors.is_empty(), "errors: {:?}", snap.errors);
    assert!(!snap.loading);
    assert_eq!(snap.last_fetch, Some(common::now()));
    assert_sorted(&snap);

    let mut calls = h.adapter.calls();
    calls.sort();
    assert_eq!(
        calls,
        vec![("india".to_string(), 8), ("world".to_string(), 10)],
        "target = count + overfetch"
    );
}

#[tokio::test]
async fn repeated_refresh_is_idempotent() {
    let h = harness(
        settings(&[("world", 5), ("business", 5), ("sports", 5)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 6))
            .with_articles("business", articles("business", 3))
            .with_articles("sports", articles("sports", 4)),
    );

    h.engine.refresh(None).await;
    let first = h.feed.snapshot();
    h.engine.refresh(None).await;
    let second = h.feed.snapshot();

    assert_eq!(first.sections, second.sections);
    assert_eq!(first.breaking_news, second.breaking_news);
}

#[tokio::test]
async fn section_failure_is_recorded_not_raised() {
    let h = harness(
        settings(&[("world", 5), ("india", 5)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 3))
            .failing("india", "connection reset"),
    );

    h.engine.refresh(None).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.section("world").len(), 3);
    assert!(snap.sections.contains_key("india"));
    assert!(snap.section("india").is_empty());
    let msg = snap.errors.get("india").expect("india error recorded");
    assert!(msg.contains("connection reset"), "{msg}");
    assert!(!snap.errors.contains_key("world"));
    assert!(!snap.loading);

    // Recovery clears the entry.
    h.adapter.set_articles("india", articles("india", 2));
    h.engine.refresh(None).await;
    let snap = h.feed.snapshot();
    assert!(snap.errors.is_empty());
    assert_eq!(snap.section("india").len(), 2);
}

#[tokio::test]
async fn missing_configuration_leaves_snapshot_untouched() {
    let h = harness(
        settings(&[("world", 5)]),
        StubAdapter::new().with_articles("world", articles("world", 3)),
    );
    h.engine.refresh(None).await;
    let before = h.feed.snapshot();

    h.store.clear();
    let mut rx = h.feed.subscribe();
    h.engine.refresh(None).await;

    assert_eq!(h.feed.snapshot(), before);
    assert_eq!(h.adapter.call_count(), 1, "no fetch without configuration");
    assert!(rx.try_recv().is_err(), "nothing published");
}

#[tokio::test]
async fn two_batches_publish_high_priority_first() {
    let h = harness(
        settings(&[("world", 5), ("sports", 5), ("business", 5), ("editorial", 5)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 2))
            .with_articles("business", articles("business", 2))
            .with_articles("sports", articles("sports", 2))
            .with_articles("editorial", articles("editorial", 2)),
    );
    let mut rx = h.feed.subscribe();

    h.engine.refresh(None).await;

    let mut published = Vec::new();
    while let Ok(s) = rx.try_recv() {
        published.push(s);
    }
    let waves: Vec<_> = published
        .iter()
        .filter(|s| s.loading && !s.sections.is_empty())
        .collect();
    assert!(waves.len() >= 2, "expected a publish per wave, got {}", waves.len());

    let first = waves[0];
    assert!(first.sections.contains_key("world"));
    assert!(first.sections.contains_key("business"));
    assert!(!first.sections.contains_key("sports"));
    assert!(!first.sections.contains_key("editorial"));

    let last = published.last().unwrap();
    assert!(!last.loading);
    assert_eq!(last.section("sports").len(), 2);

    // Every high-priority fetch is issued before any low-priority one.
    let order: Vec<String> = h.adapter.calls().into_iter().map(|(s, _)| s).collect();
    let last_high = order
        .iter()
        .rposition(|s| s == "world" || s == "business")
        .unwrap();
    let first_low = order
        .iter()
        .position(|s| s == "sports" || s == "editorial")
        .unwrap();
    assert!(last_high < first_low, "{order:?}");
}

#[tokio::test]
async fn articles_land_in_their_declared_section() {
    let mut world = articles("world", 3);
    world.push(article("Mint", "Rupee slips against dollar", "business", 20));
    let h = harness(
        settings(&[("world", 5), ("sports", 5)]),
        StubAdapter::new()
            .with_articles("world", world)
            .with_articles("sports", vec![article("BBC News", "Late winner seals derby", "", 40)]),
    );

    h.engine.refresh(None).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.section("world").len(), 3);
    assert!(snap.section("world").iter().all(|a| a.section != "business"));
    assert_eq!(snap.section("business").len(), 1);
    assert_eq!(snap.section("uncategorized").len(), 1);
    assert!(snap.section("sports").is_empty());
}

#[tokio::test]
async fn strict_freshness_hides_stale_articles() {
    let batch = vec![
        article("BBC News", "Old summit coverage", "world", 30 * 60),
        article("BBC News", "Fresh summit coverage", "world", 30),
    ];

    let mut strict = settings(&[("world", 5)]);
    strict.freshness_limit_hours = 24;
    strict.strict_freshness = true;
    let h = harness(strict, StubAdapter::new().with_articles("world", batch.clone()));
    h.engine.refresh(None).await;
    let titles: Vec<_> = h
        .feed
        .snapshot()
        .section("world")
        .iter()
        .map(|a| a.title.clone())
        .collect();
    assert_eq!(titles, vec!["Fresh summit coverage"]);

    let lenient: Settings = settings(&[("world", 5)]);
    let h = harness(lenient, StubAdapter::new().with_articles("world", batch));
    h.engine.refresh(None).await;
    let snap = h.feed.snapshot();
    let titles: Vec<_> = snap.section("world").iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Fresh summit coverage", "Old summit coverage"]);
}

#[tokio::test]
async fn requested_subset_and_disabled_sections() {
    let mut s = settings(&[("world", 5), ("india", 5), ("sports", 5)]);
    s.sections.get_mut("sports").unwrap().enabled = false;
    let h = harness(
        s,
        StubAdapter::new()
            .with_articles("world", articles("world", 2))
            .with_articles("india", articles("india", 2))
            .with_articles("sports", articles("sports", 2)),
    );

    let only_india: BTreeSet<String> = ["india".to_string()].into();
    h.engine.refresh(Some(&only_india)).await;
    let calls: Vec<String> = h.adapter.calls().into_iter().map(|(s, _)| s).collect();
    assert_eq!(calls, vec!["india"]);
    assert!(h.feed.snapshot().section("world").is_empty());

    h.engine.refresh(None).await;
    let calls: Vec<String> = h.adapter.calls().into_iter().map(|(s, _)| s).collect();
    assert!(!calls.contains(&"sports".to_string()), "disabled section fetched");
    assert_eq!(h.feed.snapshot().section("world").len(), 2);
}

#[tokio::test]
async fn low_priority_article_tagged_world_joins_world_bucket() {
    let h = harness(
        settings(&[("world", 5), ("sports", 5)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 3))
            .with_articles(
                "sports",
                vec![
                    article("The Hindu", "Envoys meet ahead of summit", "world", 15),
                    article("BBC News", "Late winner seals derby", "sports", 40),
                ],
            ),
    );
    let mut rx = h.feed.subscribe();

    h.engine.refresh(None).await;

    let mut published = Vec::new();
    while let Ok(s) = rx.try_recv() {
        published.push(s);
    }
    let first_wave = published
        .iter()
        .find(|s| s.loading && s.sections.contains_key("world"))
        .expect("high-priority wave published");
    assert_eq!(first_wave.section("world").len(), 3);

    let snap = h.feed.snapshot();
    let world: Vec<&str> = snap.section("world").iter().map(|a| a.title.as_str()).collect();
    assert_eq!(world.len(), 4, "{world:?}");
    for i in 0..3 {
        let title = format!("world story {i}");
        assert!(world.contains(&title.as_str()), "{title} dropped: {world:?}");
    }
    assert!(world.contains(&"Envoys meet ahead of summit"));
    let sports: Vec<&str> = snap.section("sports").iter().map(|a| a.title.as_str()).collect();
    assert_eq!(sports, vec!["Late winner seals derby"]);
    assert_sorted(&snap);
}

#[tokio::test]
async fn batch_fetches_run_concurrently() {
    // All three high-priority fetches must be in flight at once to pass.
    let barrier = Arc::new(Barrier::new(3));
    let h = harness(
        settings(&[("world", 5), ("india", 5), ("business", 5)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 2))
            .with_articles("india", articles("india", 2))
            .with_articles("business", articles("business", 2))
            .with_barrier(barrier),
    );

    tokio::time::timeout(Duration::from_secs(5), h.engine.refresh(None))
        .await
        .expect("batch fetched one section at a time");

    let snap = h.feed.snapshot();
    for key in ["world", "india", "business"] {
        assert_eq!(snap.section(key).len(), 2, "{key}");
    }
    assert!(!snap.loading);
}

#[tokio::test]
async fn overlapping_cycles_keep_loading_until_the_last_finishes() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        settings(&[("world", 5), ("india", 5)]),
        StubAdapter::new()
            .with_articles("world", articles("world", 2))
            .with_articles("india", articles("india", 2))
            .gated("world", gate.clone()),
    );

    let slow = {
        let engine = h.engine.clone();
        tokio::spawn(async move {
            let only_world: BTreeSet<String> = ["world".to_string()].into();
            engine.refresh(Some(&only_world)).await;
        })
    };
    while h.adapter.call_count() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.engine.cycles_in_flight(), 1);

    let only_india: BTreeSet<String> = ["india".to_string()].into();
    h.engine.refresh(Some(&only_india)).await;

    let snap = h.feed.snapshot();
    assert_eq!(snap.section("india").len(), 2);
    assert!(snap.loading, "world cycle still fetching");
    assert_eq!(h.engine.cycles_in_flight(), 1);

    gate.notify_one();
    slow.await.unwrap();

    let snap = h.feed.snapshot();
    assert!(!snap.loading);
    assert_eq!(snap.section("world").len(), 2);
    assert_eq!(snap.section("india").len(), 2);
    assert_eq!(h.engine.cycles_in_flight(), 0);
}
