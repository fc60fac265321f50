// tests/ingest_fallback.rs
//
// The loader's fallback chain over real files plus a failing source.

use std::fs;

use ai_news_feed::error::LoadError;
use ai_news_feed::ingest::providers::JsonFileSource;
use ai_news_feed::ingest::types::{DataSource, RawNewsItem};
use ai_news_feed::ingest::FallbackLoader;
use ai_news_feed::item::{Category, ItemId};
use ai_news_feed::store::Origin;

struct Broken;

#[async_trait::async_trait]
impl DataSource for Broken {
    async fn fetch(&self) -> anyhow::Result<Vec<RawNewsItem>> {
        anyhow::bail!("connection refused")
    }
    fn name(&self) -> &str {
        "broken"
    }
}

const COLLECTED: &str = r#"[
  {"id": "tc_1", "title": "Lab ships new model", "category": "tech",
   "source": "TechCrunch AI", "importance_score": 8.9,
   "published_date": "2025-12-18T09:00:00Z", "keywords": ["model"]},
  {"title": "Parliament passes AI law", "source": "Wired AI",
   "importance_score": 7.1, "published_date": "2025-12-18 07:30:00"},
  42,
  {"id": "tc_1", "title": "Duplicate of the first record"}
]"#;

#[tokio::test]
async fn first_working_source_wins() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("latest_news.json");
    let collected = dir.path().join("collected_news.json");
    fs::write(&collected, COLLECTED).unwrap();

    let loader = FallbackLoader::new(
        vec![
            Box::new(Broken),
            Box::new(JsonFileSource::new("latest", &missing)),
            Box::new(JsonFileSource::new("collected", &collected)),
        ],
        true,
    );
    assert_eq!(loader.source_names(), vec!["broken", "latest", "collected"]);

    let snap = loader.load().await.expect("collected file loads");
    assert_eq!(snap.origin, Origin::Source("collected".into()));
    assert!(snap.origin.is_real());
    // the non-object record and the duplicate id are dropped
    assert_eq!(snap.items.len(), 2);
    assert_eq!(snap.items[0].id, ItemId::Text("tc_1".into()));
    assert_eq!(snap.items[0].importance, Some(8.9));

    let second = &snap.items[1];
    assert!(matches!(second.id, ItemId::Text(ref s) if s.starts_with("Wired AI_")));
    assert_eq!(second.category, Category::Policy);
    assert!(second.published_at.is_some());
}

#[tokio::test]
async fn empty_file_falls_through_to_next_source() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.json");
    let wrapped = dir.path().join("wrapped.json");
    fs::write(&empty, "[]").unwrap();
    fs::write(
        &wrapped,
        r#"{"news": [{"id": 7, "title": "Wrapped item", "category": "industry"}]}"#,
    )
    .unwrap();

    let loader = FallbackLoader::new(
        vec![
            Box::new(JsonFileSource::new("empty", &empty)),
            Box::new(JsonFileSource::new("wrapped", &wrapped)),
        ],
        false,
    );
    let snap = loader.load().await.unwrap();
    assert_eq!(snap.origin.label(), "wrapped");
    assert_eq!(snap.items[0].id, ItemId::Num(7));
}

#[tokio::test]
async fn mock_set_when_everything_fails() {
    let loader = FallbackLoader::new(vec![Box::new(Broken)], true);
    let snap = loader.load().await.unwrap();
    assert_eq!(snap.origin, Origin::Mock);
    assert!(!snap.origin.is_real());
    assert_eq!(snap.items.len(), 12);
}

#[tokio::test]
async fn disabled_fallback_surfaces_the_error() {
    let loader = FallbackLoader::new(vec![Box::new(Broken)], false);
    match loader.load().await {
        Err(LoadError::AllSourcesFailed { attempted, last }) => {
            assert_eq!(attempted, 1);
            assert!(last.contains("connection refused"), "got {last}");
        }
        other => panic!("expected AllSourcesFailed, got {other:?}"),
    }

    let none = FallbackLoader::new(Vec::new(), false);
    assert_eq!(none.load().await.unwrap_err(), LoadError::NoSources);
}
