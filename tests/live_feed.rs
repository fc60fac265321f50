// tests/live_feed.rs
//
// Interactive session behaviour on paused time: debounced search, throttled
// scroll paging, following store refreshes and session persistence.

use ai_news_feed::controller::{FeedController, Phase};
use ai_news_feed::events::EventBus;
use ai_news_feed::filter::CategoryFilter;
use ai_news_feed::ingest::scheduler::refresh_store;
use ai_news_feed::ingest::types::{DataSource, RawNewsItem};
use ai_news_feed::ingest::FallbackLoader;
use ai_news_feed::live::LiveFeed;
use ai_news_feed::pipeline::{FilterState, Pipeline, Signal};
use ai_news_feed::session::{self, SavedSession};
use ai_news_feed::sort::SortKey;
use ai_news_feed::store::ItemStore;
use tokio::time::{sleep, Duration};

const SEARCH_DELAY: Duration = Duration::from_millis(300);
const SCROLL_WINDOW: Duration = Duration::from_millis(100);

fn live(page_size: usize) -> LiveFeed {
    let ctl = FeedController::new(Pipeline::default(), FilterState::with_page_size(page_size));
    LiveFeed::new(ctl, SEARCH_DELAY, SCROLL_WINDOW)
}

fn mock_loader() -> FallbackLoader {
    FallbackLoader::new(Vec::new(), true)
}

#[tokio::test(start_paused = true)]
async fn search_applies_once_typing_pauses() {
    let store = ItemStore::new();
    let events = EventBus::default();
    let mut feed = live(10);
    let first = feed.reload(&mock_loader(), &store, &events).await.unwrap();
    assert_eq!(first.phase, Phase::Ready);
    assert_eq!(first.page.total, 12);

    let mut rx = feed.subscribe();
    rx.borrow_and_update();
    for partial in ["g", "gp", "gpt", "gpt-5"] {
        feed.search_input(partial);
        sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(feed.controller().state().query, "");

    sleep(SEARCH_DELAY).await;
    assert!(rx.has_changed().unwrap());
    let up = rx.borrow_and_update().clone().unwrap();
    assert_eq!(up.state.query, "gpt-5");
    assert_eq!(up.page.total, 1);
    assert_eq!(up.state.page, 1);
}

#[tokio::test(start_paused = true)]
async fn scroll_paging_is_throttled() {
    let store = ItemStore::new();
    let mut feed = live(3);
    feed.reload(&mock_loader(), &store, &EventBus::default()).await;

    // not near the bottom: nothing happens and the window is not consumed
    assert!(feed.on_scroll(false).is_none());

    let up = feed.on_scroll(true).expect("first scroll loads page 2");
    assert_eq!(up.page.page, 2);
    assert!(feed.on_scroll(true).is_none());
    assert!(feed.on_scroll(true).is_none());
    assert_eq!(feed.controller().state().page, 2);

    sleep(SCROLL_WINDOW).await;
    let up = feed.on_scroll(true).expect("window elapsed");
    assert_eq!(up.page.page, 3);
    assert_eq!(feed.controller().visible().len(), 9);

    sleep(SCROLL_WINDOW).await;
    let up = feed.load_more().expect("page 4");
    assert!(!up.page.has_next);
    assert_eq!(up.signals, vec![Signal::NoMorePages]);
    assert!(feed.load_more().is_none());
}

#[tokio::test(start_paused = true)]
async fn filter_actions_reset_paging() {
    let store = ItemStore::new();
    let feed = live(2);
    feed.reload(&mock_loader(), &store, &EventBus::default()).await;
    feed.load_more();
    feed.load_more();

    let up = feed.set_category(CategoryFilter::parse("application")).unwrap();
    assert_eq!(up.state.page, 1);
    assert_eq!(up.page.total, 3);

    let up = feed.set_sort(SortKey::Importance).unwrap();
    // 11 (8.6), 7 (8.3), then 12 (8.0) on page 2
    assert_eq!(up.page.items[0].title.split_whitespace().next(), Some("Tesla"));
    assert!(up.page.has_next);
}

struct Scripted(Vec<RawNewsItem>);

#[async_trait::async_trait]
impl DataSource for Scripted {
    async fn fetch(&self) -> anyhow::Result<Vec<RawNewsItem>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &str {
        "scripted"
    }
}

fn raw(id: u64, title: &str) -> RawNewsItem {
    RawNewsItem {
        id: Some(id.into()),
        title: Some(title.into()),
        importance: Some(8.0),
        ..RawNewsItem::default()
    }
}

#[tokio::test(start_paused = true)]
async fn follows_refreshes_from_elsewhere() {
    let store = ItemStore::new();
    let events = EventBus::default();
    let mut feed = live(10);
    feed.attach(&store);
    assert_eq!(feed.controller().phase(), Phase::Error);

    feed.follow(&events, store.clone());
    let mut rx = feed.subscribe();
    rx.borrow_and_update();

    let loader = FallbackLoader::new(
        vec![Box::new(Scripted(vec![raw(1, "first"), raw(2, "second")]))],
        false,
    );
    refresh_store(&loader, &store, &events).await.unwrap();

    // let the follower task run
    rx.changed().await.unwrap();
    let up = rx.borrow().clone().unwrap();
    assert_eq!(up.phase, Phase::Ready);
    assert_eq!(up.page.total, 2);
}

#[tokio::test]
async fn session_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("feed_session.json");

    let store = ItemStore::new();
    let feed = live(4).with_session_path(&path);
    feed.reload(&mock_loader(), &store, &EventBus::default()).await;
    feed.set_category(CategoryFilter::parse("tech"));
    feed.set_sort(SortKey::Importance);
    feed.save_session().await;

    let saved = session::load(&path).await;
    assert_eq!(
        saved,
        SavedSession {
            category: CategoryFilter::parse("tech"),
            query: String::new(),
            sort: SortKey::Importance,
        }
    );
    let restored = saved.apply(&FilterState::with_page_size(4));
    assert_eq!(restored.page, 1);
    assert_eq!(restored.page_size, 4);

    // a new session picks the selection back up once data is loaded
    let next = live(4).with_session_path(&path);
    next.reload(&mock_loader(), &store, &EventBus::default()).await;
    let up = next.restore_session().await.expect("ready session recomputes");
    assert_eq!(up.state.category, CategoryFilter::parse("tech"));
    assert_eq!(up.state.sort, SortKey::Importance);
    assert_eq!(up.page.total, 6);
    assert_eq!(up.page.items.len(), 4);
    assert!(live(4).restore_session().await.is_none());

    // missing or corrupt files fall back to defaults
    assert_eq!(session::load(&dir.path().join("nope.json")).await, SavedSession::default());
    std::fs::write(&path, "not json").unwrap();
    assert_eq!(session::load(&path).await, SavedSession::default());
}

#[tokio::test(start_paused = true)]
async fn concurrent_reload_is_ignored() {
    let store = ItemStore::new();
    let feed = live(10);
    assert!(feed.controller().begin_load());
    assert!(feed.reload(&mock_loader(), &store, &EventBus::default()).await.is_none());
}

#[tokio::test]
async fn from_config_uses_configured_defaults() {
    let cfg = ai_news_feed::config::FeedConfig {
        page_size: 3,
        default_sort: SortKey::Importance,
        ..Default::default()
    };
    let feed = LiveFeed::from_config(&cfg);
    let state = feed.controller().state().clone();
    assert_eq!(state.page_size, 3);
    assert_eq!(state.sort, SortKey::Importance);
    assert_eq!(state.page, 1);
}
