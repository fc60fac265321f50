// tests/ingest_config.rs
use ai_news_feed::config::feed::{ENV_CONFIG_PATH, ENV_MOCK_FALLBACK, ENV_PAGE_SIZE};
use ai_news_feed::config::{FeedConfig, SourceSpec};
use ai_news_feed::sort::SortKey;
use std::{env, fs};

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_PAGE_SIZE);
    env::remove_var(ENV_MOCK_FALLBACK);
}

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("feed.toml");
    fs::write(
        &p_toml,
        r#"
page_size = 0
default_sort = "importance"

[[sources]]
kind = "http"
url = "https://cdn.example.com/latest_news.json"
"#,
    )
    .unwrap();
    let t = FeedConfig::load_from(&p_toml).unwrap();
    // zero page size is sanitized back to the default
    assert_eq!(t.page_size, 10);
    assert_eq!(t.default_sort, SortKey::Importance);
    assert!(matches!(t.sources[0], SourceSpec::Http { .. }));

    let p_json = dir.path().join("feed.json");
    fs::write(&p_json, r#"{"page_size": 4, "mock_fallback": false}"#).unwrap();
    let j = FeedConfig::load_from(&p_json).unwrap();
    assert_eq!(j.page_size, 4);
    assert!(!j.mock_fallback);

    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ nope").unwrap();
    assert!(FeedConfig::load_from(&bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate the CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing on disk -> defaults
    let d = FeedConfig::load_default().unwrap();
    assert_eq!(d, FeedConfig::default());

    // 2) Fallback JSON in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("feed.json"), r#"{"page_size": 7}"#).unwrap();
    assert_eq!(FeedConfig::load_default().unwrap().page_size, 7);

    // 3) TOML wins over JSON
    fs::write(cfg_dir.join("feed.toml"), "page_size = 8").unwrap();
    assert_eq!(FeedConfig::load_default().unwrap().page_size, 8);

    // 4) The env path wins over both
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "page_size = 9").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(FeedConfig::load_default().unwrap().page_size, 9);

    // 5) A dangling env path is an error, not a silent default
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(FeedConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_last() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var(ENV_PAGE_SIZE, "25");
    env::set_var(ENV_MOCK_FALLBACK, "off");
    let cfg = FeedConfig::load_default().unwrap();
    assert_eq!(cfg.page_size, 25);
    assert!(!cfg.mock_fallback);

    // invalid values are ignored
    env::set_var(ENV_PAGE_SIZE, "zero");
    assert_eq!(FeedConfig::load_default().unwrap().page_size, 10);

    clear_env();
    env::set_current_dir(&old).unwrap();
}
