// tests/sources_fixtures.rs
//
// Adapters against recorded platform payloads.

use std::sync::Arc;

use social_radar::config::{RadarConfig, SourceSettings};
use social_radar::record::make_id;
use social_radar::source::FetchContext;
use social_radar::sources::instagram::InstagramSource;
use social_radar::sources::tiktok::TikTokSource;
use social_radar::{Aggregator, SourceRegistry, TrendSource};

const TIKTOK: &str = include_str!("fixtures/tiktok_item_list.json");
const INSTAGRAM: &str = include_str!("fixtures/instagram_explore.json");

fn ctx(max_items: usize) -> FetchContext {
    FetchContext {
        settings: SourceSettings {
            max_items,
            ..Default::default()
        },
        deadline: None,
    }
}

#[tokio::test]
async fn tiktok_fixture_dedups_and_skips_bad_posts() {
    let items = TikTokSource::from_fixture(TIKTOK).fetch(&ctx(50)).await.unwrap();

    // duplicate id, empty caption and the non-object entry are gone
    assert_eq!(items.len(), 4);
    assert_eq!(items[0].id, make_id("tiktok", "7401000000000000001"));
    assert_eq!(items[0].title, "Trying the viral pasta hack & it actually works #food #fyp");
    assert_eq!(items[0].views, 1_200_000);
    assert_eq!(items[1].views, 3_400_000);
    assert_eq!(items[1].hashtags, vec!["sports", "nba"]);
    assert!(items.iter().any(|i| i.url.ends_with("/video/7401000000000000005")));
    assert!(items.iter().all(|i| i.source == "tiktok"));
}

#[tokio::test]
async fn tiktok_fixture_respects_max_items() {
    let items = TikTokSource::from_fixture(TIKTOK).fetch(&ctx(2)).await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn instagram_explore_fixture() {
    let items = InstagramSource::from_fixture(INSTAGRAM)
        .fetch(&ctx(50))
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    let a = &items[0];
    assert_eq!(a.title, "Golden hour in Lisbon #travel #wanderlust");
    assert_eq!(a.author, "@lisbonlens");
    assert_eq!(a.views, 54_000 * 8);
    assert_eq!(a.thumbnail, "https://cdn.example/ig1.jpg");
    assert_eq!(a.url, "https://www.instagram.com/p/C1aBcD");
    assert!(a.published_at.is_some());

    let b = &items[1];
    assert_eq!(b.id, make_id("instagram", "3300000000000000002"));
    assert_eq!(b.views, 410_000);
    assert_eq!(b.hashtags, vec!["wellness"]);
}

#[tokio::test]
async fn unrecognized_instagram_shape_is_an_error() {
    let err = InstagramSource::from_fixture(r#"{"status": "fail"}"#)
        .fetch(&ctx(50))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unrecognized"));
}

#[tokio::test]
async fn fixture_path_from_config_is_read_per_fetch() {
    let cfg = RadarConfig::from_toml_str(
        r#"
        [sources.tiktok]
        fixture = "tests/fixtures/tiktok_item_list.json"
        categories = ["food"]

        [sources.instagram]
        fixture = "tests/fixtures/does_not_exist.json"
        "#,
    )
    .unwrap();
    let agg = Aggregator::new(Arc::new(cfg), SourceRegistry::with_builtin());
    let rs = agg.run_all().await;

    let tiktok = rs.items_for("tiktok").unwrap();
    assert_eq!(tiktok.len(), 4);
    assert!(tiktok.iter().all(|i| i.category == "food"));

    // A missing recording fails only its own source.
    assert!(rs.items_for("instagram").is_none());
    assert!(rs.error_for("instagram").unwrap().contains("io error"));
}

#[tokio::test]
async fn sample_mode_without_fixture() {
    let items = InstagramSource::from_settings(&SourceSettings::default())
        .fetch(&ctx(50))
        .await
        .unwrap();
    assert_eq!(items.len(), 6);
    assert!(items.iter().all(|i| !i.title.is_empty() && i.views > 0));
}
