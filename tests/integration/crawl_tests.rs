//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! enumerate, fetch, extract and persist cycle end-to-end against temporary
//! ledger and result files.

use async_trait::async_trait;
use reel_crawl::config::Config;
use reel_crawl::crawler::{
    crawl_and_persist, shutdown_channel, CrawlReport, FetchResult, Fetcher, HttpFetcher,
    NoPacing, Shutdown, ShutdownTrigger,
};
use reel_crawl::output::load_records;
use reel_crawl::storage::Ledger;
use reel_crawl::{ReelError, SourceDescriptor};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration pointing at the mock server, writing into `dir`
fn create_test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = server.uri();
    config.output.ledger_path = dir.join("crawled_urls.json").display().to_string();
    config.output.results_path = dir.join("movies.json").display().to_string();
    config.output.summary_path = dir.join("summary.md").display().to_string();
    config
}

fn listing(page_size: u32, max_offset: u32) -> SourceDescriptor {
    SourceDescriptor::Listing {
        base_path: "/top250".to_string(),
        page_size,
        max_offset,
    }
}

fn listing_page(ids: &[u32]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="item">
                    <a href="/subject/{id}/"><img src="/poster/{id}.jpg"></a>
                    <a href="/subject/{id}/"><span class="title">Movie {id}</span></a>
                </div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", items)
}

fn item_page(title: &str, rating: Option<&str>) -> String {
    let rating = rating
        .map(|r| format!(r#"<strong class="ll rating_num">{}</strong>"#, r))
        .unwrap_or_default();
    format!(
        r#"<html><body>
            <h1><span property="v:itemreviewed">{title}</span> <span class="year">(1994)</span></h1>
            <a rel="v:directedBy">Director</a>
            <span property="v:genre">剧情</span>
            {rating}
        </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, start: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/top250"))
        .and(query_param("start", start.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: u32, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/subject/{}/", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(calls)
        .mount(server)
        .await;
}

async fn crawl(
    config: &Config,
    sources: &[SourceDescriptor],
    fresh: bool,
    shutdown: Shutdown,
) -> reel_crawl::Result<CrawlReport> {
    let fetcher = HttpFetcher::new(&config.client).expect("client");
    crawl_and_persist(
        config,
        sources,
        fresh,
        Box::new(fetcher),
        Box::new(NoPacing::default()),
        shutdown,
    )
    .await
}

fn item_id(server: &MockServer, id: u32) -> String {
    format!("{}/subject/{}/", server.uri(), id)
}

#[tokio::test]
async fn test_listing_crawl_end_to_end() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    // Pages overlap on item 2
    mount_listing(&server, 0, listing_page(&[1, 2])).await;
    mount_listing(&server, 2, listing_page(&[2, 3])).await;
    mount_listing(&server, 4, listing_page(&[])).await;
    mount_item(&server, 1, item_page("Movie One", Some("9.1")), 1).await;
    mount_item(&server, 2, item_page("Movie Two", Some("8.2")), 1).await;
    mount_item(&server, 3, item_page("Movie Three", None), 1).await;

    let report = crawl(&config, &[listing(2, 100)], false, Shutdown::never())
        .await
        .unwrap();

    assert!(!report.interrupted);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.stats.pages_requested, 3);

    let records = load_records(Path::new(&config.output.results_path));
    let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(
        ids,
        vec![item_id(&server, 1), item_id(&server, 2), item_id(&server, 3)]
    );
    assert_eq!(records[0].title.as_deref(), Some("Movie One"));
    assert_eq!(records[0].year.as_deref(), Some("1994"));
    assert_eq!(records[0].rating, Some(9.1));
    assert_eq!(records[0].source_url, records[0].id);

    let ledger = Ledger::load(Path::new(&config.output.ledger_path));
    assert_eq!(ledger.len(), 3);
}

#[tokio::test]
async fn test_rerun_fetches_nothing_already_visited() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[1, 2])).await;
    mount_listing(&server, 2, listing_page(&[])).await;
    // One fetch each across both runs
    mount_item(&server, 1, item_page("Movie One", Some("9.1")), 1).await;
    mount_item(&server, 2, item_page("Movie Two", Some("8.2")), 1).await;

    crawl(&config, &[listing(2, 100)], false, Shutdown::never())
        .await
        .unwrap();
    let second = crawl(&config, &[listing(2, 100)], false, Shutdown::never())
        .await
        .unwrap();

    assert_eq!(second.stats.fetched(), 0);
    assert_eq!(second.stats.references(), 2);

    // Records from the first run survive a run that fetched nothing
    let records = load_records(Path::new(&config.output.results_path));
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_preloaded_ledger_only_new_ids_are_fetched() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let ledger: Ledger = [item_id(&server, 1), item_id(&server, 2)]
        .into_iter()
        .collect();
    ledger.save(Path::new(&config.output.ledger_path)).unwrap();

    mount_listing(&server, 0, listing_page(&[1, 2, 3])).await;
    mount_listing(&server, 3, listing_page(&[])).await;
    mount_item(&server, 1, item_page("Movie One", None), 0).await;
    mount_item(&server, 2, item_page("Movie Two", None), 0).await;
    mount_item(&server, 3, item_page("Movie Three", None), 1).await;

    let report = crawl(&config, &[listing(3, 100)], false, Shutdown::never())
        .await
        .unwrap();

    let expected: Ledger = [1, 2, 3].iter().map(|id| item_id(&server, *id)).collect();
    assert_eq!(report.ledger, expected);
    assert_eq!(Ledger::load(Path::new(&config.output.ledger_path)), expected);
    assert_eq!(report.records.len(), 1);
}

#[tokio::test]
async fn test_missing_rating_is_absent_in_results_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[7])).await;
    mount_listing(&server, 1, listing_page(&[])).await;
    mount_item(&server, 7, item_page("Unrated", None), 1).await;

    crawl(&config, &[listing(1, 100)], false, Shutdown::never())
        .await
        .unwrap();

    let text = std::fs::read_to_string(&config.output.results_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let record = &value[0];

    assert_eq!(record["title"], "Unrated");
    assert_eq!(record["director"], "Director");
    assert_eq!(record["genres"][0], "剧情");
    assert!(record.get("rating").is_none());
}

#[tokio::test]
async fn test_failed_item_is_visited_but_not_recorded() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[1, 2])).await;
    mount_listing(&server, 2, listing_page(&[])).await;
    mount_item(&server, 1, item_page("Movie One", Some("9.1")), 1).await;
    Mock::given(method("GET"))
        .and(path("/subject/2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(&config, &[listing(2, 100)], false, Shutdown::never())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert!(report.ledger.contains(&item_id(&server, 2)));
    assert_eq!(report.stats.fetched(), 2);
}

#[tokio::test]
async fn test_listing_failure_on_third_page_halts_source() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[1])).await;
    mount_listing(&server, 1, listing_page(&[2])).await;
    Mock::given(method("GET"))
        .and(path("/top250"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top250"))
        .and(query_param("start", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[4])))
        .expect(0)
        .mount(&server)
        .await;
    mount_item(&server, 1, item_page("Movie One", None), 1).await;
    mount_item(&server, 2, item_page("Movie Two", None), 1).await;
    mount_item(&server, 4, item_page("Movie Four", None), 0).await;

    let report = crawl(&config, &[listing(1, 100)], false, Shutdown::never())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(!report.interrupted);
}

#[tokio::test]
async fn test_listing_ceiling_is_respected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[1])).await;
    Mock::given(method("GET"))
        .and(path("/top250"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[2])))
        .expect(0)
        .mount(&server)
        .await;
    mount_item(&server, 1, item_page("Movie One", None), 1).await;

    let report = crawl(
        &config,
        &[listing(1, 100).with_max_pages(1)],
        false,
        Shutdown::never(),
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 1);
}

#[tokio::test]
async fn test_tag_query_crawl() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let subjects = serde_json::json!({
        "subjects": [
            {"url": item_id(&server, 10), "title": "Arrival", "rate": "7.9", "cover": ""},
            {"url": item_id(&server, 11), "title": "Dune", "rate": "7.7", "cover": ""}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/j/search_subjects"))
        .and(query_param("type", "movie"))
        .and(query_param("tag", "科幻"))
        .and(query_param("sort", "recommend"))
        .and(query_param("page_limit", "20"))
        .and(query_param("page_start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subjects))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/j/search_subjects"))
        .and(query_param("page_start", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"subjects": []})))
        .expect(1)
        .mount(&server)
        .await;
    mount_item(&server, 10, item_page("Arrival", Some("7.9")), 1).await;
    mount_item(&server, 11, item_page("Dune", Some("7.7")), 1).await;

    let source = SourceDescriptor::TagQuery {
        tag_name: "科幻".to_string(),
        page_size: 20,
        max_pages: Some(5),
    };
    let report = crawl(&config, &[source], false, Shutdown::never())
        .await
        .unwrap();

    let titles: Vec<_> = report
        .records
        .iter()
        .filter_map(|r| r.title.clone())
        .collect();
    assert_eq!(titles, vec!["Arrival", "Dune"]);
}

#[tokio::test]
async fn test_tag_overlapping_listing_is_fetched_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[1])).await;
    mount_listing(&server, 1, listing_page(&[])).await;
    Mock::given(method("GET"))
        .and(path("/j/search_subjects"))
        .and(query_param("page_start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "subjects": [{"url": item_id(&server, 1), "title": "Movie One"}]
        })))
        .mount(&server)
        .await;
    mount_item(&server, 1, item_page("Movie One", None), 1).await;

    let sources = vec![
        listing(1, 100),
        SourceDescriptor::TagQuery {
            tag_name: "热门".to_string(),
            page_size: 20,
            max_pages: Some(1),
        },
    ];
    let report = crawl(&config, &sources, false, Shutdown::never())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.stats.sources.len(), 2);
    assert_eq!(report.stats.sources[1].skipped, 1);
}

#[tokio::test]
async fn test_interrupted_run_persists_previous_state() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    // A first, complete run
    mount_listing(&server, 0, listing_page(&[1])).await;
    mount_listing(&server, 1, listing_page(&[])).await;
    mount_item(&server, 1, item_page("Movie One", None), 1).await;
    crawl(&config, &[listing(1, 100)], false, Shutdown::never())
        .await
        .unwrap();

    // A second run interrupted before it could do anything
    let (trigger, shutdown) = shutdown_channel();
    trigger.trigger();
    let report = crawl(&config, &[listing(1, 100)], false, shutdown)
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(load_records(Path::new(&config.output.results_path)).len(), 1);
    assert_eq!(Ledger::load(Path::new(&config.output.ledger_path)).len(), 1);
}

/// Fires the shutdown signal while a given URL is being fetched
struct InterruptingFetcher {
    inner: HttpFetcher,
    interrupt_on: String,
    trigger: ShutdownTrigger,
}

#[async_trait]
impl Fetcher for InterruptingFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        if url == self.interrupt_on {
            self.trigger.trigger();
        }
        self.inner.fetch(url).await
    }
}

#[tokio::test]
async fn test_interrupt_mid_page_persists_items_fetched_so_far() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 0, listing_page(&[1, 2, 3])).await;
    mount_item(&server, 1, item_page("Movie One", Some("9.1")), 1).await;
    mount_item(&server, 2, item_page("Movie Two", Some("8.2")), 1).await;
    mount_item(&server, 3, item_page("Movie Three", None), 0).await;

    // The in-flight fetch of item 2 completes; item 3 is never started
    let (trigger, shutdown) = shutdown_channel();
    let fetcher = InterruptingFetcher {
        inner: HttpFetcher::new(&config.client).expect("client"),
        interrupt_on: item_id(&server, 2),
        trigger,
    };
    let report = crawl_and_persist(
        &config,
        &[listing(3, 100)],
        false,
        Box::new(fetcher),
        Box::new(NoPacing::default()),
        shutdown,
    )
    .await
    .unwrap();

    assert!(report.interrupted);

    let expected: Ledger = [1, 2].iter().map(|id| item_id(&server, *id)).collect();
    assert_eq!(Ledger::load(Path::new(&config.output.ledger_path)), expected);

    let records = load_records(Path::new(&config.output.results_path));
    let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![item_id(&server, 1), item_id(&server, 2)]);
}

#[tokio::test]
async fn test_fresh_run_ignores_ledger() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, dir.path());

    let ledger: Ledger = std::iter::once(item_id(&server, 1)).collect();
    ledger.save(Path::new(&config.output.ledger_path)).unwrap();

    mount_listing(&server, 0, listing_page(&[1])).await;
    mount_listing(&server, 1, listing_page(&[])).await;
    mount_item(&server, 1, item_page("Movie One", None), 1).await;

    let report = crawl(&config, &[listing(1, 100)], true, Shutdown::never())
        .await
        .unwrap();

    assert_eq!(report.records.len(), 1);
}

#[tokio::test]
async fn test_unwritable_ledger_fails_the_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server, dir.path());

    // A regular file where the ledger's parent directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    config.output.ledger_path = blocker.join("crawled_urls.json").display().to_string();

    mount_listing(&server, 0, listing_page(&[])).await;

    let result = crawl(&config, &[listing(1, 100)], false, Shutdown::never()).await;
    assert!(matches!(result, Err(ReelError::Storage(_))));
}
