//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the comic source and an on-disk SQLite
//! catalog, and drive full sessions through the registry end-to-end.

use comic_ingest::catalog::{open_catalog, CatalogStore, ComicStatus, SqliteCatalog};
use comic_ingest::config::{
    load_config, Config, OutputConfig, PacingConfig, ProgressConfig, SourceConfig, WorkersConfig,
};
use comic_ingest::crawler::{build_registry, SessionRegistry};
use comic_ingest::progress::{BroadcastChannel, ProgressMessage};
use comic_ingest::source::HttpSourceClient;
use comic_ingest::{CrawlRequest, CrawlSession, CrawlStatus, RegistryError};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast::Receiver;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/v1/api/danh-sach/truyen-moi";
const DETAIL_PATH: &str = "/v1/api/truyen-tranh";

/// Creates a test configuration pointing at the mock source
fn create_test_config(base_url: &str, db_path: &str, request_delay_ms: u64) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
            list_path: LIST_PATH.to_string(),
            detail_path: DETAIL_PATH.to_string(),
            image_cdn_url: "https://img.test".to_string(),
            user_agent: "TestBot/1.0".to_string(),
            request_timeout_secs: 5,
        },
        pacing: PacingConfig {
            request_delay_ms,
            batch_size: 10,
            batch_delay_ms: 0,
        },
        workers: WorkersConfig {
            max_concurrent_sessions: 2,
            queue_capacity: 2,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        progress: ProgressConfig {
            channel_capacity: 1024,
        },
    }
}

struct TestEnv {
    server: MockServer,
    _dir: TempDir,
    db_path: String,
}

impl TestEnv {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog.db").to_string_lossy().to_string();
        Self {
            server: MockServer::start().await,
            _dir: dir,
            db_path,
        }
    }

    fn config(&self, request_delay_ms: u64) -> Config {
        create_test_config(&self.server.uri(), &self.db_path, request_delay_ms)
    }

    fn registry(&self, config: &Config) -> (SessionRegistry, Receiver<ProgressMessage>) {
        let catalog: Arc<dyn CatalogStore> =
            Arc::new(SqliteCatalog::new(std::path::Path::new(&self.db_path)).unwrap());
        let source = Arc::new(HttpSourceClient::new(&config.source).unwrap());
        let channel = BroadcastChannel::new(config.progress.channel_capacity);
        let rx = channel.subscribe();
        (build_registry(config, source, catalog, Arc::new(channel)), rx)
    }

    fn catalog(&self) -> SqliteCatalog {
        open_catalog(std::path::Path::new(&self.db_path)).unwrap()
    }

    async fn mount_listing(&self, page: u32, items: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "data": {"items": items}})),
            )
            .mount(&self.server)
            .await;
    }

    /// Mounts the detail and chapter endpoints of one comic
    async fn mount_comic(&self, slug: &str, name: &str, chapters: &[&str]) {
        let server_data: Vec<_> = chapters
            .iter()
            .map(|chapter| {
                json!({
                    "filename": "",
                    "chapter_name": chapter,
                    "chapter_title": "",
                    "chapter_api_data": format!("{}/v1/api/chapter/{}-{}", self.server.uri(), slug, chapter),
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("{}/{}", DETAIL_PATH, slug)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {"item": {
                    "name": name,
                    "slug": slug,
                    "content": "<p>Test</p>",
                    "author": ["Somebody"],
                    "chapters": [{"server_name": "Server #1", "server_data": server_data}]
                }}
            })))
            .mount(&self.server)
            .await;

        for chapter in chapters {
            Mock::given(method("GET"))
                .and(path(format!("/v1/api/chapter/{}-{}", slug, chapter)))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "status": "success",
                    "data": {
                        "domain_cdn": "https://cdn.test",
                        "item": {
                            "comic_name": name,
                            "chapter_name": chapter,
                            "chapter_path": format!("uploads/{}/{}", slug, chapter),
                            "chapter_image": [
                                {"image_page": 0, "image_file": format!("{}-{}-1.jpg", slug, chapter)},
                                {"image_page": 1, "image_file": format!("{}-{}-2.jpg", slug, chapter)},
                                {"image_page": 2, "image_file": format!("{}-{}-3.jpg", slug, chapter)}
                            ]
                        }
                    }
                })))
                .mount(&self.server)
                .await;
        }
    }
}

fn listing_item(name: &str, slug: &str, status: &str, categories: &[&str]) -> serde_json::Value {
    let category: Vec<_> = categories
        .iter()
        .map(|c| json!({"id": c, "name": c, "slug": c.to_lowercase()}))
        .collect();
    json!({
        "_id": slug,
        "name": name,
        "slug": slug,
        "origin_name": [],
        "status": status,
        "thumb_url": format!("{}-thumb.jpg", slug),
        "category": category,
    })
}

/// Waits for the terminal snapshot of `session_id`
async fn wait_for_terminal(rx: &mut Receiver<ProgressMessage>, session_id: &str) -> CrawlSession {
    tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            let message = rx.recv().await.expect("progress channel closed");
            if message.session.session_id == session_id && message.session.status.is_terminal() {
                return message.session;
            }
        }
    })
    .await
    .expect("session did not finish in time")
}

#[tokio::test]
async fn test_full_crawl_builds_catalog() {
    let env = TestEnv::new().await;
    env.mount_listing(
        1,
        vec![
            listing_item("Đảo Hải Tặc", "dao-hai-tac", "ongoing", &["Action", "Adventure"]),
            listing_item("Naruto", "naruto", "completed", &["Action"]),
        ],
    )
    .await;
    env.mount_comic("dao-hai-tac", "Đảo Hải Tặc", &["1", "2"]).await;
    env.mount_comic("naruto", "Naruto", &["700"]).await;

    let config = env.config(0);
    let (registry, mut rx) = env.registry(&config);
    let started = registry.start(CrawlRequest::new(1, 1)).unwrap();
    let session = wait_for_terminal(&mut rx, &started.session_id).await;

    assert_eq!(session.status, CrawlStatus::Completed);
    assert_eq!(session.total_items_processed, 2);
    assert_eq!(session.total_successful_items, 2);
    assert!(session.errors.is_empty());

    let catalog = env.catalog();
    assert_eq!(catalog.count_comics().unwrap(), 2);
    assert_eq!(catalog.count_categories().unwrap(), 2);
    assert_eq!(catalog.count_chapters().unwrap(), 3);
    assert_eq!(catalog.count_images().unwrap(), 9);

    let comic = catalog.find_comic_by_slug("dao-hai-tac").unwrap().unwrap();
    assert_eq!(comic.status, ComicStatus::Ongoing);
    assert_eq!(
        comic.thumb_url.as_deref(),
        Some("https://img.test/uploads/comics/dao-hai-tac-thumb.jpg")
    );
    assert_eq!(catalog.categories_for_comic(comic.id).unwrap().len(), 2);

    let chapters = catalog.list_chapters(comic.id).unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].title, "Chapter 1");
    assert_eq!(chapters[1].chapter_path.as_deref(), Some("uploads/dao-hai-tac/2"));

    let images: Vec<_> = catalog
        .chapter_images(chapters[0].id)
        .unwrap()
        .into_iter()
        .map(|i| i.image_file)
        .collect();
    assert_eq!(
        images,
        vec!["dao-hai-tac-1-1.jpg", "dao-hai-tac-1-2.jpg", "dao-hai-tac-1-3.jpg"]
    );

    let naruto = catalog.find_comic_by_slug("naruto").unwrap().unwrap();
    assert_eq!(naruto.status, ComicStatus::Completed);
}

#[tokio::test]
async fn test_recrawl_only_adds_new_chapters() {
    let env = TestEnv::new().await;
    env.mount_listing(1, vec![listing_item("One Piece", "one-piece", "ongoing", &["Action"])])
        .await;
    env.mount_comic("one-piece", "One Piece", &["1", "2"]).await;

    let config = env.config(0);
    let (registry, mut rx) = env.registry(&config);
    let first = registry.start(CrawlRequest::new(1, 1)).unwrap();
    wait_for_terminal(&mut rx, &first.session_id).await;

    // the source publishes chapter 3
    env.server.reset().await;
    env.mount_listing(1, vec![listing_item("One Piece", "one-piece", "ongoing", &["Action"])])
        .await;
    env.mount_comic("one-piece", "One Piece", &["1", "2", "3"]).await;

    let second = registry.start(CrawlRequest::new(1, 1)).unwrap();
    let session = wait_for_terminal(&mut rx, &second.session_id).await;

    assert_eq!(session.status, CrawlStatus::Completed);
    assert_eq!(session.total_items_processed, 1);
    assert_eq!(session.total_successful_items, 1);
    assert_eq!(session.last_completed_chapter.unwrap().chapter_number, 3.0);

    let catalog = env.catalog();
    assert_eq!(catalog.count_comics().unwrap(), 1);
    assert_eq!(catalog.count_chapters().unwrap(), 3);

    // nothing new the third time
    let third = registry.start(CrawlRequest::new(1, 1)).unwrap();
    let session = wait_for_terminal(&mut rx, &third.session_id).await;
    assert_eq!(session.total_successful_items, 0);
    assert_eq!(catalog.count_chapters().unwrap(), 3);
    assert_eq!(catalog.count_images().unwrap(), 9);
}

#[tokio::test]
async fn test_failed_detail_is_recorded_and_skipped() {
    let env = TestEnv::new().await;
    env.mount_listing(
        1,
        vec![
            listing_item("Alpha", "alpha", "ongoing", &[]),
            listing_item("Broken", "broken", "ongoing", &[]),
            listing_item("Gamma", "gamma", "ongoing", &[]),
        ],
    )
    .await;
    env.mount_comic("alpha", "Alpha", &["1"]).await;
    env.mount_comic("gamma", "Gamma", &["1"]).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/broken", DETAIL_PATH)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&env.server)
        .await;

    let config = env.config(0);
    let (registry, mut rx) = env.registry(&config);
    let started = registry.start(CrawlRequest::new(1, 2)).unwrap();
    let session = wait_for_terminal(&mut rx, &started.session_id).await;

    assert_eq!(session.status, CrawlStatus::Completed);
    assert_eq!(session.total_items_processed, 2);
    assert_eq!(session.errors.len(), 1);
    assert_eq!(session.errors[0].item_key, "broken");
    assert!(session.errors[0].message.contains("500"));
    // page 2 is not mounted; it is skipped without an error entry
    assert_eq!(session.current_page, 2);
}

#[tokio::test]
async fn test_stop_ends_session_as_stopped() {
    let env = TestEnv::new().await;
    env.mount_listing(1, vec![listing_item("Alpha", "alpha", "ongoing", &[])])
        .await;
    env.mount_comic("alpha", "Alpha", &["1", "2", "3"]).await;

    // long enough that the session is still pacing when the stop arrives
    let config = env.config(30_000);
    let (registry, mut rx) = env.registry(&config);
    let started = registry.start(CrawlRequest::new(1, 5)).unwrap();
    assert_eq!(registry.status(&started.session_id).unwrap().to_string(), "running");

    let stopped = registry.stop(&started.session_id).unwrap();
    assert_eq!(stopped.session_id, started.session_id);
    assert!(matches!(
        registry.stop(&started.session_id),
        Err(RegistryError::NotFound(_))
    ));

    let session = wait_for_terminal(&mut rx, &started.session_id).await;
    assert_eq!(session.status, CrawlStatus::Stopped);
    assert!(session.errors.is_empty());
}

#[tokio::test]
async fn test_config_file_drives_a_crawl() {
    let env = TestEnv::new().await;
    env.mount_listing(1, vec![listing_item("Naruto", "naruto", "ongoing", &["Action"])])
        .await;
    env.mount_comic("naruto", "Naruto", &["1"]).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[source]
base-url = "{base}"
list-path = "{list}"
detail-path = "{detail}"
image-cdn-url = "https://img.test"
user-agent = "TestBot/1.0"

[pacing]
request-delay-ms = 0
batch-size = 5
batch-delay-ms = 0

[output]
database-path = "{db}"
"#,
        base = env.server.uri(),
        list = LIST_PATH,
        detail = DETAIL_PATH,
        db = env.db_path.replace('\\', "\\\\"),
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.workers.max_concurrent_sessions, 4);
    assert_eq!(config.progress.channel_capacity, 256);

    let (registry, mut rx) = env.registry(&config);
    let started = registry
        .start_with_id(CrawlRequest::new(1, 1), "from-config")
        .unwrap();
    let session = wait_for_terminal(&mut rx, "from-config").await;

    assert_eq!(started.session_id, "from-config");
    assert_eq!(session.status, CrawlStatus::Completed);
    assert_eq!(env.catalog().count_chapters().unwrap(), 1);
}
