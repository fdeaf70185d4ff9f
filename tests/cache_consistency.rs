//! End-to-end consistency checks across the cache, invalidation, projection,
//! and warming layers, driven through the public API only.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::macros::datetime;

use kinocache::cache::CacheStats;
use kinocache::{
    BackendError, BoxError, CacheBackend, CacheGroup, CacheManager, CacheSettings, CacheWarmer,
    CatalogRecord, ChangeEvent, ChangeKind, EntityKind, FragmentCache, FragmentRenderer,
    ManualClock, MemoryBackend, MemoryContentStore, MemoryProjectionStore, ObjectCache,
    ProjectionRow, ProjectionStore, SortDir, SortKey, WarmerSettings,
};

const EPOCH: time::OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

fn movie(id: i64, rating: f64, popularity: f64) -> CatalogRecord {
    CatalogRecord {
        id,
        kind: EntityKind::Movie,
        title: format!("Movie {id}"),
        tmdb_id: Some(id),
        release_date: None,
        rating: Some(rating),
        popularity: Some(popularity),
        runtime_minutes: Some(100),
        status: Some("released".to_string()),
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    backend: Arc<MemoryBackend>,
    content: Arc<MemoryContentStore>,
    projections: Arc<MemoryProjectionStore>,
    manager: CacheManager,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(EPOCH));
        let backend = Arc::new(MemoryBackend::new(256, clock.clone()));
        let content = Arc::new(MemoryContentStore::new());
        let projections = Arc::new(MemoryProjectionStore::new());
        let manager = CacheManager::new(
            backend.clone(),
            content.clone(),
            projections.clone(),
            clock.clone(),
            CacheSettings::default(),
        );
        Self {
            clock,
            backend,
            content,
            projections,
            manager,
        }
    }

    async fn seed_movie(&self, record: CatalogRecord) {
        self.projections
            .upsert(EntityKind::Movie, ProjectionRow::from_record(&record, EPOCH))
            .await
            .unwrap();
        self.content.insert(record);
    }
}

struct PlainRenderer;

#[async_trait]
impl FragmentRenderer for PlainRenderer {
    async fn render_card(&self, record: &CatalogRecord) -> Result<String, BoxError> {
        Ok(format!("<card>{}</card>", record.title))
    }

    async fn render_navigation(&self) -> Result<String, BoxError> {
        Ok("<nav/>".to_string())
    }
}

fn warmer(harness: &Harness, settings: WarmerSettings) -> CacheWarmer {
    CacheWarmer::new(
        harness.manager.objects().clone(),
        harness.manager.fragments().clone(),
        harness.content.clone(),
        harness.projections.clone(),
        Arc::new(PlainRenderer),
        settings,
    )
}

#[tokio::test]
async fn repeated_reads_compute_once() {
    let harness = Harness::new();
    let mut produced = 0;

    for _ in 0..3 {
        let value = harness
            .manager
            .entity(EntityKind::Movie, 42, || {
                produced += 1;
                async { Ok(Bytes::from_static(b"detail")) }
            })
            .await
            .unwrap();
        assert_eq!(value, Bytes::from_static(b"detail"));
    }

    assert_eq!(produced, 1);
}

#[tokio::test]
async fn delete_removes_only_the_named_key() {
    let harness = Harness::new();
    let objects = harness.manager.objects();

    objects
        .set("movie_data_1", CacheGroup::Movies, None, Bytes::from_static(b"a"))
        .await;
    objects
        .set("movie_data_2", CacheGroup::Movies, None, Bytes::from_static(b"b"))
        .await;

    objects.delete("movie_data_1", CacheGroup::Movies).await;

    assert!(objects.get("movie_data_1", CacheGroup::Movies).await.is_none());
    assert_eq!(
        objects.get("movie_data_2", CacheGroup::Movies).await,
        Some(Bytes::from_static(b"b"))
    );
}

#[tokio::test]
async fn group_flush_discards_every_member() {
    let harness = Harness::new();
    let objects = harness.manager.objects();

    for i in 1..=10 {
        objects
            .set(
                &format!("search_{i}"),
                CacheGroup::Search,
                None,
                Bytes::from_static(b"results"),
            )
            .await;
    }
    objects
        .set("movie_data_1", CacheGroup::Movies, None, Bytes::from_static(b"m"))
        .await;

    harness.backend.flush_group(CacheGroup::Search).await.unwrap();

    for i in 1..=10 {
        assert!(
            objects
                .get(&format!("search_{i}"), CacheGroup::Search)
                .await
                .is_none(),
            "search_{i} should be flushed"
        );
    }
    assert!(objects.get("movie_data_1", CacheGroup::Movies).await.is_some());
}

#[tokio::test]
async fn entries_expire_at_their_ttl() {
    let harness = Harness::new();
    let objects = harness.manager.objects();

    // Movies default to the one-hour tier.
    objects
        .set("movie_data_1", CacheGroup::Movies, None, Bytes::from_static(b"m"))
        .await;

    harness.clock.advance(Duration::from_secs(3_599));
    assert!(objects.get("movie_data_1", CacheGroup::Movies).await.is_some());

    harness.clock.advance(Duration::from_secs(2));
    assert!(objects.get("movie_data_1", CacheGroup::Movies).await.is_none());
}

#[tokio::test]
async fn warming_populates_exactly_the_top_n() {
    let harness = Harness::new();
    for (id, popularity) in [(1, 90.0), (2, 80.0), (3, 70.0), (4, 60.0), (5, 50.0)] {
        harness.seed_movie(movie(id, 7.0, popularity)).await;
    }

    let settings = WarmerSettings {
        top_n: 3,
        ..Default::default()
    };
    warmer(&harness, settings).run().await;

    let objects = harness.manager.objects();
    for id in [1, 2, 3] {
        assert!(
            objects
                .get(&format!("movie_data_{id}"), CacheGroup::Movies)
                .await
                .is_some(),
            "movie {id} should be warm"
        );
    }
    for id in [4, 5] {
        assert!(
            objects
                .get(&format!("movie_data_{id}"), CacheGroup::Movies)
                .await
                .is_none(),
            "movie {id} should stay cold"
        );
    }
}

#[tokio::test]
async fn list_sort_matches_ratings_with_id_tie_break() {
    let harness = Harness::new();
    harness.seed_movie(movie(1, 3.5, 10.0)).await;
    harness.seed_movie(movie(2, 8.1, 10.0)).await;
    harness.seed_movie(movie(3, 6.0, 10.0)).await;

    let rows = harness
        .projections
        .list_sorted(EntityKind::Movie, SortKey::Rating, SortDir::Desc, 10, 0)
        .await
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.entity_id).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    // Equal popularity falls back to ascending id.
    let by_popularity = harness
        .projections
        .list_sorted(EntityKind::Movie, SortKey::Popularity, SortDir::Desc, 10, 0)
        .await
        .unwrap();
    let ids: Vec<i64> = by_popularity.iter().map(|r| r.entity_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn entity_update_invalidates_warmed_search_results() {
    let harness = Harness::new();
    harness.seed_movie(movie(42, 8.0, 90.0)).await;

    let settings = WarmerSettings {
        top_n: 5,
        search_queries: vec!["movie".to_string()],
        ..Default::default()
    };
    warmer(&harness, settings).run().await;

    let objects = harness.manager.objects();
    let search = kinocache::cache::search_key("movie");
    assert!(objects.get(&search, CacheGroup::Search).await.is_some());
    assert!(objects.get("movie_data_42", CacheGroup::Movies).await.is_some());
    assert!(
        harness
            .manager
            .fragments()
            .get("movie_card_42")
            .await
            .is_some()
    );

    harness
        .manager
        .publish(ChangeEvent::Entity {
            kind: EntityKind::Movie,
            id: 42,
            change: ChangeKind::Updated,
        })
        .await;

    // Detail, card, and every search result set are gone by the time
    // publish returns.
    assert!(objects.get("movie_data_42", CacheGroup::Movies).await.is_none());
    assert!(
        harness
            .manager
            .fragments()
            .get("movie_card_42")
            .await
            .is_none()
    );
    assert!(objects.get(&search, CacheGroup::Search).await.is_none());
}

#[tokio::test]
async fn deleting_an_entity_drops_its_projection_row() {
    let harness = Harness::new();
    harness.seed_movie(movie(7, 7.0, 50.0)).await;

    harness.content.remove(EntityKind::Movie, 7);
    harness
        .manager
        .publish(ChangeEvent::Entity {
            kind: EntityKind::Movie,
            id: 7,
            change: ChangeKind::Deleted,
        })
        .await;

    let rows = harness
        .projections
        .list_sorted(EntityKind::Movie, SortKey::Rating, SortDir::Desc, 10, 0)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

struct DownBackend;

#[async_trait]
impl CacheBackend for DownBackend {
    async fn get(&self, _key: &str, _group: CacheGroup) -> Result<Option<Bytes>, BackendError> {
        Err(BackendError::Unavailable("down".to_string()))
    }

    async fn set(
        &self,
        _key: &str,
        _group: CacheGroup,
        _value: Bytes,
        _ttl: Duration,
    ) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("down".to_string()))
    }

    async fn delete(&self, _key: &str, _group: CacheGroup) -> Result<(), BackendError> {
        Err(BackendError::Timeout)
    }

    async fn flush_group(&self, _group: CacheGroup) -> Result<(), BackendError> {
        Err(BackendError::Timeout)
    }

    async fn flush_all(&self) -> Result<(), BackendError> {
        Err(BackendError::Timeout)
    }

    async fn group_len(&self, _group: CacheGroup) -> Result<usize, BackendError> {
        Err(BackendError::Timeout)
    }
}

#[tokio::test]
async fn backend_outage_never_breaks_reads_or_invalidation() {
    let content = Arc::new(MemoryContentStore::new());
    let projections = Arc::new(MemoryProjectionStore::new());
    content.insert(movie(1, 7.0, 50.0));

    let manager = CacheManager::new(
        Arc::new(DownBackend),
        content,
        projections.clone(),
        Arc::new(ManualClock::new(EPOCH)),
        CacheSettings::default(),
    );

    // Reads compute through the outage.
    let value = manager
        .entity(EntityKind::Movie, 1, || async {
            Ok(Bytes::from_static(b"computed"))
        })
        .await
        .unwrap();
    assert_eq!(value, Bytes::from_static(b"computed"));

    let html = manager
        .fragment("movie_card_1", None, || async {
            Ok("<card/>".to_string())
        })
        .await
        .unwrap();
    assert_eq!(html, "<card/>");

    // Publishing still maintains the projection; failed flushes are
    // absorbed as staleness.
    manager
        .publish(ChangeEvent::Entity {
            kind: EntityKind::Movie,
            id: 1,
            change: ChangeKind::Updated,
        })
        .await;
    let rows = projections
        .list_sorted(EntityKind::Movie, SortKey::Rating, SortDir::Desc, 10, 0)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    // Stats survive a failing size probe.
    let snapshot = manager.stats().await;
    assert_eq!(snapshot.groups.len(), CacheGroup::ALL.len());
    assert_eq!(snapshot.group(CacheGroup::Movies).unwrap().approx_entries, 0);
}

#[tokio::test]
async fn fragment_cache_and_object_cache_share_storage() {
    let clock = Arc::new(ManualClock::new(EPOCH));
    let backend = Arc::new(MemoryBackend::new(64, clock));
    let objects = Arc::new(ObjectCache::new(
        backend,
        CacheSettings::default(),
        Arc::new(CacheStats::new()),
    ));
    let fragments = FragmentCache::new(objects.clone());

    fragments.set("navigation_menu", None, "<nav/>".to_string()).await;

    assert_eq!(
        objects.get("navigation_menu", CacheGroup::Fragments).await,
        Some(Bytes::from("<nav/>"))
    );
}
