//! Cover cache tests against a local image host

mod common;

use bookvault::services::CoverCache;
use bookvault_common::NewBook;
use common::{test_store, FakeCatalog};
use tempfile::TempDir;

#[tokio::test]
async fn test_list_all_fetches_each_cover_once() {
    let fake = FakeCatalog::start().await;
    let (store, dir) = test_store(None).await;

    let id = store
        .upsert(NewBook::new("Dune", "Frank Herbert").with_cover(fake.cover_url("dune")))
        .await
        .unwrap();

    let first = store.list_all().await.unwrap();
    let second = store.list_all().await.unwrap();

    assert_eq!(fake.cover_hits(), 1);
    assert_eq!(first[0].cover, second[0].cover);
    assert_eq!(first[0].cover.as_deref(), Some(format!("cover_cache/{}", id).as_str()));

    let on_disk = dir.path().join("covers").join(id.to_string());
    assert_eq!(std::fs::read_to_string(on_disk).unwrap(), "image-bytes-dune");
}

#[tokio::test]
async fn test_changed_url_keeps_cached_file() {
    let fake = FakeCatalog::start().await;
    let (store, dir) = test_store(None).await;

    let id = store
        .upsert(NewBook::new("Dune", "Frank Herbert").with_cover(fake.cover_url("old")))
        .await
        .unwrap();
    store.list_all().await.unwrap();

    store
        .upsert(NewBook::new("Dune", "Frank Herbert").with_cover(fake.cover_url("new")))
        .await
        .unwrap();
    let books = store.list_all().await.unwrap();

    assert_eq!(fake.cover_hits(), 1);
    assert!(books[0].cover.is_some());
    let content = std::fs::read_to_string(dir.path().join("covers").join(id.to_string())).unwrap();
    assert_eq!(content, "image-bytes-old");
}

#[tokio::test]
async fn test_failed_fetch_leaves_no_cover() {
    let fake = FakeCatalog::start().await;
    let dir = TempDir::new().unwrap();
    let cache = CoverCache::new(dir.path()).unwrap();

    let resolved = cache.resolve(5, &fake.cover_url("missing")).await;

    assert!(resolved.is_none());
    assert!(!cache.path_for(5).exists());
    assert_eq!(fake.cover_hits(), 1);
}

#[tokio::test]
async fn test_directory_recreated_when_removed() {
    let fake = FakeCatalog::start().await;
    let dir = TempDir::new().unwrap();
    let cache_dir = dir.path().join("covers");
    let cache = CoverCache::new(&cache_dir).unwrap();

    std::fs::remove_dir_all(&cache_dir).unwrap();

    let resolved = cache.resolve(8, &fake.cover_url("emma")).await;
    assert_eq!(resolved, Some(cache_dir.join("8")));
}

#[tokio::test]
async fn test_book_without_cover_url() {
    let (store, _dir) = test_store(None).await;
    store.upsert(NewBook::new("Emma", "Jane Austen")).await.unwrap();

    let books = store.list_all().await.unwrap();
    assert!(books[0].cover.is_none());
}

#[tokio::test]
async fn test_book_without_cover_url_ignores_stray_file() {
    let (store, dir) = test_store(None).await;
    let id = store.upsert(NewBook::new("Emma", "Jane Austen")).await.unwrap();
    std::fs::write(dir.path().join("covers").join(id.to_string()), b"stray").unwrap();

    let books = store.list_all().await.unwrap();
    assert!(books[0].cover.is_none());
}

#[tokio::test]
async fn test_failed_write_leaves_no_cover() {
    let fake = FakeCatalog::start().await;
    let dir = TempDir::new().unwrap();
    let cache = CoverCache::new(dir.path()).unwrap();

    // A directory in the way of the partial file makes the write fail
    std::fs::create_dir(cache.path_for(6).with_extension("tmp")).unwrap();

    assert!(cache.resolve(6, &fake.cover_url("dune")).await.is_none());
    assert!(!cache.path_for(6).exists());
}

#[tokio::test]
async fn test_successful_fetch_leaves_no_partial_file() {
    let fake = FakeCatalog::start().await;
    let dir = TempDir::new().unwrap();
    let cache = CoverCache::new(dir.path()).unwrap();

    let resolved = cache.resolve(7, &fake.cover_url("emma")).await.unwrap();

    assert_eq!(std::fs::read_to_string(&resolved).unwrap(), "image-bytes-emma");
    assert!(!cache.path_for(7).with_extension("tmp").exists());
}
