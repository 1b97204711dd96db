//! Block cache effectiveness tests.
//!
//! Tests verify:
//! - Reading metadata through the block cache gives the same result
//! - The cache collapses the many small header and section reads
//! - Repeated metadata requests hit neither the cache nor the source

use nd2_metadata::{BlockCache, Nd2Reader};

use super::test_utils::{full_file, TrackingMockReader};

#[tokio::test]
async fn test_block_cache_same_metadata() {
    let direct = Nd2Reader::open(TrackingMockReader::new(full_file(), "mock://direct.nd2"))
        .await
        .unwrap();
    let cached = Nd2Reader::open(BlockCache::with_capacity(
        TrackingMockReader::new(full_file(), "mock://cached.nd2"),
        1024,
        16,
    ))
    .await
    .unwrap();

    assert_eq!(direct.metadata().await, cached.metadata().await);
    assert_eq!(direct.version(), cached.version());
    assert_eq!(direct.image_count(), cached.image_count());
}

#[tokio::test]
async fn test_block_cache_reduces_requests() {
    let direct_source = TrackingMockReader::new(full_file(), "mock://direct.nd2");
    let direct = Nd2Reader::open(direct_source.clone()).await.unwrap();
    direct.metadata().await;

    let cached_source = TrackingMockReader::new(full_file(), "mock://cached.nd2");
    // One block covers the whole synthetic file
    let cached = Nd2Reader::open(BlockCache::with_capacity(cached_source.clone(), 64 * 1024, 4))
        .await
        .unwrap();
    cached.metadata().await;

    assert_eq!(cached_source.request_count(), 1);
    assert!(direct_source.request_count() > cached_source.request_count());
}

#[tokio::test]
async fn test_repeated_metadata_requests_do_not_read() {
    let source = TrackingMockReader::new(full_file(), "mock://repeat.nd2");
    let reader = Nd2Reader::open(BlockCache::with_capacity(source.clone(), 1024, 1))
        .await
        .unwrap();

    reader.metadata().await;
    let requests = source.request_count();

    for _ in 0..5 {
        reader.metadata().await;
    }
    assert_eq!(source.request_count(), requests);
}
