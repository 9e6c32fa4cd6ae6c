mod common;

use common::corpus;
use deepfake_lense_lib::models::catalog_types::{Category, PageLookup};
use deepfake_lense_lib::services::catalog_cache::CatalogCache;
use deepfake_lense_lib::ErrorCode;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

#[tokio::test]
async fn catalog_counts_match_corpus_and_labels_match_directories() {
    let tmp = corpus(7, 4);
    fs::write(tmp.path().join("Fake").join("UPPER.JPG"), b"x").unwrap();
    fs::write(tmp.path().join("Real").join("mixed.JpEg"), b"x").unwrap();
    fs::write(tmp.path().join("Real").join("notes.txt"), b"x").unwrap();
    fs::write(tmp.path().join("Fake").join("thumbs.db"), b"x").unwrap();

    let cache = CatalogCache::new(tmp.path());
    let catalog = cache.get_catalog().await.unwrap();

    assert_eq!(catalog.len(), 8 + 5);
    for sample in catalog.samples() {
        let dir = sample.full_path().parent().unwrap().file_name().unwrap();
        assert_eq!(dir.to_string_lossy(), sample.category().dir_name());
        assert!(!sample.relative_url().ends_with(".txt"));
        assert!(!sample.relative_url().ends_with(".db"));
    }
    let fakes = catalog
        .samples()
        .iter()
        .filter(|s| s.category() == Category::Fake)
        .count();
    assert_eq!(fakes, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_reads_scan_once() {
    let tmp = corpus(20, 20);
    let cache = CatalogCache::new(tmp.path());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_catalog().await.unwrap() })
        })
        .collect();

    let mut catalogs = Vec::new();
    for h in handles {
        catalogs.push(h.await.unwrap());
    }

    assert_eq!(cache.scan_count(), 1);
    for c in &catalogs[1..] {
        assert!(Arc::ptr_eq(&catalogs[0], c));
        assert_eq!(catalogs[0].samples(), c.samples());
    }
}

#[tokio::test]
async fn shuffle_does_not_favor_any_ordering() {
    let tmp = corpus(2, 1);
    let cache = CatalogCache::new(tmp.path());
    let rounds = 600;

    let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
    for _ in 0..rounds {
        cache.invalidate().await;
        let catalog = cache.get_catalog().await.unwrap();
        let order = catalog
            .samples()
            .iter()
            .map(|s| s.relative_url().to_string())
            .collect();
        *seen.entry(order).or_default() += 1;
    }

    // 3 items -> 6 orderings, ~100 hits each
    assert_eq!(seen.len(), 6);
    for count in seen.values() {
        assert!(*count > 40 && *count < 180, "skewed shuffle: {:?}", seen);
    }
    assert_eq!(cache.scan_count(), rounds);
}

#[tokio::test]
async fn pagination_over_cached_catalog() {
    let tmp = corpus(15, 10);
    let cache = CatalogCache::new(tmp.path());

    let PageLookup::Found(first) = cache.get_page(1, 10).await.unwrap() else {
        panic!("page 1 should exist");
    };
    let PageLookup::Found(third) = cache.get_page(3, 10).await.unwrap() else {
        panic!("page 3 should exist");
    };
    assert_eq!(first.items.len(), 10);
    assert_eq!(third.items.len(), 5);
    assert_eq!(first.total_pages, 3);

    assert_eq!(
        cache.get_page(4, 10).await.unwrap(),
        PageLookup::OutOfRange { last_page: 3 }
    );
    assert_eq!(
        cache.get_page(0, 10).await.unwrap_err().code(),
        ErrorCode::InvalidArgument
    );

    // Pages are slices of one fixed order.
    let catalog = cache.get_catalog().await.unwrap();
    assert_eq!(first.items.as_slice(), &catalog.samples()[..10]);
    assert_eq!(third.items.as_slice(), &catalog.samples()[20..]);
}

#[tokio::test]
async fn empty_corpus_is_reported_not_served_blank() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CatalogCache::new(tmp.path());
    let err = cache.get_page(1, 10).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CorpusEmpty);
}
