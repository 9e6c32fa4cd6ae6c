pub mod catalog_cache;
pub mod classifier;
pub mod corpus_service;
pub mod pagination;
pub mod watcher;
