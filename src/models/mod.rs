pub mod catalog_types;
pub mod classify_types;
