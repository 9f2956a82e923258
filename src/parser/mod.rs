//! Extraction engine: listing cards and profile pages to typed records.
//!
//! `dom` wraps the HTML tree, `classify` holds the bucketing rules, `listing`
//! and `detail` walk the two page shapes, and `merge` folds them together.

pub mod classify;
pub mod detail;
pub mod dom;
pub mod listing;
pub mod merge;
