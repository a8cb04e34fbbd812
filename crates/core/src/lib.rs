//! Widget ordering engine for performance dashboards.
//!
//! Pure, synchronous transformations over an in-memory widget collection:
//! positional moves (including moves across section boundaries), metric
//! reordering, tree projection for drag-and-drop views, and integrity checks.
//! Persistence is left to the caller.

pub mod error;
pub mod integrity;
pub mod metric;
pub mod ordering;
pub mod tree;
pub mod types;
pub mod widget;
