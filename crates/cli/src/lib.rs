//! `perfdash` operator tool.
//!
//! Loads exported dashboard documents, drives the ordering engine from
//! `perfdash_core`, and writes the results. Exposed as a library so the
//! binary entrypoint and integration tests share the same building blocks.

pub mod commands;
pub mod config;
pub mod document;
pub mod error;
