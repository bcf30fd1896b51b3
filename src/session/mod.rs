//! Survey session persistence
//!
//! This module contains:
//! - Address-keyed result stores
//! - File naming for annotated images and results
//! - Master results and reports compiled across surveys

pub mod paths;
pub mod report;
pub mod store;

pub use store::{JsonResultStore, MemoryStore, ResultStore};
