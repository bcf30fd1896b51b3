//! Annotation and survey orchestration
//!
//! This module contains:
//! - Boundary lookup and tile annotation for a single address
//! - The batch survey loop that classifies and persists each address

pub mod annotate;
pub mod survey;

pub use annotate::{FramedProperty, annotate, annotate_with_boundary, frame_property};
pub use survey::Survey;
