//! Pure domain types with minimal dependencies
//!
//! Types here do no I/O and know nothing about HTTP clients, image codecs or
//! the filesystem.

pub mod geometry;
pub mod overlay;
pub mod survey;

pub use geometry::*;
pub use overlay::*;
pub use survey::*;
