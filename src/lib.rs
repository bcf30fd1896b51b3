//! Parcel-outlined satellite tiles for garden likelihood surveys

pub mod cadastre;
pub mod capture;
pub mod classify;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod session;
