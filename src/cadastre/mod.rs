//! Property boundary lookup
//!
//! A provider answers "which parcel contains this point" with zero or more
//! polygon rings.

pub mod nsw;

use crate::domain::{Boundary, GeoPoint};
use crate::error::LookupError;

pub use nsw::NswCadastre;

/// Point-in-parcel boundary lookup
pub trait BoundaryProvider {
    /// Return the parcel rings containing `point`, or an empty boundary if none
    fn lookup(&self, point: GeoPoint) -> Result<Boundary, LookupError>;
}

/// Look up a boundary, treating provider failures as "not found"
pub fn lookup_or_empty(provider: &dyn BoundaryProvider, point: GeoPoint) -> Boundary {
    match provider.lookup(point) {
        Ok(boundary) => {
            if boundary.is_empty() {
                log::info!("No cadastral boundary at ({:.6}, {:.6})", point.lat, point.lng);
            } else {
                log::info!(
                    "Found cadastral boundary with {} ring(s)",
                    boundary.rings().len()
                );
            }
            boundary
        }
        Err(err) => {
            log::warn!("Boundary lookup failed, continuing without boundary: {err}");
            Boundary::not_found()
        }
    }
}
