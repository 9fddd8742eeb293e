//! Source catalogs module
//!
//! This module provides the star and galaxy catalogs an instance catalog is
//! drawn from, plus seeded synthetic generators for testing and development.

use crate::coordinates::Equatorial;

pub mod descqa;
pub mod stars;
pub mod synthetic;

pub use descqa::{DescqaCatalog, GalaxyComponent, GalaxyEntry};
pub use stars::{StarCatalog, StarEntry};
pub use synthetic::SyntheticFieldConfig;

/// Trait for accessing source position data
pub trait SkyPosition {
    /// Get right ascension in degrees
    fn ra_deg(&self) -> f64;

    /// Get declination in degrees
    fn dec_deg(&self) -> f64;
}

/// Generic trait for source catalogs
pub trait SkyCatalog {
    /// Entry type for this catalog
    type Entry: SkyPosition;

    /// Get all entries in the catalog
    fn entries(&self) -> impl Iterator<Item = &Self::Entry>;

    /// Get the number of entries in the catalog
    fn len(&self) -> usize;

    /// Check if the catalog is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filter entries based on a predicate
    fn filter<F>(&self, predicate: F) -> Vec<&Self::Entry>
    where
        F: Fn(&Self::Entry) -> bool,
    {
        self.entries().filter(|e| predicate(e)).collect()
    }

    /// Get entries within a circular field of view, in catalog order
    fn in_field(&self, center: Equatorial, radius_deg: f64) -> Vec<&Self::Entry> {
        let radius_rad = radius_deg.to_radians();

        // Get cosine of the radius for faster checks
        let cos_radius = radius_rad.cos();

        self.filter(|entry| {
            let pos = Equatorial::from_degrees(entry.ra_deg(), entry.dec_deg());

            // Source is in the field if cosine of separation exceeds cosine
            // of the radius (inverse relationship for angles in [0, pi])
            let cos_dist = pos.dec.sin() * center.dec.sin()
                + pos.dec.cos() * center.dec.cos() * (pos.ra - center.ra).cos();
            cos_dist > cos_radius
        })
    }
}
