//! Synthetic field generator with realistic source distributions
//!
//! Seeded generators for star and galaxy catalogs covering a single pointing,
//! used by the test suite and for development runs without survey data. The
//! magnitude model follows the usual logarithmic source-count slope (roughly
//! 2.5x more sources per magnitude step).

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use super::descqa::{DescqaCatalog, GalaxyComponent, GalaxyEntry};
use super::stars::{StarCatalog, StarEntry};

const STAR_SEDS: [&str; 3] = [
    "starSED/phoSimMLT/lte033-3.5-1.0a+0.4.BT-Settl.spec.gz",
    "starSED/kurucz/km10_5750.fits_g40_5790.gz",
    "starSED/wDs/bergeron_10000_75.dat_10100.gz",
];

const BULGE_SED: &str = "galaxySED/Burst.10E10.1Z.spec.gz";
const DISK_SED: &str = "galaxySED/Exp.40E09.02Z.spec.gz";

/// Configuration for synthetic field generation
pub struct SyntheticFieldConfig {
    /// Number of stars to generate
    pub star_count: usize,
    /// Number of galaxies to generate (each yields one or two component rows)
    pub galaxy_count: usize,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Field center RA in degrees
    pub center_ra: f64,
    /// Field center Dec in degrees
    pub center_dec: f64,
    /// Field radius in degrees
    pub fov_deg: f64,
    /// Brightest star magnitude
    pub min_magnitude: f64,
    /// Dimmest star magnitude
    pub max_magnitude: f64,
}

impl Default for SyntheticFieldConfig {
    fn default() -> Self {
        Self {
            star_count: 100,
            galaxy_count: 100,
            seed: 42,
            center_ra: 0.0,
            center_dec: 0.0,
            fov_deg: 2.0,
            min_magnitude: 8.0,
            max_magnitude: 22.0,
        }
    }
}

impl SyntheticFieldConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of stars to generate
    pub fn with_star_count(mut self, count: usize) -> Self {
        self.star_count = count;
        self
    }

    /// Set the number of galaxies to generate
    pub fn with_galaxy_count(mut self, count: usize) -> Self {
        self.galaxy_count = count;
        self
    }

    /// Set the random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the field center in degrees
    pub fn with_pointing(mut self, ra_deg: f64, dec_deg: f64) -> Self {
        self.center_ra = ra_deg;
        self.center_dec = dec_deg;
        self
    }

    /// Set the field radius in degrees
    pub fn with_fov(mut self, fov_deg: f64) -> Self {
        self.fov_deg = fov_deg;
        self
    }

    /// Set the magnitude range
    pub fn with_magnitude_range(mut self, min: f64, max: f64) -> Self {
        self.min_magnitude = min;
        self.max_magnitude = max;
        self
    }

    /// Generate a synthetic star catalog for the configured field
    pub fn generate_stars(&self) -> StarCatalog {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut stars = Vec::with_capacity(self.star_count);

        for id in 1..=self.star_count {
            let (ra, dec) = self.sample_position(&mut rng);
            let magnorm = self.sample_magnitude(&mut rng);
            let sed = STAR_SEDS[rng.gen_range(0..STAR_SEDS.len())];

            stars.push(StarEntry {
                id: id as u64,
                ra,
                dec,
                magnorm,
                sed_filepath: sed.to_string(),
                pm_ra: if rng.gen_bool(0.7) {
                    Some(rng.gen_range(-200.0..200.0))
                } else {
                    None
                },
                pm_dec: if rng.gen_bool(0.7) {
                    Some(rng.gen_range(-200.0..200.0))
                } else {
                    None
                },
                parallax: if rng.gen_bool(0.5) {
                    Some(rng.gen_range(0.1..50.0))
                } else {
                    None
                },
                radial_velocity: if rng.gen_bool(0.5) {
                    Some(rng.gen_range(-80.0..80.0))
                } else {
                    None
                },
                galactic_av: rng.gen_range(0.01..0.5),
                galactic_rv: 3.1,
            });
        }

        StarCatalog::from_stars(stars)
    }

    /// Generate a synthetic galaxy catalog for the configured field
    pub fn generate_galaxies(&self) -> DescqaCatalog {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        let mut rows = Vec::with_capacity(self.galaxy_count * 2);

        for id in 1..=self.galaxy_count {
            let (ra, dec) = self.sample_position(&mut rng);
            let redshift = rng.gen_range(0.02..1.4);
            let gamma1 = rng.gen_range(-0.03..0.03);
            let gamma2 = rng.gen_range(-0.03..0.03);
            let kappa = rng.gen_range(-0.01..0.05);
            let position_angle = rng.gen_range(0.0..180.0);
            let galactic_av = rng.gen_range(0.01..0.5);

            let has_bulge = rng.gen_bool(0.6);
            // Every galaxy gets at least one component
            let has_disk = !has_bulge || rng.gen_bool(0.9);

            if has_bulge {
                let major = rng.gen_range(0.3..2.0);
                rows.push(GalaxyEntry {
                    galaxy_id: id as u64,
                    component: GalaxyComponent::Bulge,
                    ra,
                    dec,
                    magnorm: self.sample_magnitude(&mut rng) + 4.0,
                    sed_filepath: BULGE_SED.to_string(),
                    redshift,
                    gamma1,
                    gamma2,
                    kappa,
                    major_axis: major,
                    minor_axis: major * rng.gen_range(0.4..1.0),
                    position_angle,
                    sersic_index: GalaxyComponent::Bulge.default_sersic_index(),
                    internal_av: rng.gen_range(0.0..1.0),
                    internal_rv: 3.1,
                    galactic_av,
                    galactic_rv: 3.1,
                });
            }

            if has_disk {
                let major = rng.gen_range(0.8..4.0);
                rows.push(GalaxyEntry {
                    galaxy_id: id as u64,
                    component: GalaxyComponent::Disk,
                    ra,
                    dec,
                    magnorm: self.sample_magnitude(&mut rng) + 4.0,
                    sed_filepath: DISK_SED.to_string(),
                    redshift,
                    gamma1,
                    gamma2,
                    kappa,
                    major_axis: major,
                    minor_axis: major * rng.gen_range(0.2..0.8),
                    position_angle,
                    sersic_index: GalaxyComponent::Disk.default_sersic_index(),
                    internal_av: rng.gen_range(0.0..1.0),
                    internal_rv: 3.1,
                    galactic_av,
                    galactic_rv: 3.1,
                });
            }
        }

        DescqaCatalog::from_rows(rows)
    }

    /// Sample a position uniformly within the field disc, in degrees
    fn sample_position(&self, rng: &mut StdRng) -> (f64, f64) {
        let uniform = Uniform::from(0.0..1.0f64);

        // sqrt for uniform areal density over the disc; the tangent-plane
        // offsets are exact enough at survey field scales
        let r = self.fov_deg * uniform.sample(rng).sqrt() * 0.999;
        let theta = rng.gen_range(0.0..2.0 * PI);

        let dec = self.center_dec + r * theta.sin();
        let cos_dec = dec.to_radians().cos().max(1e-6);
        let ra = self.center_ra + r * theta.cos() / cos_dec;

        (ra.rem_euclid(360.0), dec)
    }

    /// Sample a magnitude following the logarithmic source-count slope
    fn sample_magnitude(&self, rng: &mut StdRng) -> f64 {
        let log_base: f64 = 2.5;
        let u: f64 = rng.gen_range(0.0..1.0);

        let exp_range = log_base.powf(self.max_magnitude - self.min_magnitude) - 1.0;
        let t = u * exp_range + 1.0;

        self.min_magnitude
            + t.log(log_base)
                .clamp(0.0, self.max_magnitude - self.min_magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::SkyCatalog;
    use crate::coordinates::Equatorial;

    #[test]
    fn test_generation_is_reproducible() {
        let config = SyntheticFieldConfig::new().with_seed(99).with_star_count(50);
        let a = config.generate_stars();
        let b = config.generate_stars();

        for (x, y) in a.entries().zip(b.entries()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.ra, y.ra);
            assert_eq!(x.magnorm, y.magnorm);
        }
    }

    #[test]
    fn test_stars_fall_in_field() {
        let config = SyntheticFieldConfig::new()
            .with_pointing(120.0, -30.0)
            .with_fov(1.5)
            .with_star_count(300);
        let catalog = config.generate_stars();

        let center = Equatorial::from_degrees(120.0, -30.0);
        assert_eq!(catalog.in_field(center, 1.5).len(), catalog.len());
    }

    #[test]
    fn test_magnitudes_respect_range() {
        let config = SyntheticFieldConfig::new()
            .with_magnitude_range(10.0, 16.0)
            .with_star_count(200);
        for star in config.generate_stars().entries() {
            assert!(star.magnorm >= 10.0 && star.magnorm <= 16.0);
        }
    }

    #[test]
    fn test_every_galaxy_has_a_component() {
        let config = SyntheticFieldConfig::new().with_galaxy_count(80);
        let catalog = config.generate_galaxies();
        assert!(catalog.len() >= 80);

        let bulges = catalog.component(GalaxyComponent::Bulge).len();
        let disks = catalog.component(GalaxyComponent::Disk).len();
        assert_eq!(bulges + disks, catalog.len());
        assert!(disks > 0);
    }
}
