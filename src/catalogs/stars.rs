//! Star catalog implementation
//!
//! Point-source rows for instance catalog generation, loaded from a CSV or
//! gzipped CSV export of the survey star database.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{SkyCatalog, SkyPosition};
use crate::Result;
use crate::InstcatError;

/// Modified Julian Date of the J2000 catalog epoch
pub const J2000_MJD: f64 = 51544.5;

/// Struct representing one star in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarEntry {
    /// Unique identifier from the source database
    pub id: u64,
    /// Right ascension in degrees (ICRS, epoch J2000)
    pub ra: f64,
    /// Declination in degrees (ICRS, epoch J2000)
    pub dec: f64,
    /// PhoSim normalization magnitude
    pub magnorm: f64,
    /// SED file path relative to the simulator's SED root
    pub sed_filepath: String,
    /// Proper motion in RA (mas/year, includes cos(dec)), if available
    pub pm_ra: Option<f64>,
    /// Proper motion in Dec (mas/year), if available
    pub pm_dec: Option<f64>,
    /// Parallax (mas), if available
    pub parallax: Option<f64>,
    /// Radial velocity (km/s), if available
    pub radial_velocity: Option<f64>,
    /// Milky Way extinction A_v along the line of sight
    pub galactic_av: f64,
    /// Milky Way extinction R_v along the line of sight
    pub galactic_rv: f64,
}

impl StarEntry {
    /// Position at the given epoch in degrees.
    ///
    /// With `apply_proper_motion` set, linear proper motion is applied from
    /// J2000; otherwise the catalog position is returned and the motion
    /// columns are treated as zero.
    pub fn position_at(&self, mjd: f64, apply_proper_motion: bool) -> (f64, f64) {
        if !apply_proper_motion {
            return (self.ra, self.dec);
        }

        let dt_years = (mjd - J2000_MJD) / 365.25;
        let pm_ra = self.pm_ra.unwrap_or(0.0);
        let pm_dec = self.pm_dec.unwrap_or(0.0);

        // mas/yr to degrees, undoing the cos(dec) factor on the RA component
        let cos_dec = self.dec.to_radians().cos();
        let dra = if cos_dec.abs() > 1e-12 {
            pm_ra * dt_years / 3.6e6 / cos_dec
        } else {
            0.0
        };
        let ddec = pm_dec * dt_years / 3.6e6;

        (self.ra + dra, self.dec + ddec)
    }
}

impl SkyPosition for StarEntry {
    fn ra_deg(&self) -> f64 {
        self.ra
    }

    fn dec_deg(&self) -> f64 {
        self.dec
    }
}

/// Star catalog held in catalog order
#[derive(Debug, Clone, Default)]
pub struct StarCatalog {
    stars: Vec<StarEntry>,
}

impl StarCatalog {
    /// Create a new empty star catalog
    pub fn new() -> Self {
        Self { stars: Vec::new() }
    }

    /// Create a catalog from a vector of stars
    pub fn from_stars(stars: Vec<StarEntry>) -> Self {
        Self { stars }
    }

    /// Load from a file (either CSV or gzipped CSV), optionally skipping
    /// stars fainter than `faint_limit`
    pub fn from_file<P: AsRef<Path>>(path: P, faint_limit: Option<f64>) -> Result<Self> {
        let file = File::open(&path).map_err(InstcatError::IoError)?;

        // Check if the file is empty
        let metadata = file.metadata().map_err(InstcatError::IoError)?;
        if metadata.len() == 0 {
            return Err(InstcatError::DataError(
                "Star catalog file is empty".to_string(),
            ));
        }

        // Determine if the file is gzipped or not
        let is_gzipped = path.as_ref().to_string_lossy().ends_with(".gz");

        let reader: Box<dyn BufRead> = if is_gzipped {
            log::info!("Loading gzipped star catalog: {}", path.as_ref().display());
            let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
            Box::new(BufReader::new(decoder))
        } else {
            log::info!("Loading star catalog: {}", path.as_ref().display());
            Box::new(BufReader::new(file))
        };

        let mut lines_iter = reader.lines();
        let header = match lines_iter.next() {
            Some(Ok(line)) => line,
            _ => {
                return Err(InstcatError::DataError(
                    "Failed to read header from star catalog".to_string(),
                ))
            }
        };

        // Parse header to find column indices
        let headers: Vec<&str> = header.split(',').collect();
        let find_column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|&h| h == name)
                .ok_or_else(|| InstcatError::DataError(format!("Missing column: {}", name)))
        };

        let id_idx = find_column("id")?;
        let ra_idx = find_column("ra")?;
        let dec_idx = find_column("dec")?;
        let magnorm_idx = find_column("magnorm")?;
        let sed_idx = find_column("sed_filepath")?;
        let pm_ra_idx = find_column("pm_ra")?;
        let pm_dec_idx = find_column("pm_dec")?;
        let parallax_idx = find_column("parallax")?;
        let rv_idx = find_column("radial_velocity")?;
        let gal_av_idx = find_column("galactic_av")?;
        let gal_rv_idx = find_column("galactic_rv")?;

        let mut stars = Vec::new();
        let mut line_count = 0;

        for line_result in lines_iter {
            let line = match line_result {
                Ok(l) => l,
                Err(e) => {
                    log::warn!("Error reading line: {}", e);
                    continue;
                }
            };

            line_count += 1;

            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < headers.len() {
                continue; // Skip lines with insufficient columns
            }

            let id = match fields[id_idx].parse::<u64>() {
                Ok(id) => id,
                Err(_) => continue,
            };

            let ra = match fields[ra_idx].parse::<f64>() {
                Ok(ra) => ra,
                Err(_) => continue,
            };

            let dec = match fields[dec_idx].parse::<f64>() {
                Ok(dec) => dec,
                Err(_) => continue,
            };

            let magnorm = match fields[magnorm_idx].parse::<f64>() {
                Ok(mag) => mag,
                Err(_) => continue,
            };

            if let Some(limit) = faint_limit {
                if magnorm > limit {
                    continue;
                }
            }

            let sed_filepath = fields[sed_idx].to_string();
            if sed_filepath.is_empty() {
                continue;
            }

            let parse_optional = |idx: usize| -> Option<f64> {
                if fields[idx].is_empty() {
                    None
                } else {
                    fields[idx].parse::<f64>().ok()
                }
            };

            let pm_ra = parse_optional(pm_ra_idx);
            let pm_dec = parse_optional(pm_dec_idx);
            let parallax = parse_optional(parallax_idx);
            let radial_velocity = parse_optional(rv_idx);

            let galactic_av = match fields[gal_av_idx].parse::<f64>() {
                Ok(av) => av,
                Err(_) => continue,
            };

            let galactic_rv = match fields[gal_rv_idx].parse::<f64>() {
                Ok(rv) => rv,
                Err(_) => continue,
            };

            stars.push(StarEntry {
                id,
                ra,
                dec,
                magnorm,
                sed_filepath,
                pm_ra,
                pm_dec,
                parallax,
                radial_velocity,
                galactic_av,
                galactic_rv,
            });
        }

        if stars.is_empty() {
            return Err(InstcatError::DataError(format!(
                "No valid stars found in catalog. Read {} lines.",
                line_count
            )));
        }

        log::info!(
            "Loaded {} stars from catalog (processed {} lines)",
            stars.len(),
            line_count
        );
        Ok(Self { stars })
    }

    /// Get stars brighter than a given magnitude
    pub fn brighter_than(&self, magnitude: f64) -> Vec<&StarEntry> {
        self.stars
            .iter()
            .filter(|star| star.magnorm <= magnitude)
            .collect()
    }
}

impl SkyCatalog for StarCatalog {
    type Entry = StarEntry;

    fn entries(&self) -> impl Iterator<Item = &StarEntry> {
        self.stars.iter()
    }

    fn len(&self) -> usize {
        self.stars.len()
    }
}
