//! DESCQA-style galaxy catalog implementation
//!
//! Galaxies arrive as one row per morphological component (bulge or disk),
//! each carrying the lensing and extinction columns the sersic2d output
//! needs. The reader takes the flat CSV export of the DESCQA access layer,
//! gzipped or not.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{SkyCatalog, SkyPosition};
use crate::Result;
use crate::InstcatError;

/// Morphological component of a galaxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GalaxyComponent {
    Bulge,
    Disk,
}

impl GalaxyComponent {
    /// Sersic index conventionally assigned to this component
    pub fn default_sersic_index(&self) -> f64 {
        match self {
            GalaxyComponent::Bulge => 4.0,
            GalaxyComponent::Disk => 1.0,
        }
    }

    fn from_field(s: &str) -> Option<Self> {
        match s {
            "bulge" => Some(GalaxyComponent::Bulge),
            "disk" => Some(GalaxyComponent::Disk),
            _ => None,
        }
    }
}

/// One galaxy component row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalaxyEntry {
    /// Galaxy identifier shared by both components
    pub galaxy_id: u64,
    /// Which component this row describes
    pub component: GalaxyComponent,
    /// Right ascension in degrees (ICRS)
    pub ra: f64,
    /// Declination in degrees (ICRS)
    pub dec: f64,
    /// PhoSim normalization magnitude of the component
    pub magnorm: f64,
    /// SED file path relative to the simulator's SED root
    pub sed_filepath: String,
    /// Cosmological redshift
    pub redshift: f64,
    /// Weak lensing shear, first component
    pub gamma1: f64,
    /// Weak lensing shear, second component
    pub gamma2: f64,
    /// Weak lensing convergence
    pub kappa: f64,
    /// Semi-major axis in arcseconds
    pub major_axis: f64,
    /// Semi-minor axis in arcseconds
    pub minor_axis: f64,
    /// Position angle in degrees
    pub position_angle: f64,
    /// Sersic profile index
    pub sersic_index: f64,
    /// Internal dust extinction A_v
    pub internal_av: f64,
    /// Internal dust extinction R_v
    pub internal_rv: f64,
    /// Milky Way extinction A_v along the line of sight
    pub galactic_av: f64,
    /// Milky Way extinction R_v along the line of sight
    pub galactic_rv: f64,
}

impl SkyPosition for GalaxyEntry {
    fn ra_deg(&self) -> f64 {
        self.ra
    }

    fn dec_deg(&self) -> f64 {
        self.dec
    }
}

/// Galaxy catalog held in catalog order
#[derive(Debug, Clone, Default)]
pub struct DescqaCatalog {
    rows: Vec<GalaxyEntry>,
}

impl DescqaCatalog {
    /// Create a new empty galaxy catalog
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Create a catalog from a vector of component rows
    pub fn from_rows(rows: Vec<GalaxyEntry>) -> Self {
        Self { rows }
    }

    /// Load from a file (either CSV or gzipped CSV)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path).map_err(InstcatError::IoError)?;

        let metadata = file.metadata().map_err(InstcatError::IoError)?;
        if metadata.len() == 0 {
            return Err(InstcatError::DataError(
                "Galaxy catalog file is empty".to_string(),
            ));
        }

        let is_gzipped = path.as_ref().to_string_lossy().ends_with(".gz");

        let reader: Box<dyn BufRead> = if is_gzipped {
            log::info!(
                "Loading gzipped galaxy catalog: {}",
                path.as_ref().display()
            );
            let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
            Box::new(BufReader::new(decoder))
        } else {
            log::info!("Loading galaxy catalog: {}", path.as_ref().display());
            Box::new(BufReader::new(file))
        };

        let mut lines_iter = reader.lines();
        let header = match lines_iter.next() {
            Some(Ok(line)) => line,
            _ => {
                return Err(InstcatError::DataError(
                    "Failed to read header from galaxy catalog".to_string(),
                ))
            }
        };

        let headers: Vec<&str> = header.split(',').collect();
        let find_column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|&h| h == name)
                .ok_or_else(|| InstcatError::DataError(format!("Missing column: {}", name)))
        };

        let galaxy_id_idx = find_column("galaxy_id")?;
        let component_idx = find_column("component")?;
        let ra_idx = find_column("ra")?;
        let dec_idx = find_column("dec")?;
        let magnorm_idx = find_column("magnorm")?;
        let sed_idx = find_column("sed_filepath")?;
        let redshift_idx = find_column("redshift")?;
        let gamma1_idx = find_column("gamma1")?;
        let gamma2_idx = find_column("gamma2")?;
        let kappa_idx = find_column("kappa")?;
        let major_idx = find_column("major_axis")?;
        let minor_idx = find_column("minor_axis")?;
        let pa_idx = find_column("position_angle")?;
        let sersic_idx = find_column("sersic_index")?;
        let int_av_idx = find_column("internal_av")?;
        let int_rv_idx = find_column("internal_rv")?;
        let gal_av_idx = find_column("galactic_av")?;
        let gal_rv_idx = find_column("galactic_rv")?;

        let mut rows = Vec::new();
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
                continue;
            }

            let galaxy_id = match fields[galaxy_id_idx].parse::<u64>() {
                Ok(id) => id,
                Err(_) => continue,
            };

            let component = match GalaxyComponent::from_field(fields[component_idx]) {
                Some(c) => c,
                None => continue,
            };

            let parse_f64 = |idx: usize| -> Option<f64> { fields[idx].parse::<f64>().ok() };

            let ra = match parse_f64(ra_idx) {
                Some(v) => v,
                None => continue,
            };
            let dec = match parse_f64(dec_idx) {
                Some(v) => v,
                None => continue,
            };
            let magnorm = match parse_f64(magnorm_idx) {
                Some(v) => v,
                None => continue,
            };

            let sed_filepath = fields[sed_idx].to_string();
            if sed_filepath.is_empty() {
                continue;
            }

            let redshift = match parse_f64(redshift_idx) {
                Some(v) => v,
                None => continue,
            };
            let gamma1 = parse_f64(gamma1_idx).unwrap_or(0.0);
            let gamma2 = parse_f64(gamma2_idx).unwrap_or(0.0);
            let kappa = parse_f64(kappa_idx).unwrap_or(0.0);

            let major_axis = match parse_f64(major_idx) {
                Some(v) => v,
                None => continue,
            };
            let minor_axis = match parse_f64(minor_idx) {
                Some(v) => v,
                None => continue,
            };
            let position_angle = match parse_f64(pa_idx) {
                Some(v) => v,
                None => continue,
            };
            let sersic_index =
                parse_f64(sersic_idx).unwrap_or_else(|| component.default_sersic_index());

            let internal_av = parse_f64(int_av_idx).unwrap_or(0.0);
            let internal_rv = parse_f64(int_rv_idx).unwrap_or(3.1);

            let galactic_av = match parse_f64(gal_av_idx) {
                Some(v) => v,
                None => continue,
            };
            let galactic_rv = match parse_f64(gal_rv_idx) {
                Some(v) => v,
                None => continue,
            };

            rows.push(GalaxyEntry {
                galaxy_id,
                component,
                ra,
                dec,
                magnorm,
                sed_filepath,
                redshift,
                gamma1,
                gamma2,
                kappa,
                major_axis,
                minor_axis,
                position_angle,
                sersic_index,
                internal_av,
                internal_rv,
                galactic_av,
                galactic_rv,
            });
        }

        if rows.is_empty() {
            return Err(InstcatError::DataError(format!(
                "No valid galaxy components found in catalog. Read {} lines.",
                line_count
            )));
        }

        log::info!(
            "Loaded {} galaxy components from catalog (processed {} lines)",
            rows.len(),
            line_count
        );
        Ok(Self { rows })
    }

    /// Rows of the requested component, in catalog order
    pub fn component(&self, component: GalaxyComponent) -> Vec<&GalaxyEntry> {
        self.rows
            .iter()
            .filter(|row| row.component == component)
            .collect()
    }
}

impl SkyCatalog for DescqaCatalog {
    type Entry = GalaxyEntry;

    fn entries(&self) -> impl Iterator<Item = &GalaxyEntry> {
        self.rows.iter()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GALAXY_HEADER: &str = "galaxy_id,component,ra,dec,magnorm,sed_filepath,\
        redshift,gamma1,gamma2,kappa,major_axis,minor_axis,position_angle,sersic_index,\
        internal_av,internal_rv,galactic_av,galactic_rv";

    #[test]
    fn test_from_file_splits_components() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", GALAXY_HEADER).unwrap();
        writeln!(
            file,
            "7,bulge,52.9,-27.4,19.5,galaxySED/Burst.10E10.1Z.spec.gz,0.52,0.01,-0.02,0.001,1.2,0.8,45.0,4.0,0.3,3.1,0.05,3.1"
        )
        .unwrap();
        writeln!(
            file,
            "7,disk,52.9,-27.4,18.7,galaxySED/Exp.40E09.02Z.spec.gz,0.52,0.01,-0.02,0.001,2.5,1.1,45.0,1.0,0.4,3.1,0.05,3.1"
        )
        .unwrap();
        writeln!(
            file,
            "8,halo,52.8,-27.3,18.0,galaxySED/Exp.40E09.02Z.spec.gz,0.3,0,0,0,1.0,1.0,0.0,1.0,0,3.1,0.05,3.1"
        )
        .unwrap();

        let catalog = DescqaCatalog::from_file(file.path()).unwrap();

        // Unknown component rows are skipped
        assert_eq!(catalog.len(), 2);

        let bulges = catalog.component(GalaxyComponent::Bulge);
        assert_eq!(bulges.len(), 1);
        assert_eq!(bulges[0].galaxy_id, 7);
        assert_eq!(bulges[0].sersic_index, 4.0);

        let disks = catalog.component(GalaxyComponent::Disk);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].magnorm, 18.7);
    }

    #[test]
    fn test_default_sersic_indices() {
        assert_eq!(GalaxyComponent::Bulge.default_sersic_index(), 4.0);
        assert_eq!(GalaxyComponent::Disk.default_sersic_index(), 1.0);
    }
}
