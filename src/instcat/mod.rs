//! Instance catalog composition
//!
//! This module holds the locally-authored data shaping between the source
//! catalogs and the files on disk: derived mask columns, object-line and
//! header composition, and the per-observation pipeline that ties them
//! together. Output column selection is a configuration record, not a type
//! hierarchy.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::catalogs::{DescqaCatalog, GalaxyComponent, SkyCatalog, StarCatalog};
use crate::opsim::ObservationMetaData;
use crate::Result;

pub mod header;
pub mod masks;
pub mod writer;

pub use header::PhosimHeader;
pub use masks::{bright_star_mask, field_membership, mask_magnitudes, PROTO_DC2_HALF_SIZE};
pub use writer::{gzip_and_remove, write_galaxy_rows, write_star_catalogs, StarWriteCounts};

/// Reference frame of the emitted positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFrame {
    /// Positions at the observation epoch (proper motion applied if enabled)
    Observed,
    /// Catalog ICRS (J2000) positions, for imSim-style consumers
    Icrs,
}

/// Options controlling one generation run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Magnitude floor for stars; also the bright-star threshold
    pub min_mag: f64,
    /// Minimum object count the downstream simulator should accept
    pub minsource: u32,
    /// Position frame for the emitted object lines
    pub frame: OutputFrame,
    /// Apply linear proper motion to star positions
    pub apply_proper_motion: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            min_mag: 10.0,
            minsource: 100,
            frame: OutputFrame::Observed,
            apply_proper_motion: false,
        }
    }
}

/// Files produced for one observation
#[derive(Debug, Clone)]
pub struct ObservationOutputs {
    pub header: PathBuf,
    pub stars: PathBuf,
    pub bright_stars: PathBuf,
    pub galaxies: PathBuf,
    pub star_counts: StarWriteCounts,
    pub galaxy_count: usize,
}

/// Generate the instance catalog files for one observation.
///
/// Writes the header file, the star and bright-star object files (one pass,
/// two sinks), and the galaxy file (bulge rows first, disk rows appended),
/// then gzip-compresses the three object files in place.
pub fn generate_observation(
    obs: &ObservationMetaData,
    stars: &StarCatalog,
    galaxies: &DescqaCatalog,
    options: &GenerateOptions,
    out_dir: &Path,
) -> Result<ObservationOutputs> {
    fs::create_dir_all(out_dir)?;

    let star_name = format!("star_cat_{}.txt", obs.obs_hist_id);
    let gal_name = format!("gal_cat_{}.txt", obs.obs_hist_id);
    let bright_name = format!("bright_stars_{}.txt", obs.obs_hist_id);

    let header_path = out_dir.join(format!("phosim_cat_{}.txt", obs.obs_hist_id));
    let star_path = out_dir.join(&star_name);
    let gal_path = out_dir.join(&gal_name);
    let bright_path = out_dir.join(&bright_name);

    // Header names the object files the simulator should pull in; the
    // bright-star list is an auxiliary product and is not included.
    let mut header_file = fs::File::create(&header_path)?;
    let header = PhosimHeader::from_observation(obs)?;
    header.write(&mut header_file)?;
    writeln!(header_file, "minsource {}", options.minsource)?;
    writeln!(header_file, "includeobj {}.gz", star_name)?;
    writeln!(header_file, "includeobj {}.gz", gal_name)?;

    let field_stars = stars.in_field(obs.pointing(), obs.fov_deg);
    let star_counts =
        write_star_catalogs(&field_stars, obs, options, &star_path, &bright_path)?;

    let field_galaxies = galaxies.in_field(obs.pointing(), obs.fov_deg);
    let bulges: Vec<_> = field_galaxies
        .iter()
        .copied()
        .filter(|g| g.component == GalaxyComponent::Bulge)
        .collect();
    let disks: Vec<_> = field_galaxies
        .iter()
        .copied()
        .filter(|g| g.component == GalaxyComponent::Disk)
        .collect();

    let mut galaxy_count = write_galaxy_rows(&bulges, &gal_path, false)?;
    galaxy_count += write_galaxy_rows(&disks, &gal_path, true)?;

    let stars_gz = gzip_and_remove(&star_path)?;
    let gal_gz = gzip_and_remove(&gal_path)?;
    let bright_gz = gzip_and_remove(&bright_path)?;

    log::info!(
        "Observation {}: {} stars, {} bright stars, {} galaxy components",
        obs.obs_hist_id,
        star_counts.stars,
        star_counts.bright,
        galaxy_count
    );

    Ok(ObservationOutputs {
        header: header_path,
        stars: stars_gz,
        bright_stars: bright_gz,
        galaxies: gal_gz,
        star_counts,
        galaxy_count,
    })
}
