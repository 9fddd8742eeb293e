//! Object file writing and finalization
//!
//! Star and bright-star files come from one pass over the field's rows
//! feeding two sinks, each filtered by its own mask column. Galaxy files are
//! written bulge-first with the disk rows appended. Finished object files
//! are gzip-compressed and the uncompressed originals removed.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::masks::{bright_star_mask, field_membership, mask_magnitudes, PROTO_DC2_HALF_SIZE};
use super::{GenerateOptions, OutputFrame};
use crate::catalogs::{GalaxyEntry, StarEntry};
use crate::opsim::ObservationMetaData;
use crate::Result;

/// Rows written to the star and bright-star sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarWriteCounts {
    pub stars: usize,
    pub bright: usize,
}

/// One point-source object line
fn point_source_line(star: &StarEntry, ra: f64, dec: f64, magnorm: f64) -> String {
    format!(
        "object {} {:.9} {:.9} {:.4} {} 0 0 0 0 0 0 point none CCM {:.4} {:.2}",
        star.id, ra, dec, magnorm, star.sed_filepath, star.galactic_av, star.galactic_rv
    )
}

/// One sersic2d object line
fn sersic_line(galaxy: &GalaxyEntry) -> String {
    format!(
        "object {} {:.9} {:.9} {:.4} {} {:.6} {:.6} {:.6} {:.6} 0 0 sersic2d {:.6} {:.6} {:.4} {:.1} CCM {:.4} {:.2} CCM {:.4} {:.2}",
        galaxy.galaxy_id,
        galaxy.ra,
        galaxy.dec,
        galaxy.magnorm,
        galaxy.sed_filepath,
        galaxy.redshift,
        galaxy.gamma1,
        galaxy.gamma2,
        galaxy.kappa,
        galaxy.major_axis,
        galaxy.minor_axis,
        galaxy.position_angle,
        galaxy.sersic_index,
        galaxy.internal_av,
        galaxy.internal_rv,
        galaxy.galactic_av,
        galaxy.galactic_rv
    )
}

/// Write the star and bright-star object files in one pass.
///
/// The star sink keeps rows inside the survey region with their magnitudes
/// floored at `options.min_mag`; the bright sink keeps rows strictly below
/// the floor with their raw magnitudes. Input order is preserved in both.
pub fn write_star_catalogs<P: AsRef<Path>, Q: AsRef<Path>>(
    stars: &[&StarEntry],
    obs: &ObservationMetaData,
    options: &GenerateOptions,
    star_path: P,
    bright_path: Q,
) -> Result<StarWriteCounts> {
    // Output positions per the configured frame
    let positions: Vec<(f64, f64)> = stars
        .iter()
        .map(|star| match options.frame {
            OutputFrame::Observed => star.position_at(obs.mjd, options.apply_proper_motion),
            OutputFrame::Icrs => (star.ra, star.dec),
        })
        .collect();

    let ra_rad: Vec<f64> = positions.iter().map(|(ra, _)| ra.to_radians()).collect();
    let dec_rad: Vec<f64> = positions.iter().map(|(_, dec)| dec.to_radians()).collect();
    let raw_mags: Vec<f64> = stars.iter().map(|star| star.magnorm).collect();

    let membership = field_membership(&ra_rad, &dec_rad, PROTO_DC2_HALF_SIZE);
    let masked_mags = mask_magnitudes(&raw_mags, Some(options.min_mag));
    let bright_flags = bright_star_mask(&raw_mags, options.min_mag);

    let mut star_sink = BufWriter::new(File::create(star_path.as_ref())?);
    let mut bright_sink = BufWriter::new(File::create(bright_path.as_ref())?);
    let mut counts = StarWriteCounts { stars: 0, bright: 0 };

    for (i, star) in stars.iter().enumerate() {
        let (ra, dec) = positions[i];

        if membership[i].is_some() {
            writeln!(star_sink, "{}", point_source_line(star, ra, dec, masked_mags[i]))?;
            counts.stars += 1;
        }

        if let Some(raw) = bright_flags[i] {
            writeln!(bright_sink, "{}", point_source_line(star, ra, dec, raw))?;
            counts.bright += 1;
        }
    }

    star_sink.flush()?;
    bright_sink.flush()?;
    Ok(counts)
}

/// Write galaxy component rows, truncating or appending to the file
pub fn write_galaxy_rows<P: AsRef<Path>>(
    rows: &[&GalaxyEntry],
    path: P,
    append: bool,
) -> Result<usize> {
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path.as_ref())?;
    let mut sink = BufWriter::new(file);

    for galaxy in rows {
        writeln!(sink, "{}", sersic_line(galaxy))?;
    }

    sink.flush()?;
    Ok(rows.len())
}

/// Gzip-compress a file to `<name>.gz` and remove the original
pub fn gzip_and_remove<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut gz_name = path.as_os_str().to_os_string();
    gz_name.push(".gz");
    let gz_path = PathBuf::from(gz_name);

    let mut input = File::open(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(&gz_path)?), Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()?;

    fs::remove_file(path)?;
    Ok(gz_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::GalaxyComponent;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn star(id: u64, ra: f64, dec: f64, magnorm: f64) -> StarEntry {
        StarEntry {
            id,
            ra,
            dec,
            magnorm,
            sed_filepath: "starSED/kurucz/km10_5750.fits_g40_5790.gz".to_string(),
            pm_ra: None,
            pm_dec: None,
            parallax: None,
            radial_velocity: None,
            galactic_av: 0.1,
            galactic_rv: 3.1,
        }
    }

    fn observation() -> ObservationMetaData {
        ObservationMetaData {
            obs_hist_id: 42,
            pointing_ra: 0.0,
            pointing_dec: 0.0,
            rot_sky_pos: 0.0,
            rot_tel_pos: 0.0,
            mjd: 59580.0,
            band: "r".to_string(),
            altitude: 60.0,
            azimuth: 120.0,
            fov_deg: 2.0,
            dither: None,
        }
    }

    #[test]
    fn test_two_sink_write_filters_by_mask() {
        let dir = tempfile::tempdir().unwrap();
        let star_path = dir.path().join("star_cat.txt");
        let bright_path = dir.path().join("bright_stars.txt");

        let entries = vec![
            star(1, 0.5, 0.5, 8.0),    // in region, bright
            star(2, 1.0, -1.0, 14.0),  // in region, faint
            star(3, 40.0, 0.0, 7.0),   // out of region, bright
            star(4, 0.0, 30.0, 14.0),  // out of region, faint
        ];
        let refs: Vec<&StarEntry> = entries.iter().collect();

        let options = GenerateOptions {
            min_mag: 10.0,
            ..GenerateOptions::default()
        };
        let counts =
            write_star_catalogs(&refs, &observation(), &options, &star_path, &bright_path).unwrap();

        assert_eq!(counts, StarWriteCounts { stars: 2, bright: 2 });

        let star_text = fs::read_to_string(&star_path).unwrap();
        let star_lines: Vec<&str> = star_text.lines().collect();
        assert_eq!(star_lines.len(), 2);

        // Row 1 is floored to 10.0, row 2 passes through at 14.0
        assert!(star_lines[0].starts_with("object 1 "));
        assert!(star_lines[0].contains(" 10.0000 "));
        assert!(star_lines[1].starts_with("object 2 "));
        assert!(star_lines[1].contains(" 14.0000 "));

        // Bright list keeps raw magnitudes regardless of region
        let bright_text = fs::read_to_string(&bright_path).unwrap();
        let bright_lines: Vec<&str> = bright_text.lines().collect();
        assert_eq!(bright_lines.len(), 2);
        assert!(bright_lines[0].starts_with("object 1 "));
        assert!(bright_lines[0].contains(" 8.0000 "));
        assert!(bright_lines[1].starts_with("object 3 "));
    }

    #[test]
    fn test_point_source_line_layout() {
        let line = point_source_line(&star(9, 1.25, -0.5, 11.5), 1.25, -0.5, 11.5);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields[0], "object");
        assert_eq!(fields[1], "9");
        assert_eq!(fields[12], "point");
        assert_eq!(fields[13], "none");
        assert_eq!(fields[14], "CCM");
        assert_eq!(fields.len(), 17);
    }

    #[test]
    fn test_sersic_line_layout() {
        let galaxy = GalaxyEntry {
            galaxy_id: 77,
            component: GalaxyComponent::Disk,
            ra: 0.3,
            dec: -0.2,
            magnorm: 19.0,
            sed_filepath: "galaxySED/Exp.40E09.02Z.spec.gz".to_string(),
            redshift: 0.6,
            gamma1: 0.01,
            gamma2: -0.01,
            kappa: 0.002,
            major_axis: 2.1,
            minor_axis: 1.0,
            position_angle: 30.0,
            sersic_index: 1.0,
            internal_av: 0.2,
            internal_rv: 3.1,
            galactic_av: 0.05,
            galactic_rv: 3.1,
        };
        let line = sersic_line(&galaxy);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields[0], "object");
        assert_eq!(fields[1], "77");
        assert_eq!(fields[12], "sersic2d");
        assert_eq!(fields[17], "CCM");
        assert_eq!(fields[20], "CCM");
        assert_eq!(fields.len(), 23);
    }

    #[test]
    fn test_galaxy_append_preserves_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gal_cat.txt");

        let bulge = GalaxyEntry {
            galaxy_id: 1,
            component: GalaxyComponent::Bulge,
            ra: 0.0,
            dec: 0.0,
            magnorm: 20.0,
            sed_filepath: "galaxySED/Burst.10E10.1Z.spec.gz".to_string(),
            redshift: 0.5,
            gamma1: 0.0,
            gamma2: 0.0,
            kappa: 0.0,
            major_axis: 1.0,
            minor_axis: 0.5,
            position_angle: 10.0,
            sersic_index: 4.0,
            internal_av: 0.1,
            internal_rv: 3.1,
            galactic_av: 0.05,
            galactic_rv: 3.1,
        };
        let mut disk = bulge.clone();
        disk.component = GalaxyComponent::Disk;
        disk.sersic_index = 1.0;

        write_galaxy_rows(&[&bulge], &path, false).unwrap();
        write_galaxy_rows(&[&disk], &path, true).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" 4.0 "));
        assert!(lines[1].contains(" 1.0 "));
    }

    #[test]
    fn test_gzip_and_remove_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("star_cat_42.txt");
        fs::write(&path, "object 1 0.0 0.0 12.0\n").unwrap();

        let gz_path = gzip_and_remove(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(gz_path, dir.path().join("star_cat_42.txt.gz"));

        let mut decoder = GzDecoder::new(File::open(&gz_path).unwrap());
        let mut text = String::new();
        decoder.read_to_string(&mut text).unwrap();
        assert_eq!(text, "object 1 0.0 0.0 12.0\n");
    }
}
