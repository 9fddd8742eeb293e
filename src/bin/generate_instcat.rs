//! Instance catalog generator
//!
//! For each requested observation history ID this tool queries the OpSim
//! visit database, selects stars and galaxies within the field of view, and
//! writes a PhoSim header file plus gzip-compressed object catalogs.
//!
//! Usage:
//!   cargo run --bin generate_instcat -- --db opsim.db --id 230 231 \
//!       --star_db stars.csv --descqa_cat_file galaxies.csv --out catalogs/

use std::path::Path;
use std::time::Instant;

use clap::{ArgAction, Parser};

use instcat::catalogs::{DescqaCatalog, SkyCatalog, StarCatalog};
use instcat::data::resolve_star_catalog;
use instcat::instcat::{generate_observation, GenerateOptions, OutputFrame};
use instcat::OpsimDb;

/// Type alias for the error type used throughout this module
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Instance catalog generator
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generates instance catalogs for survey observations",
    long_about = None
)]
struct Args {
    /// Path to the OpSim database to query
    #[arg(long = "db", default_value = "minion_1016_sqlite_new_dithers.db")]
    db: String,

    /// Path to the DESCQA galaxy catalog file
    #[arg(long = "descqa_cat_file", default_value = "proto-dc2_v2.0.csv")]
    descqa_cat_file: String,

    /// Star catalog export: a local path or an http(s) URL
    #[arg(long = "star_db", default_value = "stars.csv")]
    star_db: String,

    /// Directory where output will be written
    #[arg(long = "out", default_value = ".")]
    out: String,

    /// obsHistID to generate an instance catalog for (one or more)
    #[arg(long = "id", required = true, num_args = 1..)]
    id: Vec<i64>,

    /// Flag to disable dithering
    #[arg(long = "disable_dithering", action = ArgAction::SetTrue)]
    disable_dithering: bool,

    /// The minimum magnitude for stars
    #[arg(long = "min_mag", default_value_t = 10.0)]
    min_mag: f64,

    /// Field of view radius in degrees
    #[arg(long = "fov", default_value_t = 2.0)]
    fov: f64,

    /// Flag to enable proper motion
    #[arg(long = "enable_proper_motion", action = ArgAction::SetTrue)]
    enable_proper_motion: bool,

    /// Minimum number of objects in a trimmed instance catalog
    #[arg(long = "minsource", default_value_t = 100)]
    minsource: u32,

    /// Flag to produce object catalogs for imSim
    #[arg(long = "imsim_catalog", action = ArgAction::SetTrue)]
    imsim_catalog: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let opsim = OpsimDb::open(&args.db)?;

    let star_path = resolve_star_catalog(&args.star_db)?;
    let stars = StarCatalog::from_file(&star_path, None)?;
    println!("Star catalog: {} entries", stars.len());

    let galaxies = DescqaCatalog::from_file(&args.descqa_cat_file)?;
    println!("Galaxy catalog: {} component rows", galaxies.len());

    let options = GenerateOptions {
        min_mag: args.min_mag,
        minsource: args.minsource,
        frame: if args.imsim_catalog {
            OutputFrame::Icrs
        } else {
            OutputFrame::Observed
        },
        apply_proper_motion: args.enable_proper_motion,
    };

    let out_dir = Path::new(&args.out);
    let start_time = Instant::now();

    for &obs_hist_id in &args.id {
        let mut obs = opsim.observation(obs_hist_id, args.fov)?;
        if !args.disable_dithering {
            obs.apply_dither()?;
        }

        println!(
            "Observation {}: {} band {} at RA {:.4} deg, Dec {:.4} deg",
            obs.obs_hist_id,
            obs.calendar_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| format!("MJD {:.3}", obs.mjd)),
            obs.band,
            obs.pointing_ra,
            obs.pointing_dec
        );

        let outputs = generate_observation(&obs, &stars, &galaxies, &options, out_dir)?;
        println!(
            "  wrote {} stars, {} bright stars, {} galaxy components",
            outputs.star_counts.stars, outputs.star_counts.bright, outputs.galaxy_count
        );
        println!("  header: {}", outputs.header.display());
    }

    println!(
        "Generated {} instance catalog(s) in {:.2?}",
        args.id.len(),
        start_time.elapsed()
    );

    Ok(())
}
