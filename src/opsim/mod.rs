//! OpSim visit database access
//!
//! An OpSim run produces an SQLite file with one `Summary` row per simulated
//! visit. This module fetches the pointing metadata for a single observation
//! history ID and applies the per-visit dithered pointing when requested.
//! Angles are stored in radians in the database and exposed in degrees here.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::coordinates::Equatorial;
use crate::InstcatError;
use crate::Result;

/// MJD of the Unix epoch, for calendar conversions
const UNIX_EPOCH_MJD: f64 = 40587.0;

const SUMMARY_QUERY_DITHERED: &str = "SELECT fieldRA, fieldDec, rotSkyPos, rotTelPos, expMJD, \
     filter, altitude, azimuth, randomDitherFieldPerVisitRA, randomDitherFieldPerVisitDec, \
     ditheredRotTelPos FROM Summary WHERE obsHistID = ?1";

const SUMMARY_QUERY_PLAIN: &str = "SELECT fieldRA, fieldDec, rotSkyPos, rotTelPos, expMJD, \
     filter, altitude, azimuth FROM Summary WHERE obsHistID = ?1";

/// Per-visit dither columns, in radians as stored
#[derive(Debug, Clone, Copy)]
pub struct DitherColumns {
    /// Dithered field RA
    pub ra: f64,
    /// Dithered field Dec
    pub dec: f64,
    /// Dithered telescope rotator angle
    pub rot_tel_pos: f64,
}

/// Pointing metadata for one simulated visit
#[derive(Debug, Clone)]
pub struct ObservationMetaData {
    /// Observation history ID selecting the visit
    pub obs_hist_id: i64,
    /// Pointing RA in degrees
    pub pointing_ra: f64,
    /// Pointing Dec in degrees
    pub pointing_dec: f64,
    /// Rotation of the sky relative to the camera, degrees
    pub rot_sky_pos: f64,
    /// Telescope rotator angle, degrees
    pub rot_tel_pos: f64,
    /// Modified Julian Date of the exposure
    pub mjd: f64,
    /// Filter band name (one of ugrizy)
    pub band: String,
    /// Telescope altitude, degrees
    pub altitude: f64,
    /// Telescope azimuth, degrees
    pub azimuth: f64,
    /// Field-of-view radius used for source selection, degrees
    pub fov_deg: f64,
    /// Dither columns if the database carries them
    pub dither: Option<DitherColumns>,
}

impl ObservationMetaData {
    /// Field center as an equatorial coordinate
    pub fn pointing(&self) -> Equatorial {
        Equatorial::from_degrees(self.pointing_ra, self.pointing_dec)
    }

    /// Replace the pointing with the per-visit dithered values.
    ///
    /// The dithered rotator angle replaces `rot_tel_pos` and `rot_sky_pos`
    /// is shifted by the same amount, preserving the visit's sky-to-rotator
    /// offset.
    pub fn apply_dither(&mut self) -> Result<()> {
        let dither = self.dither.ok_or_else(|| {
            InstcatError::DataError(format!(
                "Observation {} has no dither columns; rerun with dithering disabled",
                self.obs_hist_id
            ))
        })?;

        let rot_delta = dither.rot_tel_pos.to_degrees() - self.rot_tel_pos;

        self.pointing_ra = dither.ra.to_degrees();
        self.pointing_dec = dither.dec.to_degrees();
        self.rot_tel_pos = dither.rot_tel_pos.to_degrees();
        self.rot_sky_pos += rot_delta;

        Ok(())
    }

    /// Index of the filter band in the standard ugrizy ordering
    pub fn filter_index(&self) -> Result<usize> {
        match self.band.as_str() {
            "u" => Ok(0),
            "g" => Ok(1),
            "r" => Ok(2),
            "i" => Ok(3),
            "z" => Ok(4),
            "y" => Ok(5),
            other => Err(InstcatError::DataError(format!(
                "Unknown filter band '{}' for observation {}",
                other, self.obs_hist_id
            ))),
        }
    }

    /// Civil date of the exposure, for display
    pub fn calendar_date(&self) -> Option<DateTime<Utc>> {
        let secs = ((self.mjd - UNIX_EPOCH_MJD) * 86400.0).round() as i64;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Handle on an OpSim visit database
#[derive(Debug)]
pub struct OpsimDb {
    conn: Connection,
}

impl OpsimDb {
    /// Open a visit database. The path must already exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InstcatError::DataError(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Fetch the observation with the given history ID.
    ///
    /// `fov_deg` sets the circular selection radius attached to the
    /// returned metadata; it is not stored in the database.
    pub fn observation(&self, obs_hist_id: i64, fov_deg: f64) -> Result<ObservationMetaData> {
        // Dither columns only exist in some OpSim products; fall back to the
        // base schema when the prepared statement rejects them.
        match self.query_summary(SUMMARY_QUERY_DITHERED, obs_hist_id, fov_deg, true) {
            Err(InstcatError::DatabaseError(rusqlite::Error::SqliteFailure(_, _))) => {
                self.query_summary(SUMMARY_QUERY_PLAIN, obs_hist_id, fov_deg, false)
            }
            other => other,
        }
    }

    fn query_summary(
        &self,
        sql: &str,
        obs_hist_id: i64,
        fov_deg: f64,
        with_dither: bool,
    ) -> Result<ObservationMetaData> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![obs_hist_id])?;

        let row = match rows.next()? {
            Some(row) => row,
            None => return Err(InstcatError::ObservationNotFound(obs_hist_id)),
        };

        let field_ra: f64 = row.get(0)?;
        let field_dec: f64 = row.get(1)?;
        let rot_sky_pos: f64 = row.get(2)?;
        let rot_tel_pos: f64 = row.get(3)?;
        let mjd: f64 = row.get(4)?;
        let band: String = row.get(5)?;
        let altitude: f64 = row.get(6)?;
        let azimuth: f64 = row.get(7)?;

        let dither = if with_dither {
            let ra: Option<f64> = row.get(8)?;
            let dec: Option<f64> = row.get(9)?;
            let rot: Option<f64> = row.get(10)?;
            match (ra, dec, rot) {
                (Some(ra), Some(dec), Some(rot_tel_pos)) => Some(DitherColumns {
                    ra,
                    dec,
                    rot_tel_pos,
                }),
                _ => None,
            }
        } else {
            None
        };

        Ok(ObservationMetaData {
            obs_hist_id,
            pointing_ra: field_ra.to_degrees(),
            pointing_dec: field_dec.to_degrees(),
            rot_sky_pos: rot_sky_pos.to_degrees(),
            rot_tel_pos: rot_tel_pos.to_degrees(),
            mjd,
            band,
            altitude: altitude.to_degrees(),
            azimuth: azimuth.to_degrees(),
            fov_deg,
            dither,
        })
    }
}
