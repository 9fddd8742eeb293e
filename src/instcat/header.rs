//! PhoSim header composition
//!
//! The header file is a sequence of `key value` lines describing the
//! observation, followed by the object files to include. Key order is
//! stable so headers diff cleanly between runs.

use std::io::{self, Write};

use crate::opsim::ObservationMetaData;
use crate::Result;

/// Ordered key/value header map
#[derive(Debug, Clone, Default)]
pub struct PhosimHeader {
    entries: Vec<(String, String)>,
}

impl PhosimHeader {
    /// Create an empty header
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build the standard header for one observation.
    ///
    /// Single-snap 30 second visits on the full camera, seeded by the
    /// observation history ID so reruns are deterministic.
    pub fn from_observation(obs: &ObservationMetaData) -> Result<Self> {
        let mut header = Self::new();
        header.set("rightascension", format!("{:.7}", obs.pointing_ra));
        header.set("declination", format!("{:.7}", obs.pointing_dec));
        header.set("mjd", format!("{:.8}", obs.mjd));
        header.set("altitude", format!("{:.7}", obs.altitude));
        header.set("azimuth", format!("{:.7}", obs.azimuth));
        header.set("filter", obs.filter_index()?.to_string());
        header.set("rotskypos", format!("{:.7}", obs.rot_sky_pos));
        header.set("rottelpos", format!("{:.7}", obs.rot_tel_pos));
        header.set("obshistid", obs.obs_hist_id.to_string());
        header.set("seed", obs.obs_hist_id.to_string());
        header.set("nsnap", "1".to_string());
        header.set("vistime", "30.0".to_string());
        header.set("camconfig", "1".to_string());
        Ok(header)
    }

    /// Set a key, replacing any existing value while keeping its position
    pub fn set(&mut self, key: &str, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    /// Look up a key's value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Write the header lines
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (key, value) in &self.entries {
            writeln!(writer, "{} {}", key, value)?;
        }
        Ok(())
    }
}
