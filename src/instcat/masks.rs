//! Derived mask columns for instance catalog rows
//!
//! Each function maps per-row input arrays to a same-length output column.
//! `None` entries mean "drop this row" to the downstream writer; everything
//! else passes through in input order.

use std::f64::consts::PI;

use crate::coordinates::wrap_ra;

/// Half-angle of the protoDC2 survey region, radians (2.5 degrees)
pub const PROTO_DC2_HALF_SIZE: f64 = 2.5 * PI / 180.0;

/// Floor magnitudes at `floor` to avoid simulating unrealistically bright
/// sources. A `None` floor passes the input through unchanged.
pub fn mask_magnitudes(raw: &[f64], floor: Option<f64>) -> Vec<f64> {
    match floor {
        None => raw.to_vec(),
        Some(floor) => raw
            .iter()
            .map(|&m| if m < floor { floor } else { m })
            .collect(),
    }
}

/// Membership flags for a square sky region of half-angle `half_size`
/// centered on the origin. RA is re-wrapped into [-π, π) so the box can
/// straddle RA = 0; the flag is `Some(1.0)` for rows strictly inside the
/// box in both coordinates.
pub fn field_membership(ra: &[f64], dec: &[f64], half_size: f64) -> Vec<Option<f64>> {
    ra.iter()
        .zip(dec.iter())
        .map(|(&ra, &dec)| {
            let ra = wrap_ra(ra);
            if ra > -half_size && ra < half_size && dec > -half_size && dec < half_size {
                Some(1.0)
            } else {
                None
            }
        })
        .collect()
}

/// Bright-star flags: the raw magnitude for rows strictly below `floor`,
/// `None` for everything else.
pub fn bright_star_mask(raw: &[f64], floor: f64) -> Vec<Option<f64>> {
    raw.iter()
        .map(|&m| if m < floor { Some(m) } else { None })
        .collect()
}
