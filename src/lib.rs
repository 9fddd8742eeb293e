//! Instcat: instance catalog generation for survey image simulations
//!
//! This crate turns a survey-scheduler visit (an OpSim database row) plus a
//! star catalog and a galaxy catalog into the plain-text "instance catalogs"
//! consumed by telescope image simulators such as PhoSim: one header file per
//! observation and gzip-compressed object lists for stars, bright stars, and
//! galaxies.

use thiserror::Error;

pub mod catalogs;
pub mod coordinates;
pub mod data;
pub mod instcat;
pub mod opsim;

// Re-export commonly used types
pub use coordinates::Equatorial;
pub use instcat::{GenerateOptions, OutputFrame};
pub use opsim::{ObservationMetaData, OpsimDb};

/// Main error type for the instcat library
#[derive(Debug, Error)]
pub enum InstcatError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Scheduling database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Observation {0} not found in scheduling database")]
    ObservationNotFound(i64),

    #[error("Download error: {0}")]
    DownloadError(String),
}

/// Result type for instcat operations
pub type Result<T> = std::result::Result<T, InstcatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::synthetic::SyntheticFieldConfig;
    use crate::catalogs::SkyCatalog;

    #[test]
    fn test_synthetic_field_generation() {
        let config = SyntheticFieldConfig::new()
            .with_seed(7)
            .with_star_count(500)
            .with_pointing(0.0, 0.0)
            .with_fov(3.0);

        let stars = config.generate_stars();
        assert_eq!(stars.len(), 500);

        // Every generated star lands within the requested field
        let center = Equatorial::from_degrees(0.0, 0.0);
        let in_field = stars.in_field(center, 3.0);
        assert_eq!(in_field.len(), stars.len());
    }

    #[test]
    fn test_error_display_names_observation() {
        let err = InstcatError::ObservationNotFound(230);
        assert!(err.to_string().contains("230"));
    }
}
