//! Data module for retrieving star catalog exports
//!
//! The star database behind an instance catalog run is usually served over
//! HTTP as a CSV export; this module downloads and caches those files so a
//! catalog is fetched at most once per machine.

mod downloader;

pub use downloader::{
    ensure_cache_dir, fetch_star_catalog, get_cache_dir, resolve_star_catalog,
};
