//! Dive-site input files.
//!
//! The CLI reads sites from a JSON array of [`DiveSite`] objects:
//!
//! ```json
//! [
//!   { "id": "tulamben-liberty", "name": "USAT Liberty Wreck",
//!     "latitude": -8.274, "longitude": 115.593,
//!     "location": "Tulamben, Bali, Indonesia", "country": "Indonesia" }
//! ]
//! ```
//!
//! `location` and `country` may be omitted.

use crate::geo::DiveSite;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse dive sites from JSON text.
pub fn parse_sites(json: &str) -> Result<Vec<DiveSite>, SitesError> {
    Ok(serde_json::from_str(json)?)
}

/// Load dive sites from a JSON file.
pub fn load_sites(path: &Path) -> Result<Vec<DiveSite>, SitesError> {
    let content = fs::read_to_string(path)?;
    let sites = parse_sites(&content)?;
    log::debug!("loaded {} sites from {}", sites.len(), path.display());
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_full_and_sparse_records() {
        let sites = parse_sites(
            r#"[
                {"id": "a", "name": "Blue Corner", "latitude": 7.13, "longitude": 134.22,
                 "location": "Koror, Palau", "country": "Palau"},
                {"id": "b", "name": "Unnamed Pinnacle", "latitude": -1.5, "longitude": 120.0}
            ]"#,
        )
        .unwrap();

        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].country.as_deref(), Some("Palau"));
        assert_eq!(sites[0].location.as_deref(), Some("Koror, Palau"));
        assert_eq!(sites[1].location, None);
        assert_eq!(sites[1].country, None);
    }

    #[test]
    fn parse_rejects_missing_coordinates() {
        let result = parse_sites(r#"[{"id": "a", "name": "Nowhere"}]"#);
        assert!(matches!(result, Err(SitesError::Json(_))));
    }

    #[test]
    fn load_sites_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sites.json");
        fs::write(
            &path,
            r#"[{"id": "x", "name": "Shark Point", "latitude": 27.9, "longitude": 34.3}]"#,
        )
        .unwrap();

        let sites = load_sites(&path).unwrap();
        assert_eq!(sites[0].id, "x");
    }

    #[test]
    fn load_sites_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_sites(&tmp.path().join("missing.json"));
        assert!(matches!(result, Err(SitesError::Io(_))));
    }
}
