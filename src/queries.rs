// ============================================================================
// Query Terms
// ============================================================================

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;

use crate::error::{Result, WallpoolError};

/// Search terms a fetch worker draws from, read from a JSON array of strings.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    terms: Vec<String>,
}

impl QueryTerms {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WallpoolError::Config(format!("cannot read query list {}: {}", path.display(), e))
        })?;
        let terms: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            WallpoolError::Config(format!("cannot parse query list {}: {}", path.display(), e))
        })?;
        QueryTerms::new(terms)
    }

    pub fn new(terms: Vec<String>) -> Result<Self> {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(WallpoolError::Config("query list is empty".into()));
        }
        Ok(QueryTerms { terms })
    }

    pub fn pick(&self) -> Result<&str> {
        self.terms
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .ok_or_else(|| WallpoolError::Config("query list is empty".into()))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_and_pick() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pexels.json");
        fs::write(&path, r#"["forest", " ", "ocean waves"]"#).unwrap();

        let terms = QueryTerms::load(&path).unwrap();
        assert_eq!(terms.len(), 2);
        for _ in 0..20 {
            let term = terms.pick().unwrap();
            assert!(term == "forest" || term == "ocean waves");
        }
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = QueryTerms::load(&temp_dir.path().join("pexels.json")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_or_malformed_list_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pexels.json");

        fs::write(&path, "[]").unwrap();
        assert!(matches!(QueryTerms::load(&path), Err(WallpoolError::Config(_))));

        fs::write(&path, r#"{"terms": ["a"]}"#).unwrap();
        assert!(matches!(QueryTerms::load(&path), Err(WallpoolError::Config(_))));
    }
}
