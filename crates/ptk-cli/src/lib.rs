//! # ptk-cli — Operator CLI for the Tokenization Pipeline
//!
//! ## Subcommands
//!
//! - `ptk validate <FILE>`: check a submission file against every field
//!   invariant and list the violations.
//! - `ptk verify <FILE> [--seed N]`: run the full pipeline in-process
//!   against the stub oracle and print the outcome as JSON.
//!
//! ```bash
//! ptk validate tower.json
//! ptk --config pipeline.yaml verify tower.yaml --seed 42
//! ```
//!
//! Submission files are JSON when the extension is `.json`, YAML otherwise.

pub mod validate;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use ptk_core::AssetSubmission;

/// Read and parse a submission file. Field invariants are not checked here.
pub fn load_submission(path: &Path) -> Result<AssetSubmission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("{} is not a valid submission document", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("{} is not a valid submission document", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptk_core::submission::fixtures::office_tower;

    #[test]
    fn loads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("tower.json");
        std::fs::write(&json_path, serde_json::to_string(&office_tower()).unwrap()).unwrap();
        let yaml_path = dir.path().join("tower.yaml");
        std::fs::write(&yaml_path, serde_yaml::to_string(&office_tower()).unwrap()).unwrap();

        assert_eq!(load_submission(&json_path).unwrap(), office_tower());
        assert_eq!(load_submission(&yaml_path).unwrap(), office_tower());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_submission(Path::new("/nonexistent/tower.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/tower.json"));
    }
}
