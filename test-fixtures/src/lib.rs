//! Test support for the Recall workspace.
//!
//! - [`fakes`]: deterministic inference backends and loaders
//! - [`store`]: in-memory [`VectorStore`](recall_core::traits::VectorStore)
//! - [`clock`]: manually advanced clock
//! - [`nodes`]: node builders
//! - golden JSON datasets under `golden/`, loaded with [`load_fixture`]

pub mod clock;
pub mod fakes;
pub mod nodes;
pub mod store;

use serde::de::DeserializeOwned;
use std::path::PathBuf;

pub use clock::ManualClock;
pub use fakes::{FailingLoader, FakeOutput, HashingBackend, HashingLoader};
pub use store::InMemoryVectorStore;

/// Root directory of the fixtures crate.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// List all JSON files in a fixture subdirectory, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension()
                .is_some_and(|ext| ext == "json")
                .then_some(path)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_root_exists() {
        assert!(fixtures_root().join("golden").exists());
    }

    #[test]
    fn all_golden_temporal_files_exist() {
        let files = [
            "golden/temporal/relative_expressions.json",
            "golden/temporal/absolute_expressions.json",
            "golden/temporal/recency_and_residual.json",
        ];
        for f in &files {
            assert!(fixture_exists(f), "Missing fixture: {}", f);
        }
    }

    #[test]
    fn golden_temporal_files_parse_as_json() {
        for path in list_fixtures("golden/temporal") {
            let relative = format!(
                "golden/temporal/{}",
                path.file_name().unwrap().to_string_lossy()
            );
            let value: serde_json::Value = load_fixture(&relative);
            assert!(value["cases"].is_array(), "{relative} has no cases array");
        }
    }
}
