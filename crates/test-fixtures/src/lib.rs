//! Oracle stubs, ground-truth DAGs and golden scenarios for pagoda tests.
//!
//! Golden scenarios live in `golden/` next to this crate's manifest and are
//! loaded with [`load_fixture`] / [`load_scenario`].

pub mod dag;
pub mod oracles;
pub mod scenario;

use std::path::PathBuf;

use serde::de::DeserializeOwned;

pub use dag::{random_dag, Dag};
pub use oracles::{CountingOracle, DsepOracle, FailingOracle, Fact, TableOracle};
pub use scenario::{load_scenario, Scenario};

/// Root directory of the golden fixtures.
pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
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

/// All JSON files directly under `golden/`, sorted.
pub fn list_fixtures() -> Vec<PathBuf> {
    let dir = fixtures_root();
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension().is_some_and(|ext| ext == "json").then_some(path)
        })
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_root_exists() {
        assert!(fixtures_root().exists(), "golden directory not found");
    }

    #[test]
    fn every_fixture_parses() {
        let files = list_fixtures();
        assert!(!files.is_empty());
        for path in files {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let scenario = load_scenario(&name);
            assert!(!scenario.variables.is_empty(), "{name} has no variables");
        }
    }
}
