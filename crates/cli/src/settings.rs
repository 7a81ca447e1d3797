use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use wtf_converter_core::shared::constants::DEFAULT_BENCHMARK_ITERATIONS;

/// Persisted defaults for the analysis commands. Command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Providers to compare when none are named; empty means every registered provider.
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default = "default_iterations")]
    pub benchmark_iterations: usize,
    #[serde(default)]
    pub parallel_benchmark: bool,
}

fn default_iterations() -> usize {
    DEFAULT_BENCHMARK_ITERATIONS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            benchmark_iterations: default_iterations(),
            parallel_benchmark: false,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wtf-converter").join("settings.json"))
    }

    /// Settings from the user config directory; defaults when missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("cannot read settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.benchmark_iterations, 3);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            providers: vec!["whisper".into(), "deepgram".into()],
            benchmark_iterations: 7,
            parallel_benchmark: true,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"parallel_benchmark": true}"#).unwrap();
        let settings = Settings::load_from(&path);
        assert!(settings.parallel_benchmark);
        assert_eq!(settings.benchmark_iterations, 3);
        assert!(settings.providers.is_empty());
    }

    #[test]
    fn test_unreadable_path_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load_from(dir.path()), Settings::default());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}
