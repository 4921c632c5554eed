//! # Settings Module
//!
//! ## Purpose
//! Reader configuration for GeochemBasis. The switches decide which edits the
//! [`DatabaseReader`](crate::Geochemistry::DatabaseReader::DatabaseReader) applies to a database
//! before parsing it, plus the log level used by the command-line binary.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "reexpress_free_electron": true,
//!   "use_piecewise_interpolation": false,
//!   "remove_all_extrapolated_secondary_species": false,
//!   "log_level": "info"
//! }
//! ```
//! Missing fields take their default values, a missing file gives the default configuration.
//!
//! ## Usage Pattern
//! ```rust
//! use GeochemBasis::settings::ReaderSettings;
//!
//! let settings = ReaderSettings::from_file("geochem_settings.json").unwrap();
//! assert!(settings.reexpress_free_electron);
//! ```

use crate::Geochemistry::geochem_errors::GeochemError;
use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Switches applied while reading a database.
///
/// # Fields
/// * `reexpress_free_electron` - rewrite `e-` through `O2(aq)` instead of `O2(g)`
/// * `use_piecewise_interpolation` - force the "piecewise-linear" log10K model when the header
///   names one
/// * `remove_all_extrapolated_secondary_species` - drop secondary species whose log10K is flagged
///   as extrapolated
/// * `log_level` - level for the binary's terminal logger ("error", "warn", "info", "debug", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub reexpress_free_electron: bool,
    pub use_piecewise_interpolation: bool,
    pub remove_all_extrapolated_secondary_species: bool,
    pub log_level: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            reexpress_free_electron: true,
            use_piecewise_interpolation: false,
            remove_all_extrapolated_secondary_species: false,
            log_level: "info".to_string(),
        }
    }
}

impl ReaderSettings {
    /// Loads settings from a JSON file. An absent file yields the defaults.
    pub fn from_file(config_file: &str) -> Result<Self, GeochemError> {
        if !Path::new(config_file).exists() {
            info!(
                "settings file '{}' not found, using default reader settings",
                config_file
            );
            return Ok(Self::default());
        }
        let content = fs::read_to_string(config_file).map_err(|e| GeochemError::Io {
            path: config_file.to_string(),
            source: e,
        })?;
        Self::from_json(config_file, &content)
    }

    /// Parses settings from JSON text; `origin` labels error messages.
    pub fn from_json(origin: &str, content: &str) -> Result<Self, GeochemError> {
        serde_json::from_str(content).map_err(|e| GeochemError::Json {
            path: origin.to_string(),
            source: e,
        })
    }

    /// Saves the settings as pretty JSON.
    pub fn save(&self, config_file: &str) -> Result<(), GeochemError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| GeochemError::Json {
            path: config_file.to_string(),
            source: e,
        })?;
        fs::write(config_file, content).map_err(|e| GeochemError::Io {
            path: config_file.to_string(),
            source: e,
        })
    }

    /// `log_level` as a filter; unknown names fall back to `Info`.
    pub fn log_level_filter(&self) -> LevelFilter {
        match LevelFilter::from_str(self.log_level.trim()) {
            Ok(level) => level,
            Err(_) => {
                warn!("unknown log level '{}', using info", self.log_level);
                LevelFilter::Info
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = ReaderSettings::default();
        assert!(settings.reexpress_free_electron);
        assert!(!settings.use_piecewise_interpolation);
        assert!(!settings.remove_all_extrapolated_secondary_species);
        assert_eq!(settings.log_level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = ReaderSettings::from_file("no_such_settings_file.json").unwrap();
        assert_eq!(settings, ReaderSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            "{{ \"reexpress_free_electron\": false, \"log_level\": \"debug\" }}"
        )
        .unwrap();
        let file_path = temp_file.path().to_str().unwrap();
        let settings = ReaderSettings::from_file(file_path).unwrap();
        assert!(!settings.reexpress_free_electron);
        assert!(!settings.use_piecewise_interpolation);
        assert_eq!(settings.log_level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_malformed_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{ \"reexpress_free_electron\": ").unwrap();
        let file_path = temp_file.path().to_str().unwrap();
        let result = ReaderSettings::from_file(file_path);
        assert!(matches!(result, Err(GeochemError::Json { .. })));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_file = NamedTempFile::new().unwrap();
        let file_path = temp_file.path().to_str().unwrap();
        let settings = ReaderSettings {
            remove_all_extrapolated_secondary_species: true,
            ..ReaderSettings::default()
        };
        settings.save(file_path).unwrap();
        let reloaded = ReaderSettings::from_file(file_path).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_unknown_log_level() {
        let settings = ReaderSettings {
            log_level: "loud".to_string(),
            ..ReaderSettings::default()
        };
        assert_eq!(settings.log_level_filter(), LevelFilter::Info);
    }
}
