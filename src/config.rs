//! Resizer configuration.
//!
//! Handles loading, validating, and merging a `printbatch.toml` file. Stock
//! defaults are the fixed limits and encoder settings the tool has always
//! used; a user file only overrides what it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_archive_bytes = 104857600  # 100 MB upload limit for the image archive
//! max_spec_bytes = 10485760      # 10 MB limit for the size sheet
//! max_image_bytes = 5242880      # 5 MB per image inside the archive
//!
//! [output]
//! quality = 95                   # JPEG quality (1-100)
//! compression_level = 6          # Deflate level for the output zip (0-9)
//!
//! [processing]
//! max_processes = 4              # Parallel workers (omit for sequential)
//!
//! [keep_alive]
//! heartbeat_secs = 30            # Heartbeat interval while a batch runs
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from a TOML file.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Upload and per-image size limits.
    pub limits: LimitsConfig,
    /// Encoder and packaging settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Keep-alive heartbeat while a batch runs.
    pub keep_alive: KeepAliveConfig,
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.compression_level > 9 {
            return Err(ConfigError::Validation(
                "output.compression_level must be 0-9".into(),
            ));
        }
        let limits = [
            ("limits.max_archive_bytes", self.limits.max_archive_bytes),
            ("limits.max_spec_bytes", self.limits.max_spec_bytes),
            ("limits.max_image_bytes", self.limits.max_image_bytes),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Validation(format!("{name} must be non-zero")));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.keep_alive.heartbeat_secs == 0 {
            return Err(ConfigError::Validation(
                "keep_alive.heartbeat_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Size limits in bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_archive_bytes: u64,
    pub max_spec_bytes: u64,
    /// Archive entries above this are reported as failures without decoding.
    pub max_image_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_archive_bytes: 100 * 1024 * 1024,
            max_spec_bytes: 10 * 1024 * 1024,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u8,
    /// Deflate level for entries in the output zip.
    pub compression_level: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            compression_level: 6,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, rows are processed one at a time.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeepAliveConfig {
    pub heartbeat_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self { heartbeat_secs: 30 }
    }
}

impl KeepAliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResizerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an optional file.
///
/// No path means stock defaults. A path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# printbatch Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass the file with `printbatch run --config printbatch.toml ...`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Size limits (bytes)
# ---------------------------------------------------------------------------
[limits]
# Largest accepted image archive (100 MB).
max_archive_bytes = 104857600

# Largest accepted size sheet (10 MB).
max_spec_bytes = 10485760

# Images inside the archive larger than this are reported as failed
# without being decoded (5 MB).
max_image_bytes = 5242880

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG encoding quality (1 = worst, 100 = best).
quality = 95

# Deflate compression level for the output zip (0 = store, 9 = smallest).
compression_level = 6

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to process one image at a time.
# max_processes = 4

# ---------------------------------------------------------------------------
# Keep-alive
# ---------------------------------------------------------------------------
[keep_alive]
# Seconds between heartbeats while a batch is running.
heartbeat_secs = 30
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("printbatch.toml");
        fs::write(&path, content).unwrap();
        path
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn default_config_matches_fixed_limits() {
        let config = ResizerConfig::default();
        assert_eq!(config.limits.max_archive_bytes, 100 * 1024 * 1024);
        assert_eq!(config.limits.max_spec_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(config.output.quality, 95);
        assert_eq!(config.output.compression_level, 6);
        assert_eq!(config.processing.max_processes, None);
        assert_eq!(config.keep_alive.interval(), Duration::from_secs(30));
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(ResizerConfig::default().validate().is_ok());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_without_path_is_default() {
        assert_eq!(load_config(None).unwrap(), ResizerConfig::default());
    }

    #[test]
    fn load_config_partial_override() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[output]
quality = 80

[processing]
max_processes = 2
"#,
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.quality, 80);
        assert_eq!(config.output.compression_level, 6);
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.limits, LimitsConfig::default());
    }

    #[test]
    fn load_config_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[output\nquality = ");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[output]\nqualty = 90\n");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[thumbnails]\naspect_ratio = [1, 1]\n");
        assert!(load_config(Some(&path)).is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_quality_bounds() {
        let mut config = ResizerConfig::default();
        config.output.quality = 0;
        assert!(config.validate().is_err());
        config.output.quality = 100;
        assert!(config.validate().is_ok());
        config.output.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_compression_level() {
        let mut config = ResizerConfig::default();
        config.output.compression_level = 10;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("compression_level"));
    }

    #[test]
    fn validate_zero_limit_names_key() {
        let mut config = ResizerConfig::default();
        config.limits.max_image_bytes = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("limits.max_image_bytes"));
    }

    #[test]
    fn validate_zero_workers_and_heartbeat() {
        let mut config = ResizerConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());

        let mut config = ResizerConfig::default();
        config.keep_alive.heartbeat_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[output]\nquality = 200\n");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Threads
    // =========================================================================

    #[test]
    fn effective_threads_default_is_sequential() {
        assert_eq!(effective_threads(&ProcessingConfig::default()), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 16),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[output]\nquality = 95\ncompression_level = 6\n").unwrap();
        let overlay: toml::Value = toml::from_str("[output]\nquality = 70\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["output"]["quality"].as_integer(), Some(70));
        assert_eq!(merged["output"]["compression_level"].as_integer(), Some(6));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let merged = merge_toml(toml::Value::Integer(1), toml::Value::Integer(2));
        assert_eq!(merged, toml::Value::Integer(2));
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), Some(value)).unwrap();
        assert_eq!(config, ResizerConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        let table = value.as_table().unwrap();
        for section in ["limits", "output", "processing", "keep_alive"] {
            assert!(table.contains_key(section), "missing {section}");
        }
    }
}
