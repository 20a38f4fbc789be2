//! Service configuration
//!
//! ```rust,no_run
//! use geoprefix::config::GeoConfig;
//! use geoprefix::Resolution;
//!
//! let config = GeoConfig::new("/var/lib/geoip", Resolution::City).with_locale("de");
//! let files = config.validate()?;
//! println!("{}", files.locations.display());
//! # Ok::<(), geoprefix::GeoError>(())
//! ```

use crate::dual_stack::AddressFamily;
use crate::error::{GeoError, Result};
use crate::file_reader;
use crate::schema::Resolution;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of malformed rows tolerated per blocks file
pub const DEFAULT_MAX_ROW_ERRORS: usize = 8;

fn default_locale() -> String {
    "en".to_string()
}

fn default_max_row_errors() -> usize {
    DEFAULT_MAX_ROW_ERRORS
}

/// Where the data lives and how to read it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    /// Directory holding the blocks and locations files
    pub data_dir: PathBuf,
    /// Country or City data
    #[serde(default)]
    pub resolution: Resolution,
    /// Locale suffix of the locations file
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Malformed rows tolerated per blocks file before the file is abandoned
    #[serde(default = "default_max_row_errors")]
    pub max_row_errors: usize,
}

/// Resolved paths of the three input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    /// IPv6 blocks file
    pub ipv6_blocks: PathBuf,
    /// IPv4 blocks file
    pub ipv4_blocks: PathBuf,
    /// Locations file
    pub locations: PathBuf,
}

impl GeoConfig {
    /// Configuration with default locale and error threshold
    pub fn new<P: Into<PathBuf>>(data_dir: P, resolution: Resolution) -> Self {
        Self {
            data_dir: data_dir.into(),
            resolution,
            locale: default_locale(),
            max_row_errors: DEFAULT_MAX_ROW_ERRORS,
        }
    }

    /// Use the locations file for another locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Change the per-file row error threshold
    pub fn with_max_row_errors(mut self, max: usize) -> Self {
        self.max_row_errors = max;
        self
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GeoError::Config(format!("Invalid configuration: {}", e)))
    }

    /// Read a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GeoError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Check the data directory and locate the input files
    ///
    /// No file is opened; only existence is checked.
    pub fn validate(&self) -> Result<InputFiles> {
        if !self.data_dir.is_dir() {
            return Err(GeoError::Config(format!(
                "Data directory {} does not exist",
                self.data_dir.display()
            )));
        }
        if self.locale.is_empty() {
            return Err(GeoError::Config("Locale must not be empty".to_string()));
        }

        let find = |name: String| {
            file_reader::find_input(&self.data_dir, &name).ok_or_else(|| {
                GeoError::Config(format!(
                    "Required file {} not found in {}",
                    name,
                    self.data_dir.display()
                ))
            })
        };

        Ok(InputFiles {
            ipv6_blocks: find(self.resolution.blocks_file(AddressFamily::V6))?,
            ipv4_blocks: find(self.resolution.blocks_file(AddressFamily::V4))?,
            locations: find(self.resolution.locations_file(&self.locale))?,
        })
    }
}
