//! Pipeline configuration
//!
//! Loaded from TOML. Every section and field has a default, so an empty file
//! is a valid configuration reproducing the built-in behavior:
//!
//! ```toml
//! [input]
//! locus_fields = ["CHROM", "POS", "REF", "ALT"]
//! info_fields = ["TYPE", "DP", "RO", "AO"]
//!
//! [selection]
//! priority = ["complex", "ins", "del", "mnp", "snp"]
//! type_field = "TYPE"
//! count_field = "AO"
//! depth_field = "DP"
//!
//! [service]
//! endpoint = "http://exac.hms.harvard.edu/rest/bulk/variant/variant"
//! timeout_seconds = 60
//!
//! [output]
//! prefix = "Annotated_"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FerroError;
use crate::exac::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::fraction::DEFAULT_DEPTH_FIELD;
use crate::prioritize::{PriorityOrder, DEFAULT_COUNT_FIELD, DEFAULT_TYPE_FIELD};
use crate::table::{DEFAULT_INFO_FIELDS, DEFAULT_LOCUS_FIELDS};
use crate::vcf::{LocusField, DEFAULT_OUTPUT_PREFIX};

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub selection: SelectionConfig,
    pub service: ServiceConfig,
    pub output: OutputConfig,
}

/// Fields projected by the loader
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Locus columns (subset of CHROM, POS, ID, REF, ALT, QUAL, FILTER)
    pub locus_fields: Vec<String>,
    /// INFO keys required on every record
    pub info_fields: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            locus_fields: DEFAULT_LOCUS_FIELDS.iter().map(|s| s.to_string()).collect(),
            info_fields: DEFAULT_INFO_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Allele selection and read fraction settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Variant-type labels, highest priority first
    pub priority: PriorityOrder,
    /// INFO key holding per-allele type labels
    pub type_field: String,
    /// INFO key holding per-allele supporting-read counts
    pub count_field: Option<String>,
    /// INFO key holding total depth
    pub depth_field: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            priority: PriorityOrder::default(),
            type_field: DEFAULT_TYPE_FIELD.to_string(),
            count_field: Some(DEFAULT_COUNT_FIELD.to_string()),
            depth_field: DEFAULT_DEPTH_FIELD.to_string(),
        }
    }
}

/// Lookup service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// Request timeout in seconds (default: 60)
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Output naming
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix prepended to the input file name
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, FerroError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| FerroError::Config {
            msg: format!("Failed to read {}: {}", path.as_ref().display(), e),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self, FerroError> {
        let config: PipelineConfig = toml::from_str(content).map_err(|e| FerroError::Config {
            msg: format!("Invalid configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, FerroError> {
        toml::to_string_pretty(self).map_err(|e| FerroError::Config {
            msg: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Check the configuration is internally consistent.
    ///
    /// The type, count and depth fields must be among the loaded INFO fields,
    /// otherwise the later stages would fail on the first row.
    pub fn validate(&self) -> Result<(), FerroError> {
        for name in &self.input.locus_fields {
            name.parse::<LocusField>()?;
        }
        if !self.input.locus_fields.iter().any(|f| f == "ALT") {
            return Err(FerroError::Config {
                msg: "input.locus_fields must include ALT".to_string(),
            });
        }

        self.selection.priority.validate()?;

        let mut required = vec![
            ("selection.type_field", &self.selection.type_field),
            ("selection.depth_field", &self.selection.depth_field),
        ];
        if let Some(count) = &self.selection.count_field {
            required.push(("selection.count_field", count));
        }
        for (key, field) in required {
            if !self.input.info_fields.contains(field) {
                return Err(FerroError::Config {
                    msg: format!(
                        "{} '{}' is not listed in input.info_fields",
                        key, field
                    ),
                });
            }
        }

        if self.service.endpoint.trim().is_empty() {
            return Err(FerroError::Config {
                msg: "service.endpoint must not be empty".to_string(),
            });
        }
        if self.service.timeout_seconds == 0 {
            return Err(FerroError::Config {
                msg: "service.timeout_seconds must be greater than 0".to_string(),
            });
        }
        if self.output.prefix.is_empty() {
            return Err(FerroError::Config {
                msg: "output.prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
