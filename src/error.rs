//! Error types for ferro-exac
//!
//! Every fatal condition in the annotation pipeline maps to one variant of
//! [`FerroError`]. Variants carry the row index, key, field name or type list
//! that caused the failure so a failed run can be diagnosed from the message
//! alone.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
///
/// These codes can be used for programmatic error handling
/// and for documentation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Input integrity errors (E1xxx)
    /// Requested field name is not part of the locus schema
    UnknownField = 1001,
    /// Requested annotation key absent on a record
    MissingField = 1002,
    /// Parallel type/allele/count lists differ in length
    LengthMismatch = 1003,
    /// Malformed VCF content
    InvalidVcf = 1004,

    // Selection errors (E2xxx)
    /// No priority label matches the row's variant types
    UnrecognizedVariantType = 2001,
    /// A stage ran before the column it depends on existed
    MissingColumn = 2002,
    /// Read fraction is not a finite number
    NonFiniteFraction = 2003,

    // Service errors (E3xxx)
    /// HTTP request failed or returned a non-success status
    ServiceRequest = 3001,
    /// Response payload could not be interpreted
    ServiceResponse = 3002,

    // Alignment errors (E4xxx)
    /// Merged values do not match the table shape
    Validation = 4001,
    /// Table rows and VCF records are not one-to-one
    Alignment = 4002,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
    /// Invalid configuration
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnknownField => "unknown locus field",
            ErrorCode::MissingField => "annotation field missing on record",
            ErrorCode::LengthMismatch => "parallel allele lists differ in length",
            ErrorCode::InvalidVcf => "malformed VCF content",
            ErrorCode::UnrecognizedVariantType => "variant type not in priority ordering",
            ErrorCode::MissingColumn => "required table column missing",
            ErrorCode::NonFiniteFraction => "read fraction is not finite",
            ErrorCode::ServiceRequest => "lookup service request failed",
            ErrorCode::ServiceResponse => "malformed lookup service response",
            ErrorCode::Validation => "merged values do not match table shape",
            ErrorCode::Alignment => "table rows and VCF records are misaligned",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
            ErrorCode::ConfigError => "invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for ferro-exac operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FerroError {
    /// Requested locus field name is not part of the record schema
    #[error("Unknown locus field '{name}' (expected one of CHROM, POS, ID, REF, ALT, QUAL, FILTER)")]
    UnknownField { name: String },

    /// Requested annotation key is absent on a record
    #[error("Record {row} ({locus}) has no INFO field '{field}'")]
    MissingField {
        row: usize,
        locus: String,
        field: String,
    },

    /// Parallel type/allele/count lists differ in length
    #[error("Row {row}: {what} has {found} entries but {expected} alternate alleles")]
    LengthMismatch {
        row: usize,
        what: String,
        expected: usize,
        found: usize,
    },

    /// No label in the priority ordering matches the row's variant types
    #[error("Row {row}: {types} were not found in priority")]
    UnrecognizedVariantType { row: usize, types: String },

    /// A stage ran before a column it depends on was produced
    #[error("Required column '{column}' is missing from the table")]
    MissingColumn { column: String },

    /// Read fraction is NaN or infinite (e.g. zero depth)
    #[error("Row {row}: read fraction {count}/{depth} is not finite")]
    NonFiniteFraction { row: usize, count: i64, depth: i64 },

    /// HTTP request to the lookup service failed
    #[error("Lookup service request failed: {msg}")]
    ServiceRequest { msg: String },

    /// Lookup service response could not be interpreted
    #[error("Variant list was not compatible with the lookup service: {msg}")]
    ServiceResponse { msg: String },

    /// Merged values do not match the shape of the table
    #[error("Validation error: {msg}")]
    Validation { msg: String },

    /// Table rows and VCF records are not one-to-one
    #[error("Alignment error: table has {rows} rows but VCF has {records} records")]
    Alignment { rows: usize, records: usize },

    /// Malformed VCF content
    #[error("VCF error: {msg}")]
    Vcf { msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error
    #[error("JSON error: {msg}")]
    Json { msg: String },

    /// Invalid configuration
    #[error("Configuration error: {msg}")]
    Config { msg: String },
}

impl FerroError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            FerroError::UnknownField { .. } => ErrorCode::UnknownField,
            FerroError::MissingField { .. } => ErrorCode::MissingField,
            FerroError::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            FerroError::UnrecognizedVariantType { .. } => ErrorCode::UnrecognizedVariantType,
            FerroError::MissingColumn { .. } => ErrorCode::MissingColumn,
            FerroError::NonFiniteFraction { .. } => ErrorCode::NonFiniteFraction,
            FerroError::ServiceRequest { .. } => ErrorCode::ServiceRequest,
            FerroError::ServiceResponse { .. } => ErrorCode::ServiceResponse,
            FerroError::Validation { .. } => ErrorCode::Validation,
            FerroError::Alignment { .. } => ErrorCode::Alignment,
            FerroError::Vcf { .. } => ErrorCode::InvalidVcf,
            FerroError::Io { .. } => ErrorCode::IoError,
            FerroError::Json { .. } => ErrorCode::JsonError,
            FerroError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Format the error prefixed with its code, e.g. `[E2001] Row 3: ...`
    pub fn detailed_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }

    /// Whether the error indicates the input data violates structural assumptions
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            FerroError::LengthMismatch { .. } | FerroError::Alignment { .. }
        )
    }
}

impl From<std::io::Error> for FerroError {
    fn from(err: std::io::Error) -> Self {
        FerroError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FerroError {
    fn from(err: serde_json::Error) -> Self {
        FerroError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<csv::Error> for FerroError {
    fn from(err: csv::Error) -> Self {
        FerroError::Io {
            msg: format!("Failed to write table: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::UnknownField.as_str(), "E1001");
        assert_eq!(ErrorCode::UnrecognizedVariantType.as_str(), "E2001");
        assert_eq!(ErrorCode::ServiceResponse.as_str(), "E3002");
        assert_eq!(ErrorCode::Alignment.as_str(), "E4002");
        assert_eq!(ErrorCode::IoError.as_str(), "E9001");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::LengthMismatch), "E1003");
        assert_eq!(
            ErrorCode::NonFiniteFraction.description(),
            "read fraction is not finite"
        );
    }

    #[test]
    fn test_unrecognized_variant_type_message() {
        let err = FerroError::UnrecognizedVariantType {
            row: 2,
            types: "ins/mnp".to_string(),
        };
        assert_eq!(err.to_string(), "Row 2: ins/mnp were not found in priority");
        assert_eq!(err.code(), ErrorCode::UnrecognizedVariantType);
    }

    #[test]
    fn test_detailed_message() {
        let err = FerroError::Alignment {
            rows: 2,
            records: 3,
        };
        let msg = err.detailed_message();
        assert!(msg.starts_with("[E4002]"));
        assert!(msg.contains("2 rows"));
        assert!(msg.contains("3 records"));
    }

    #[test]
    fn test_integrity_errors() {
        let mismatch = FerroError::LengthMismatch {
            row: 0,
            what: "TYPE".to_string(),
            expected: 2,
            found: 1,
        };
        assert!(mismatch.is_integrity_error());

        let service = FerroError::ServiceResponse {
            msg: "not json".to_string(),
        };
        assert!(!service.is_integrity_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FerroError = io_err.into();
        assert!(matches!(err, FerroError::Io { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FerroError = json_err.into();
        assert_eq!(err.code(), ErrorCode::JsonError);
    }
}
