//! ExAC population frequency and consequence lookup.
//!
//! Each prioritized row is turned into a `CHROM-POS-REF-ALT` key; all keys
//! are sent to the ExAC bulk variant endpoint in a single request, and the
//! allele frequency and first VEP major consequence of each answer are
//! merged back onto the table by row position.
//!
//! # Examples
//!
//! ```
//! use ferro_exac::exac::{merge_enrichment, ExacResponse, ExacVariant, VariantKey};
//!
//! let keys = vec![VariantKey::new("1", 100, "G", "A")];
//! let mut response = ExacResponse::new();
//! response.insert(
//!     "1-100-G-A".to_string(),
//!     ExacVariant { allele_freq: Some(0.5), vep_annotations: None },
//! );
//!
//! let merged = merge_enrichment(&keys, &response).unwrap();
//! assert_eq!(merged.allele_freqs, vec![Some(0.5)]);
//! assert_eq!(merged.consequences, vec![None]);
//! ```

mod client;
mod enrich;
mod types;

pub use client::{
    parse_response, ExacClient, ExacService, MockExacService, DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT_SECS,
};
pub use enrich::{apply_enrichment, build_keys, merge_enrichment, with_enrichment, Enrichment};
pub use types::{ExacResponse, ExacVariant, VariantKey, VepAnnotation};
