// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-exac: prioritized variant selection and ExAC annotation of VCF files
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! A VCF file is loaded into a [`VariantTable`] (one row per record), one
//! alternate allele is selected per locus by variant-type priority, the
//! fraction of reads supporting it is computed, ExAC allele frequencies and
//! VEP consequences are fetched in one batch request, and the results are
//! written back as six INFO fields of an annotated copy of the file.
//!
//! # Example
//!
//! ```
//! use ferro_exac::exac::{ExacVariant, MockExacService};
//! use ferro_exac::{apply_enrichment, apply_read_fraction, VariantPrioritizer};
//! use ferro_exac::table::{VariantRow, VariantTable, DEFAULT_INFO_FIELDS, DEFAULT_LOCUS_FIELDS};
//! use ferro_exac::vcf::{InfoValue, Locus};
//!
//! let row = VariantRow::new(Locus::new("1", 100, "G", &["A"]))
//!     .with_annotation("TYPE", InfoValue::from("snp"))
//!     .with_annotation("DP", InfoValue::Integer(20))
//!     .with_annotation("RO", InfoValue::Integer(10))
//!     .with_annotation("AO", InfoValue::Integer(10));
//! let mut table =
//!     VariantTable::from_rows(&DEFAULT_LOCUS_FIELDS, &DEFAULT_INFO_FIELDS, vec![row]).unwrap();
//!
//! VariantPrioritizer::default().apply(&mut table).unwrap();
//! apply_read_fraction(&mut table, "DP").unwrap();
//!
//! let service = MockExacService::new().with_record(
//!     "1-100-G-A",
//!     ExacVariant { allele_freq: Some(0.001), vep_annotations: None },
//! );
//! apply_enrichment(&mut table, &service).unwrap();
//!
//! assert_eq!(table.cell(0, "VAR_FRAC"), Some(InfoValue::Float(0.5)));
//! assert_eq!(table.cell(0, "TYPE_vep"), Some(InfoValue::Missing));
//! ```

pub mod config;
pub mod error;
pub mod exac;
pub mod fraction;
pub mod pipeline;
pub mod prioritize;
pub mod table;
pub mod vcf;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{ErrorCode, FerroError};
pub use exac::{apply_enrichment, with_enrichment, ExacClient, ExacService};
pub use fraction::{apply_read_fraction, read_fraction, with_read_fraction};
pub use pipeline::{AnnotationPipeline, PipelineSummary};
pub use prioritize::{PriorityOrder, VariantPrioritizer};
pub use table::{load_table, Selection, VariantRow, VariantTable};

/// Result type alias for ferro-exac operations
pub type Result<T> = std::result::Result<T, FerroError>;
