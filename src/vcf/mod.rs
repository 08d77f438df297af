//! VCF (Variant Call Format) support
//!
//! This module provides reading VCF files into typed records and writing
//! annotated copies back out, both through noodles-vcf.

mod annotate;
mod parser;
mod record;

pub use annotate::{
    annotated_output_path, info_declarations, InfoDeclaration, InfoType, VcfAnnotationWriter,
    DEFAULT_OUTPUT_PREFIX, INFO_FREQ_EXAC, INFO_TYPE_VEP, INFO_VAR, INFO_VAR_COUNT,
    INFO_VAR_FRAC, INFO_VAR_TYPE,
};
pub use parser::{count_records, open_vcf, parse_vcf_string, VcfReader, VcfRecordIterator};
pub use record::{InfoValue, Locus, LocusField, VcfRecord, MISSING};
