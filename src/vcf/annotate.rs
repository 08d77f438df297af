//! VCF INFO field annotation
//!
//! Declares the six selection/ExAC INFO fields on the source header and
//! re-writes every record of the source file with the values of the table row
//! at the same position.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use noodles_vcf as nvcf;
use nvcf::header::record::value::map::info::{Number, Type};
use nvcf::header::record::value::{map::Info, Map};
use nvcf::variant::io::Write as _;
use nvcf::variant::record_buf::info::field::Value;
use tracing::{debug, info};

use crate::error::FerroError;
use crate::prioritize::PriorityOrder;
use crate::table::VariantTable;

use super::parser::{count_records, open_vcf};
use super::record::{InfoValue, MISSING};

/// INFO field key for the selected alternate allele
pub const INFO_VAR: &str = "VAR";

/// INFO field key for the selected variant type
pub const INFO_VAR_TYPE: &str = "VAR_TYPE";

/// INFO field key for the supporting-read count of the selected allele
pub const INFO_VAR_COUNT: &str = "VAR_COUNT";

/// INFO field key for the fraction of reads supporting the selected allele
pub const INFO_VAR_FRAC: &str = "VAR_FRAC";

/// INFO field key for the ExAC population allele frequency
pub const INFO_FREQ_EXAC: &str = "FREQ_ExAC";

/// INFO field key for the VEP major consequence
pub const INFO_TYPE_VEP: &str = "TYPE_vep";

/// Default prefix for annotated output file names
pub const DEFAULT_OUTPUT_PREFIX: &str = "Annotated_";

/// Value type of a declared INFO field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoType {
    Integer,
    Float,
    String,
}

impl InfoType {
    fn as_noodles(&self) -> Type {
        match self {
            InfoType::Integer => Type::Integer,
            InfoType::Float => Type::Float,
            InfoType::String => Type::String,
        }
    }

    /// Header spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::Integer => "Integer",
            InfoType::Float => "Float",
            InfoType::String => "String",
        }
    }
}

/// A metadata field registered on the output header
#[derive(Debug, Clone, PartialEq)]
pub struct InfoDeclaration {
    pub id: &'static str,
    pub description: String,
    pub ty: InfoType,
    pub number: usize,
}

impl InfoDeclaration {
    fn new(id: &'static str, description: impl Into<String>, ty: InfoType) -> Self {
        Self {
            id,
            description: description.into(),
            ty,
            number: 1,
        }
    }

    /// Render as a `##INFO=<...>` header line
    pub fn header_line(&self) -> String {
        format!(
            "##INFO=<ID={},Number={},Type={},Description=\"{}\">",
            self.id,
            self.number,
            self.ty.as_str(),
            self.description
        )
    }
}

/// The fixed list of INFO fields written by the annotator, in output order.
///
/// The priority ordering in effect is spelled out in the VAR and VAR_TYPE
/// descriptions.
pub fn info_declarations(priority: &PriorityOrder) -> Vec<InfoDeclaration> {
    let ranking = priority.describe();
    vec![
        InfoDeclaration::new(
            INFO_VAR,
            format!("Selected variant based on prioritization of {}", ranking),
            InfoType::String,
        ),
        InfoDeclaration::new(
            INFO_VAR_TYPE,
            format!("Annotated variant type based on prioritization of {}", ranking),
            InfoType::String,
        ),
        InfoDeclaration::new(
            INFO_VAR_COUNT,
            "Count of times selected variant was observed",
            InfoType::Integer,
        ),
        InfoDeclaration::new(
            INFO_VAR_FRAC,
            "Fraction of total reads that the variant was observed",
            InfoType::Float,
        ),
        InfoDeclaration::new(
            INFO_FREQ_EXAC,
            "Allele frequency of prioritized alt according to ExAC",
            InfoType::Float,
        ),
        InfoDeclaration::new(
            INFO_TYPE_VEP,
            "vep annotation of major consequence of variant",
            InfoType::String,
        ),
    ]
}

/// Output path for an annotated copy of `source`: same directory, file name
/// prefixed with `prefix`.
pub fn annotated_output_path(source: &Path, prefix: &str) -> Result<PathBuf, FerroError> {
    let file_name = source.file_name().ok_or_else(|| FerroError::Io {
        msg: format!("{} has no file name", source.display()),
    })?;
    let name = format!("{}{}", prefix, file_name.to_string_lossy());
    Ok(match source.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    })
}

/// Writes an annotated copy of a VCF file from an enriched table
pub struct VcfAnnotationWriter {
    declarations: Vec<InfoDeclaration>,
}

impl VcfAnnotationWriter {
    /// Create a writer declaring the fields for `priority`
    pub fn new(priority: &PriorityOrder) -> Self {
        Self {
            declarations: info_declarations(priority),
        }
    }

    /// The INFO fields this writer declares
    pub fn declarations(&self) -> &[InfoDeclaration] {
        &self.declarations
    }

    /// Annotate `source` into `output`.
    ///
    /// The table must hold exactly one row per record of `source`, in file
    /// order, and carry all six annotation columns. Output is written to a
    /// temporary file next to `output` and renamed only after the last record
    /// was written and flushed; on error `output` is left untouched.
    ///
    /// Returns the number of records written.
    pub fn write(
        &self,
        source: &Path,
        output: &Path,
        table: &VariantTable,
    ) -> Result<usize, FerroError> {
        for decl in &self.declarations {
            table.require_column(decl.id)?;
        }

        let records = count_records(source)?;
        if records != table.len() {
            return Err(FerroError::Alignment {
                rows: table.len(),
                records,
            });
        }

        let mut reader = open_vcf(source)?;
        let mut header = reader.header().clone();
        for decl in &self.declarations {
            header.infos_mut().insert(
                decl.id.to_string(),
                Map::<Info>::new(
                    Number::Count(decl.number),
                    decl.ty.as_noodles(),
                    decl.description.clone(),
                ),
            );
        }

        let dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".ferro-exac-")
            .suffix(".vcf.tmp")
            .tempfile_in(&dir)?;

        let written = {
            let mut writer = nvcf::io::Writer::new(BufWriter::new(tmp.as_file_mut()));
            writer.write_header(&header)?;

            let mut record = nvcf::variant::RecordBuf::default();
            let mut row = 0usize;
            while reader.read_record_buf(&mut record)? {
                if row >= table.len() {
                    return Err(FerroError::Alignment {
                        rows: table.len(),
                        records: row + 1,
                    });
                }

                let fields = record.info_mut().as_mut();
                for decl in &self.declarations {
                    let cell = table.cell(row, decl.id).unwrap_or(InfoValue::Missing);
                    fields.insert(decl.id.to_string(), Some(to_noodles_value(&cell, row)?));
                }

                writer.write_variant_record(&header, &record)?;
                row += 1;
            }

            if row != table.len() {
                return Err(FerroError::Alignment {
                    rows: table.len(),
                    records: row,
                });
            }

            writer.get_mut().flush()?;
            row
        };

        // Temporary files are created owner-only; match the source instead
        let permissions = std::fs::metadata(source)?.permissions();
        tmp.as_file().set_permissions(permissions)?;
        tmp.as_file().sync_all()?;
        tmp.persist(output).map_err(|e| FerroError::Io {
            msg: format!("Failed to move annotated VCF to {}: {}", output.display(), e),
        })?;

        debug!(records = written, "flushed annotated records");
        info!(output = %output.display(), records = written, "wrote annotated VCF");
        Ok(written)
    }
}

/// Convert a table cell to a noodles INFO value.
///
/// Missing cells render as the `.` placeholder regardless of declared type.
fn to_noodles_value(cell: &InfoValue, row: usize) -> Result<Value, FerroError> {
    Ok(match cell {
        InfoValue::Missing | InfoValue::Flag => Value::String(MISSING.to_string()),
        InfoValue::Integer(v) => Value::Integer(i32::try_from(*v).map_err(|_| {
            FerroError::Validation {
                msg: format!("Row {}: integer {} does not fit a VCF Integer", row, v),
            }
        })?),
        InfoValue::Float(v) => Value::Float(*v as f32),
        InfoValue::String(v) => Value::String(v.clone()),
        InfoValue::Character(v) => Value::Character(*v),
        other => Value::String(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_declarations() {
        let decls = info_declarations(&PriorityOrder::default());
        let ids: Vec<_> = decls.iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            vec!["VAR", "VAR_TYPE", "VAR_COUNT", "VAR_FRAC", "FREQ_ExAC", "TYPE_vep"]
        );
        assert!(decls.iter().all(|d| d.number == 1));
        assert_eq!(decls[2].ty, InfoType::Integer);
        assert_eq!(decls[3].ty, InfoType::Float);
        assert_eq!(decls[4].ty, InfoType::Float);
        assert_eq!(decls[5].ty, InfoType::String);
    }

    #[test]
    fn test_declaration_mentions_priority() {
        let decls = info_declarations(&PriorityOrder::default());
        assert!(decls[0]
            .description
            .contains("(1) 'complex', (2) 'ins', (3) 'del', (4) 'mnp', (5) 'snp'"));
    }

    #[test]
    fn test_header_line() {
        let decls = info_declarations(&PriorityOrder::default());
        assert_eq!(
            decls[2].header_line(),
            "##INFO=<ID=VAR_COUNT,Number=1,Type=Integer,Description=\"Count of times selected variant was observed\">"
        );
    }

    #[test]
    fn test_annotated_output_path() {
        let path = annotated_output_path(Path::new("data/calls.vcf"), "Annotated_").unwrap();
        assert_eq!(path, PathBuf::from("data/Annotated_calls.vcf"));

        let bare = annotated_output_path(Path::new("calls.vcf"), "Annotated_").unwrap();
        assert_eq!(bare, PathBuf::from("Annotated_calls.vcf"));
    }

    #[test]
    fn test_to_noodles_value() {
        assert_eq!(
            to_noodles_value(&InfoValue::Missing, 0).unwrap(),
            Value::String(".".to_string())
        );
        assert_eq!(
            to_noodles_value(&InfoValue::Integer(7), 0).unwrap(),
            Value::Integer(7)
        );
        assert_eq!(
            to_noodles_value(&InfoValue::Float(0.5), 0).unwrap(),
            Value::Float(0.5)
        );

        let err = to_noodles_value(&InfoValue::Integer(i64::MAX), 3).unwrap_err();
        assert!(matches!(err, FerroError::Validation { .. }));
    }
}
