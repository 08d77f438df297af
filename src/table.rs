//! Variant table
//!
//! The table is the single data structure threaded through every pipeline
//! stage. It holds one row per VCF record, in file order; row order is fixed
//! at load time and is the only join key back to the record stream.
//!
//! Columns grow monotonically: requested locus and INFO columns at load time,
//! then `VAR_TYPE`/`VAR`/`VAR_COUNT` from the prioritizer, `VAR_FRAC` from the
//! read-fraction calculator and `FREQ_ExAC`/`TYPE_vep` from the enricher.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FerroError;
use crate::vcf::{
    open_vcf, InfoValue, Locus, LocusField, VcfReader, INFO_FREQ_EXAC, INFO_TYPE_VEP, INFO_VAR,
    INFO_VAR_COUNT, INFO_VAR_FRAC, INFO_VAR_TYPE, MISSING,
};

/// Default locus columns projected by the loader
pub const DEFAULT_LOCUS_FIELDS: [&str; 4] = ["CHROM", "POS", "REF", "ALT"];

/// Default INFO columns projected by the loader: variant types, total depth,
/// reference observations and alternate observations
pub const DEFAULT_INFO_FIELDS: [&str; 4] = ["TYPE", "DP", "RO", "AO"];

/// The allele chosen for a locus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Variant type label of the chosen allele (e.g. "snp")
    pub variant_type: String,
    /// The chosen alternate allele
    pub allele: String,
    /// Supporting-read count of the chosen allele, when counts were supplied
    pub count: Option<i64>,
}

/// One row of the table: one VCF record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRow {
    pub locus: Locus,
    /// Requested INFO values, keyed by field name
    pub annotations: HashMap<String, InfoValue>,
    pub selection: Option<Selection>,
    pub read_fraction: Option<f64>,
    pub allele_freq: Option<f64>,
    pub consequence: Option<String>,
}

impl VariantRow {
    /// Create a row with no annotations or derived values
    pub fn new(locus: Locus) -> Self {
        Self {
            locus,
            annotations: HashMap::new(),
            selection: None,
            read_fraction: None,
            allele_freq: None,
            consequence: None,
        }
    }

    /// Add an INFO value
    pub fn with_annotation(mut self, key: &str, value: InfoValue) -> Self {
        self.annotations.insert(key.to_string(), value);
        self
    }

    /// Get an INFO value of this row
    pub fn annotation(&self, key: &str) -> Option<&InfoValue> {
        self.annotations.get(key)
    }
}

/// Ordered table of variant rows with a growing set of named columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantTable {
    columns: Vec<String>,
    rows: Vec<VariantRow>,
}

impl VariantTable {
    /// Create an empty table with the given locus and INFO columns.
    ///
    /// Fails with `UnknownField` if a locus column name is not part of the
    /// record schema.
    pub fn new<S: AsRef<str>, T: AsRef<str>>(
        locus_fields: &[S],
        info_fields: &[T],
    ) -> Result<Self, FerroError> {
        let mut table = Self::default();
        for name in locus_fields {
            let field: LocusField = name.as_ref().parse()?;
            table.add_column(field.name());
        }
        for name in info_fields {
            table.add_column(name.as_ref());
        }
        Ok(table)
    }

    /// Build a table directly from rows, e.g. for tests or in-memory input
    pub fn from_rows<S: AsRef<str>, T: AsRef<str>>(
        locus_fields: &[S],
        info_fields: &[T],
        rows: Vec<VariantRow>,
    ) -> Result<Self, FerroError> {
        let mut table = Self::new(locus_fields, info_fields)?;
        table.rows = rows;
        Ok(table)
    }

    /// Append a row
    pub fn push(&mut self, row: VariantRow) {
        self.rows.push(row);
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail with `MissingColumn` unless `name` exists
    pub fn require_column(&self, name: &str) -> Result<(), FerroError> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(FerroError::MissingColumn {
                column: name.to_string(),
            })
        }
    }

    /// Register a column; re-adding an existing column is a no-op
    pub(crate) fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    /// All rows in order
    pub fn rows(&self) -> &[VariantRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [VariantRow] {
        &mut self.rows
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Option<&VariantRow> {
        self.rows.get(index)
    }

    /// Get the value of a named column at `row`.
    ///
    /// Returns `None` for an unknown column or row, and `InfoValue::Missing`
    /// for a known column without a value in this row.
    pub fn cell(&self, row: usize, column: &str) -> Option<InfoValue> {
        if !self.has_column(column) {
            return None;
        }
        let r = self.rows.get(row)?;

        let selection = r.selection.as_ref();
        let value = match column {
            INFO_VAR_TYPE => InfoValue::from_option(selection.map(|s| s.variant_type.clone())),
            INFO_VAR => InfoValue::from_option(selection.map(|s| s.allele.clone())),
            INFO_VAR_COUNT => InfoValue::from_option(selection.and_then(|s| s.count)),
            INFO_VAR_FRAC => InfoValue::from_option(r.read_fraction),
            INFO_FREQ_EXAC => InfoValue::from_option(r.allele_freq),
            INFO_TYPE_VEP => InfoValue::from_option(r.consequence.clone()),
            other => match other.parse::<LocusField>() {
                Ok(field) => field.value(&r.locus),
                Err(_) => r
                    .annotations
                    .get(other)
                    .cloned()
                    .unwrap_or(InfoValue::Missing),
            },
        };
        Some(value)
    }

    /// Write the table as tab-separated text with a header row.
    ///
    /// Missing values are written as `.`.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), FerroError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);

        wtr.write_record(&self.columns)?;
        for i in 0..self.rows.len() {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|c| {
                    self.cell(i, c)
                        .map_or_else(|| MISSING.to_string(), |v| v.to_string())
                })
                .collect();
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table as TSV to a file
    pub fn write_tsv_path<P: AsRef<Path>>(&self, path: P) -> Result<(), FerroError> {
        let file = File::create(path.as_ref()).map_err(|e| FerroError::Io {
            msg: format!("Failed to create {}: {}", path.as_ref().display(), e),
        })?;
        self.write_tsv(BufWriter::new(file))
    }
}

/// Load a VCF file into a table with one row per record, in file order.
///
/// `locus_fields` must name locus columns (`CHROM`, `POS`, `ID`, `REF`, `ALT`,
/// `QUAL`, `FILTER`); `info_fields` name INFO keys that must be present on
/// every record.
pub fn load_table<P, S, T>(path: P, locus_fields: &[S], info_fields: &[T]) -> Result<VariantTable, FerroError>
where
    P: AsRef<Path>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let reader = open_vcf(path.as_ref())?;
    let table = load_table_from_reader(reader, locus_fields, info_fields)?;
    info!(
        path = %path.as_ref().display(),
        rows = table.len(),
        "loaded variant table"
    );
    Ok(table)
}

/// Load a table from an already opened reader
pub fn load_table_from_reader<R, S, T>(
    reader: VcfReader<R>,
    locus_fields: &[S],
    info_fields: &[T],
) -> Result<VariantTable, FerroError>
where
    R: BufRead,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut table = VariantTable::new(locus_fields, info_fields)?;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut annotations = HashMap::with_capacity(info_fields.len());
        for key in info_fields {
            let value = record.require_info(row, key.as_ref())?;
            annotations.insert(key.as_ref().to_string(), value.clone());
        }

        let mut variant = VariantRow::new(record.locus);
        variant.annotations = annotations;
        table.push(variant);
    }

    Ok(table)
}
