//! Frequency and consequence enrichment.
//!
//! Builds one lookup key per prioritized row, submits all keys in a single
//! batch and merges the answers back by row position.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::FerroError;
use crate::table::VariantTable;
use crate::vcf::{INFO_FREQ_EXAC, INFO_TYPE_VEP, INFO_VAR};

use super::client::ExacService;
use super::types::{ExacResponse, VariantKey};

/// Per-row values produced by a lookup, in table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub allele_freqs: Vec<Option<f64>>,
    pub consequences: Vec<Option<String>>,
}

impl Enrichment {
    /// Number of rows covered
    pub fn len(&self) -> usize {
        self.allele_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allele_freqs.is_empty()
    }

    /// Rows that received an allele frequency
    pub fn frequency_count(&self) -> usize {
        self.allele_freqs.iter().filter(|f| f.is_some()).count()
    }

    /// Rows that received a major consequence
    pub fn consequence_count(&self) -> usize {
        self.consequences.iter().filter(|c| c.is_some()).count()
    }
}

/// Lookup keys for every row of a prioritized table, in row order
pub fn build_keys(table: &VariantTable) -> Result<Vec<VariantKey>, FerroError> {
    table.require_column(INFO_VAR)?;

    table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let selection = row.selection.as_ref().ok_or_else(|| FerroError::MissingField {
                row: i,
                locus: row.locus.to_string(),
                field: INFO_VAR.to_string(),
            })?;
            Ok(VariantKey::for_allele(&row.locus, &selection.allele))
        })
        .collect()
}

/// Merge a lookup response onto `keys`.
///
/// A key without a record, or a record without a value, yields `None` for
/// that row. A response key that was never requested means the service
/// answered a different question and is a `Validation` error.
pub fn merge_enrichment(
    keys: &[VariantKey],
    response: &ExacResponse,
) -> Result<Enrichment, FerroError> {
    let requested: HashSet<String> = keys.iter().map(|k| k.to_string()).collect();
    let mut unexpected: Vec<&str> = response
        .keys()
        .filter(|k| !requested.contains(k.as_str()))
        .map(String::as_str)
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort_unstable();
        return Err(FerroError::Validation {
            msg: format!(
                "Lookup response contains {} key(s) that were not requested: {}",
                unexpected.len(),
                unexpected.join(", ")
            ),
        });
    }

    let mut enrichment = Enrichment {
        allele_freqs: Vec::with_capacity(keys.len()),
        consequences: Vec::with_capacity(keys.len()),
    };
    for key in keys {
        let record = response.get(&key.to_string());
        enrichment
            .allele_freqs
            .push(record.and_then(|r| r.allele_freq));
        enrichment
            .consequences
            .push(record.and_then(|r| r.major_consequence()).map(str::to_string));
    }

    Ok(enrichment)
}

/// Look up every row of `table` and add the `FREQ_ExAC` and `TYPE_vep`
/// columns, in place.
///
/// Nothing is written to the table unless the lookup and merge both succeed.
pub fn apply_enrichment<S: ExacService + ?Sized>(
    table: &mut VariantTable,
    service: &S,
) -> Result<Enrichment, FerroError> {
    let keys = build_keys(table)?;
    debug!(keys = keys.len(), "submitting lookup batch");

    let response = service.lookup(&keys)?;
    let enrichment = merge_enrichment(&keys, &response)?;

    for (i, key) in keys.iter().enumerate() {
        if enrichment.allele_freqs[i].is_none() && enrichment.consequences[i].is_none() {
            warn!(row = i, key = %key, "no ExAC data for variant");
        }
    }

    for ((row, freq), consequence) in table
        .rows_mut()
        .iter_mut()
        .zip(&enrichment.allele_freqs)
        .zip(&enrichment.consequences)
    {
        row.allele_freq = *freq;
        row.consequence = consequence.clone();
    }
    table.add_column(INFO_FREQ_EXAC);
    table.add_column(INFO_TYPE_VEP);

    info!(
        rows = table.len(),
        with_frequency = enrichment.frequency_count(),
        with_consequence = enrichment.consequence_count(),
        "merged ExAC annotations"
    );
    Ok(enrichment)
}

/// Return an enriched copy of `table`, leaving the input untouched
pub fn with_enrichment<S: ExacService + ?Sized>(
    table: &VariantTable,
    service: &S,
) -> Result<VariantTable, FerroError> {
    let mut out = table.clone();
    apply_enrichment(&mut out, service)?;
    Ok(out)
}
