//! Read-fraction calculation
//!
//! `VAR_FRAC = VAR_COUNT / depth`, per row. Zero depth is not special-cased:
//! any non-finite result is reported as [`FerroError::NonFiniteFraction`].

use tracing::info;

use crate::error::FerroError;
use crate::table::VariantTable;
use crate::vcf::{INFO_VAR_COUNT, INFO_VAR_FRAC};

/// Default annotation field holding total read depth
pub const DEFAULT_DEPTH_FIELD: &str = "DP";

/// Fraction of `depth` reads that support the variant
pub fn read_fraction(count: i64, depth: i64) -> f64 {
    count as f64 / depth as f64
}

/// Add the `VAR_FRAC` column to `table`, in place.
///
/// Requires the `VAR_COUNT` column produced by the prioritizer and the depth
/// column named by `depth_field`. On error the table is unchanged.
pub fn apply_read_fraction(table: &mut VariantTable, depth_field: &str) -> Result<(), FerroError> {
    table.require_column(INFO_VAR_COUNT)?;
    table.require_column(depth_field)?;

    let mut fractions = Vec::with_capacity(table.len());
    for (i, row) in table.rows().iter().enumerate() {
        let count = row
            .selection
            .as_ref()
            .and_then(|s| s.count)
            .ok_or_else(|| FerroError::MissingField {
                row: i,
                locus: row.locus.to_string(),
                field: INFO_VAR_COUNT.to_string(),
            })?;

        let depth_value = row
            .annotation(depth_field)
            .ok_or_else(|| FerroError::MissingField {
                row: i,
                locus: row.locus.to_string(),
                field: depth_field.to_string(),
            })?;
        let depth = depth_value
            .as_integer()
            .ok_or_else(|| FerroError::Validation {
                msg: format!(
                    "Row {}: {} value '{}' is not an integer",
                    i, depth_field, depth_value
                ),
            })?;

        let fraction = read_fraction(count, depth);
        if !fraction.is_finite() {
            return Err(FerroError::NonFiniteFraction {
                row: i,
                count,
                depth,
            });
        }
        fractions.push(fraction);
    }

    for (row, fraction) in table.rows_mut().iter_mut().zip(fractions) {
        row.read_fraction = Some(fraction);
    }
    table.add_column(INFO_VAR_FRAC);

    info!(rows = table.len(), depth_field, "computed read fractions");
    Ok(())
}

/// Return a copy of `table` with the `VAR_FRAC` column added
pub fn with_read_fraction(
    table: &VariantTable,
    depth_field: &str,
) -> Result<VariantTable, FerroError> {
    let mut out = table.clone();
    apply_read_fraction(&mut out, depth_field)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prioritize::VariantPrioritizer;
    use crate::table::{VariantRow, DEFAULT_INFO_FIELDS, DEFAULT_LOCUS_FIELDS};
    use crate::vcf::{InfoValue, Locus};

    fn prioritized(rows: Vec<VariantRow>) -> VariantTable {
        let table =
            VariantTable::from_rows(&DEFAULT_LOCUS_FIELDS, &DEFAULT_INFO_FIELDS, rows).unwrap();
        VariantPrioritizer::default().prioritized(&table).unwrap()
    }

    fn row(count: i64, depth: InfoValue) -> VariantRow {
        VariantRow::new(Locus::new("1", 100, "G", &["A"]))
            .with_annotation("TYPE", InfoValue::from("snp"))
            .with_annotation("DP", depth)
            .with_annotation("RO", InfoValue::Integer(0))
            .with_annotation("AO", InfoValue::Integer(count))
    }

    #[test]
    fn test_read_fraction() {
        assert_eq!(read_fraction(10, 20), 0.5);
        assert_eq!(read_fraction(7, 28), 0.25);
        assert!(read_fraction(1, 0).is_infinite());
        assert!(read_fraction(0, 0).is_nan());
    }

    #[test]
    fn test_apply_read_fraction() {
        let mut table = prioritized(vec![
            row(10, InfoValue::Integer(20)),
            row(3, InfoValue::Integer(12)),
        ]);
        apply_read_fraction(&mut table, "DP").unwrap();

        assert!(table.has_column("VAR_FRAC"));
        assert_eq!(table.row(0).unwrap().read_fraction, Some(0.5));
        assert_eq!(table.cell(1, "VAR_FRAC"), Some(InfoValue::Float(0.25)));
    }

    #[test]
    fn test_zero_depth_is_error() {
        let mut table = prioritized(vec![
            row(10, InfoValue::Integer(20)),
            row(4, InfoValue::Integer(0)),
        ]);
        let before = table.clone();
        let err = apply_read_fraction(&mut table, "DP").unwrap_err();
        assert_eq!(
            err,
            FerroError::NonFiniteFraction {
                row: 1,
                count: 4,
                depth: 0
            }
        );
        assert_eq!(table, before);
    }

    #[test]
    fn test_requires_selected_counts() {
        let table =
            VariantTable::from_rows(&DEFAULT_LOCUS_FIELDS, &DEFAULT_INFO_FIELDS, Vec::new())
                .unwrap();
        let err = with_read_fraction(&table, "DP").unwrap_err();
        assert!(matches!(err, FerroError::MissingColumn { ref column } if column == "VAR_COUNT"));
    }

    #[test]
    fn test_non_integer_depth() {
        let table = prioritized(vec![row(3, InfoValue::from("deep"))]);
        let err = with_read_fraction(&table, "DP").unwrap_err();
        assert!(matches!(err, FerroError::Validation { .. }));
    }

    #[test]
    fn test_with_read_fraction_leaves_input() {
        let table = prioritized(vec![row(10, InfoValue::Integer(20))]);
        let out = with_read_fraction(&table, "DP").unwrap();
        assert!(!table.has_column("VAR_FRAC"));
        assert_eq!(out.row(0).unwrap().read_fraction, Some(0.5));
    }
}
