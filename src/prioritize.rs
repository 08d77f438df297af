//! Variant prioritization
//!
//! Picks one alternate allele per locus. A locus with a single called allele
//! always selects it; a multi-allelic locus selects the allele whose type
//! label ranks highest in the [`PriorityOrder`]. Selection depends only on the
//! row's own type list and the ordering.
//!
//! # Example
//!
//! ```
//! use ferro_exac::prioritize::{PriorityOrder, VariantPrioritizer};
//! use ferro_exac::table::VariantRow;
//! use ferro_exac::vcf::{InfoValue, Locus};
//!
//! let row = VariantRow::new(Locus::new("1", 100, "AT", &["A", "-"]))
//!     .with_annotation("TYPE", InfoValue::from("snp,del"))
//!     .with_annotation("AO", InfoValue::IntegerArray(vec![3, 7]));
//!
//! let prioritizer = VariantPrioritizer::new(PriorityOrder::new(["del", "snp"]).unwrap());
//! let selection = prioritizer.select(0, &row).unwrap();
//! assert_eq!(selection.variant_type, "del");
//! assert_eq!(selection.allele, "-");
//! assert_eq!(selection.count, Some(7));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FerroError;
use crate::table::{Selection, VariantRow, VariantTable};
use crate::vcf::{INFO_VAR, INFO_VAR_COUNT, INFO_VAR_TYPE};

/// Default annotation field holding the per-allele type labels
pub const DEFAULT_TYPE_FIELD: &str = "TYPE";

/// Default annotation field holding the per-allele supporting-read counts
pub const DEFAULT_COUNT_FIELD: &str = "AO";

/// Default ranking, highest first
pub const DEFAULT_PRIORITY: [&str; 5] = ["complex", "ins", "del", "mnp", "snp"];

/// Descending list of variant-type labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityOrder {
    labels: Vec<String>,
}

impl Default for PriorityOrder {
    fn default() -> Self {
        Self {
            labels: DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PriorityOrder {
    /// Create an ordering from labels, highest priority first.
    ///
    /// Fails on an empty list or a repeated label.
    pub fn new<I, S>(labels: I) -> Result<Self, FerroError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order = Self {
            labels: labels.into_iter().map(Into::into).collect(),
        };
        order.validate()?;
        Ok(order)
    }

    /// Check the ordering is non-empty and free of duplicates
    pub fn validate(&self) -> Result<(), FerroError> {
        if self.labels.is_empty() {
            return Err(FerroError::Config {
                msg: "Priority ordering must contain at least one label".to_string(),
            });
        }
        for (i, label) in self.labels.iter().enumerate() {
            if label.is_empty() {
                return Err(FerroError::Config {
                    msg: "Priority ordering contains an empty label".to_string(),
                });
            }
            if self.labels[..i].contains(label) {
                return Err(FerroError::Config {
                    msg: format!("Priority label '{}' appears more than once", label),
                });
            }
        }
        Ok(())
    }

    /// Labels, highest priority first
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rank of a label (0 is highest), or `None` if unranked
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Human-readable ranking, e.g. `(1) 'complex', (2) 'ins'`
    pub fn describe(&self) -> String {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| format!("({}) '{}'", i + 1, l))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Index into `types` of the highest-ranked label present.
    ///
    /// A label occurring more than once in `types` resolves to its first
    /// occurrence.
    pub fn pick(&self, types: &[String]) -> Option<usize> {
        self.labels
            .iter()
            .find_map(|label| types.iter().position(|t| t == label))
    }
}

impl FromStr for PriorityOrder {
    type Err = FerroError;

    /// Parse a comma-separated list such as `del,snp`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(',').map(str::trim).filter(|l| !l.is_empty()))
    }
}

impl fmt::Display for PriorityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.labels.join(","))
    }
}

/// Selects one allele per row according to a priority ordering
#[derive(Debug, Clone)]
pub struct VariantPrioritizer {
    priority: PriorityOrder,
    type_field: String,
    count_field: Option<String>,
}

impl Default for VariantPrioritizer {
    fn default() -> Self {
        Self::new(PriorityOrder::default())
    }
}

impl VariantPrioritizer {
    /// Create a prioritizer reading `TYPE` and `AO`
    pub fn new(priority: PriorityOrder) -> Self {
        Self {
            priority,
            type_field: DEFAULT_TYPE_FIELD.to_string(),
            count_field: Some(DEFAULT_COUNT_FIELD.to_string()),
        }
    }

    /// Read type labels from `field`
    pub fn with_type_field(mut self, field: &str) -> Self {
        self.type_field = field.to_string();
        self
    }

    /// Read supporting-read counts from `field`, or skip counts with `None`
    pub fn with_count_field(mut self, field: Option<&str>) -> Self {
        self.count_field = field.map(str::to_string);
        self
    }

    pub fn priority(&self) -> &PriorityOrder {
        &self.priority
    }

    /// Select the allele for one row.
    ///
    /// `index` is the row position, used only for diagnostics.
    pub fn select(&self, index: usize, row: &VariantRow) -> Result<Selection, FerroError> {
        let alternates = &row.locus.alternates;
        let types = self.required(index, row, &self.type_field)?.as_string_list();
        if types.len() != alternates.len() {
            return Err(FerroError::LengthMismatch {
                row: index,
                what: self.type_field.clone(),
                expected: alternates.len(),
                found: types.len(),
            });
        }

        let counts = match &self.count_field {
            Some(field) => {
                let value = self.required(index, row, field)?;
                let counts = value.as_integer_list().ok_or_else(|| FerroError::Validation {
                    msg: format!(
                        "Row {}: {} value '{}' is not a list of integers",
                        index, field, value
                    ),
                })?;
                if counts.len() != alternates.len() {
                    return Err(FerroError::LengthMismatch {
                        row: index,
                        what: field.clone(),
                        expected: alternates.len(),
                        found: counts.len(),
                    });
                }
                Some(counts)
            }
            None => None,
        };

        let chosen = if types.len() == 1 {
            0
        } else {
            self.priority
                .pick(&types)
                .ok_or_else(|| FerroError::UnrecognizedVariantType {
                    row: index,
                    types: types.join("/"),
                })?
        };

        Ok(Selection {
            variant_type: types[chosen].clone(),
            allele: alternates[chosen].clone(),
            count: counts.map(|c| c[chosen]),
        })
    }

    fn required<'a>(
        &self,
        index: usize,
        row: &'a VariantRow,
        field: &str,
    ) -> Result<&'a crate::vcf::InfoValue, FerroError> {
        row.annotation(field).ok_or_else(|| FerroError::MissingField {
            row: index,
            locus: row.locus.to_string(),
            field: field.to_string(),
        })
    }

    /// Select an allele for every row of `table`, in place.
    ///
    /// All rows are evaluated before any is modified; on error the table is
    /// unchanged.
    pub fn apply(&self, table: &mut VariantTable) -> Result<(), FerroError> {
        table.require_column(&self.type_field)?;
        if let Some(field) = &self.count_field {
            table.require_column(field)?;
        }

        let selections = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| self.select(i, row))
            .collect::<Result<Vec<_>, _>>()?;

        let multiallelic = table
            .rows()
            .iter()
            .filter(|r| r.locus.is_multiallelic())
            .count();

        for (row, selection) in table.rows_mut().iter_mut().zip(selections) {
            row.selection = Some(selection);
        }
        table.add_column(INFO_VAR_TYPE);
        table.add_column(INFO_VAR);
        if self.count_field.is_some() {
            table.add_column(INFO_VAR_COUNT);
        }

        info!(
            rows = table.len(),
            multiallelic,
            priority = %self.priority,
            "prioritized variants"
        );
        Ok(())
    }

    /// Return a prioritized copy of `table`, leaving the input untouched
    pub fn prioritized(&self, table: &VariantTable) -> Result<VariantTable, FerroError> {
        let mut out = table.clone();
        self.apply(&mut out)?;
        Ok(out)
    }
}
