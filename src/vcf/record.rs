//! Typed VCF record projection
//!
//! A parsed record is projected onto a fixed schema: a [`Locus`] holding the
//! identity columns and a map of requested INFO values. Requested column names
//! are mapped onto typed accessors through [`LocusField`], which rejects
//! unknown names up front.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FerroError;

/// Placeholder written for absent values
pub const MISSING: &str = ".";

/// INFO field (and table cell) value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InfoValue {
    /// Flag (presence indicates true)
    Flag,
    /// Value present in the schema but absent on this record
    Missing,
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Character value
    Character(char),
    /// Multiple integer values
    IntegerArray(Vec<i64>),
    /// Multiple float values
    FloatArray(Vec<f64>),
    /// Multiple string values
    StringArray(Vec<String>),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Flag => Ok(()),
            InfoValue::Missing => write!(f, "{}", MISSING),
            InfoValue::Integer(v) => write!(f, "{}", v),
            InfoValue::Float(v) => write!(f, "{}", v),
            InfoValue::String(v) => write!(f, "{}", v),
            InfoValue::Character(v) => write!(f, "{}", v),
            InfoValue::IntegerArray(v) => {
                let s: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", s.join(","))
            }
            InfoValue::FloatArray(v) => {
                let s: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", s.join(","))
            }
            InfoValue::StringArray(v) => write!(f, "{}", v.join(",")),
        }
    }
}

impl InfoValue {
    /// Wrap an optional value, mapping `None` to [`InfoValue::Missing`]
    pub fn from_option<T: Into<InfoValue>>(value: Option<T>) -> Self {
        value.map_or(InfoValue::Missing, Into::into)
    }

    /// Interpret the value as a comma-separated list of strings.
    ///
    /// Scalars are split on commas (`"snp,del"` becomes two entries), arrays
    /// are returned element-wise.
    pub fn as_string_list(&self) -> Vec<String> {
        match self {
            InfoValue::StringArray(v) => v.clone(),
            InfoValue::String(v) => v.split(',').map(|s| s.to_string()).collect(),
            InfoValue::Missing | InfoValue::Flag => Vec::new(),
            other => other
                .to_string()
                .split(',')
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Interpret the value as a list of integers.
    ///
    /// Returns `None` when any element is not an integer.
    pub fn as_integer_list(&self) -> Option<Vec<i64>> {
        match self {
            InfoValue::Integer(v) => Some(vec![*v]),
            InfoValue::IntegerArray(v) => Some(v.clone()),
            InfoValue::String(v) => v.split(',').map(|s| s.trim().parse().ok()).collect(),
            InfoValue::StringArray(v) => v.iter().map(|s| s.trim().parse().ok()).collect(),
            _ => None,
        }
    }

    /// Interpret the value as a single integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            InfoValue::Integer(v) => Some(*v),
            InfoValue::IntegerArray(v) if v.len() == 1 => Some(v[0]),
            InfoValue::String(v) => v.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for InfoValue {
    fn from(v: i64) -> Self {
        InfoValue::Integer(v)
    }
}

impl From<f64> for InfoValue {
    fn from(v: f64) -> Self {
        InfoValue::Float(v)
    }
}

impl From<String> for InfoValue {
    fn from(v: String) -> Self {
        InfoValue::String(v)
    }
}

impl From<&str> for InfoValue {
    fn from(v: &str) -> Self {
        InfoValue::String(v.to_string())
    }
}

/// Locus identity columns of a VCF record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locus {
    /// Chromosome name (e.g., "chr1", "1", "X")
    pub chrom: String,

    /// 1-based position of the first base in the reference allele
    pub pos: u64,

    /// Variant identifier (e.g., rsID), None if "."
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Reference allele
    pub reference: String,

    /// Alternate allele(s)
    pub alternates: Vec<String>,

    /// Phred-scaled quality score, None if "."
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,

    /// Filter status: None means PASS or unfiltered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Locus {
    /// Create a locus with the required identity fields
    pub fn new(chrom: &str, pos: u64, reference: &str, alternates: &[&str]) -> Self {
        Self {
            chrom: chrom.to_string(),
            pos,
            id: None,
            reference: reference.to_string(),
            alternates: alternates.iter().map(|a| a.to_string()).collect(),
            quality: None,
            filter: None,
        }
    }

    /// Check if this locus has more than one called alternate
    pub fn is_multiallelic(&self) -> bool {
        self.alternates.len() > 1
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom,
            self.pos,
            self.reference,
            self.alternates.join(",")
        )
    }
}

/// A single VCF record: locus columns plus INFO values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcfRecord {
    /// Locus identity columns
    pub locus: Locus,

    /// INFO field key-value pairs
    #[serde(default)]
    pub info: HashMap<String, InfoValue>,
}

impl VcfRecord {
    /// Create a record with no INFO fields
    pub fn new(locus: Locus) -> Self {
        Self {
            locus,
            info: HashMap::new(),
        }
    }

    /// Add an INFO field
    pub fn with_info(mut self, key: &str, value: InfoValue) -> Self {
        self.info.insert(key.to_string(), value);
        self
    }

    /// Get a required INFO value, failing with `MissingField` when absent.
    ///
    /// `row` is the record's position in the file, used for the diagnostic.
    pub fn require_info(&self, row: usize, key: &str) -> Result<&InfoValue, FerroError> {
        self.info.get(key).ok_or_else(|| FerroError::MissingField {
            row,
            locus: self.locus.to_string(),
            field: key.to_string(),
        })
    }
}

/// Named locus column, mapped onto a typed accessor of [`Locus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocusField {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
    Filter,
}

impl LocusField {
    /// All locus fields in VCF column order
    pub const ALL: [LocusField; 7] = [
        LocusField::Chrom,
        LocusField::Pos,
        LocusField::Id,
        LocusField::Ref,
        LocusField::Alt,
        LocusField::Qual,
        LocusField::Filter,
    ];

    /// VCF column name
    pub fn name(&self) -> &'static str {
        match self {
            LocusField::Chrom => "CHROM",
            LocusField::Pos => "POS",
            LocusField::Id => "ID",
            LocusField::Ref => "REF",
            LocusField::Alt => "ALT",
            LocusField::Qual => "QUAL",
            LocusField::Filter => "FILTER",
        }
    }

    /// Read this field from a locus
    pub fn value(&self, locus: &Locus) -> InfoValue {
        match self {
            LocusField::Chrom => InfoValue::String(locus.chrom.clone()),
            LocusField::Pos => InfoValue::Integer(locus.pos as i64),
            LocusField::Id => InfoValue::from_option(locus.id.clone()),
            LocusField::Ref => InfoValue::String(locus.reference.clone()),
            LocusField::Alt => InfoValue::StringArray(locus.alternates.clone()),
            LocusField::Qual => InfoValue::from_option(locus.quality.map(f64::from)),
            LocusField::Filter => InfoValue::from_option(locus.filter.clone()),
        }
    }
}

impl FromStr for LocusField {
    type Err = FerroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocusField::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| FerroError::UnknownField {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for LocusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_value_display() {
        assert_eq!(format!("{}", InfoValue::Integer(42)), "42");
        assert_eq!(format!("{}", InfoValue::Float(0.5)), "0.5");
        assert_eq!(format!("{}", InfoValue::String("snp".to_string())), "snp");
        assert_eq!(format!("{}", InfoValue::Missing), ".");
        assert_eq!(
            format!("{}", InfoValue::IntegerArray(vec![3, 7])),
            "3,7"
        );
    }

    #[test]
    fn test_as_string_list() {
        let joined = InfoValue::String("snp,del".to_string());
        assert_eq!(joined.as_string_list(), vec!["snp", "del"]);

        let array = InfoValue::StringArray(vec!["ins".to_string(), "mnp".to_string()]);
        assert_eq!(array.as_string_list(), vec!["ins", "mnp"]);

        assert!(InfoValue::Missing.as_string_list().is_empty());
    }

    #[test]
    fn test_as_integer_list() {
        assert_eq!(InfoValue::Integer(10).as_integer_list(), Some(vec![10]));
        assert_eq!(
            InfoValue::IntegerArray(vec![3, 7]).as_integer_list(),
            Some(vec![3, 7])
        );
        assert_eq!(
            InfoValue::String("3,7".to_string()).as_integer_list(),
            Some(vec![3, 7])
        );
        assert_eq!(InfoValue::String("3,x".to_string()).as_integer_list(), None);
        assert_eq!(InfoValue::Float(1.0).as_integer_list(), None);
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(InfoValue::Integer(20).as_integer(), Some(20));
        assert_eq!(InfoValue::IntegerArray(vec![20]).as_integer(), Some(20));
        assert_eq!(InfoValue::IntegerArray(vec![1, 2]).as_integer(), None);
        assert_eq!(InfoValue::Missing.as_integer(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(InfoValue::from_option(Some(0.25)), InfoValue::Float(0.25));
        assert_eq!(InfoValue::from_option::<f64>(None), InfoValue::Missing);
    }

    #[test]
    fn test_locus_field_from_str() {
        assert_eq!("CHROM".parse::<LocusField>().unwrap(), LocusField::Chrom);
        assert_eq!("ALT".parse::<LocusField>().unwrap(), LocusField::Alt);

        let err = "chrom".parse::<LocusField>().unwrap_err();
        assert!(matches!(err, FerroError::UnknownField { ref name } if name == "chrom"));
    }

    #[test]
    fn test_locus_field_value() {
        let mut locus = Locus::new("chr1", 12345, "A", &["G", "T"]);
        locus.quality = Some(30.0);

        assert_eq!(LocusField::Chrom.value(&locus), InfoValue::from("chr1"));
        assert_eq!(LocusField::Pos.value(&locus), InfoValue::Integer(12345));
        assert_eq!(LocusField::Id.value(&locus), InfoValue::Missing);
        assert_eq!(
            LocusField::Alt.value(&locus),
            InfoValue::StringArray(vec!["G".to_string(), "T".to_string()])
        );
        assert_eq!(LocusField::Qual.value(&locus), InfoValue::Float(30.0));
        assert!(locus.is_multiallelic());
    }

    #[test]
    fn test_require_info() {
        let record = VcfRecord::new(Locus::new("chr1", 100, "A", &["G"]))
            .with_info("DP", InfoValue::Integer(20));

        assert_eq!(record.require_info(0, "DP").unwrap(), &InfoValue::Integer(20));

        let err = record.require_info(4, "AO").unwrap_err();
        assert_eq!(
            err,
            FerroError::MissingField {
                row: 4,
                locus: "chr1:100 A>G".to_string(),
                field: "AO".to_string(),
            }
        );
    }

    #[test]
    fn test_locus_display() {
        let locus = Locus::new("chr1", 100, "AT", &["A"]);
        assert_eq!(locus.to_string(), "chr1:100 AT>A");
    }
}
