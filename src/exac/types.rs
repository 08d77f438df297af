//! ExAC lookup data types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::vcf::Locus;

/// Lookup key of a selected allele, rendered `CHROM-POS-REF-ALT`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub chrom: String,
    pub pos: u64,
    pub reference: String,
    pub alternate: String,
}

impl VariantKey {
    pub fn new(chrom: &str, pos: u64, reference: &str, alternate: &str) -> Self {
        Self {
            chrom: chrom.to_string(),
            pos,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
        }
    }

    /// Key for `allele` at `locus`
    pub fn for_allele(locus: &Locus, allele: &str) -> Self {
        Self::new(&locus.chrom, locus.pos, &locus.reference, allele)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.chrom, self.pos, self.reference, self.alternate
        )
    }
}

impl Serialize for VariantKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One VEP consequence annotation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VepAnnotation {
    /// Most severe consequence term (e.g. "missense_variant")
    #[serde(default)]
    pub major_consequence: Option<String>,
}

/// ExAC record for one variant.
///
/// Both fields are optional; absence means the service has no data, not that
/// the request failed. Fields not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExacVariant {
    /// Population allele frequency
    #[serde(default)]
    pub allele_freq: Option<f64>,

    /// VEP annotations, most relevant first
    #[serde(default)]
    pub vep_annotations: Option<Vec<VepAnnotation>>,
}

impl ExacVariant {
    /// Major consequence of the first VEP annotation.
    ///
    /// An empty annotation list yields `None`.
    pub fn major_consequence(&self) -> Option<&str> {
        self.vep_annotations
            .as_ref()
            .and_then(|annotations| annotations.first())
            .and_then(|a| a.major_consequence.as_deref())
    }

    /// Whether the record carries no usable value
    pub fn is_empty(&self) -> bool {
        self.allele_freq.is_none() && self.major_consequence().is_none()
    }
}

/// Batch lookup result keyed by the `CHROM-POS-REF-ALT` key string
pub type ExacResponse = HashMap<String, ExacVariant>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_key_display() {
        let key = VariantKey::new("1", 931397, "T", "TA");
        assert_eq!(key.to_string(), "1-931397-T-TA");

        let locus = Locus::new("X", 55, "AT", &["A", "-"]);
        assert_eq!(VariantKey::for_allele(&locus, "-").to_string(), "X-55-AT--");
    }

    #[test]
    fn test_variant_key_serializes_as_string() {
        let keys = vec![
            VariantKey::new("1", 100, "G", "A"),
            VariantKey::new("2", 200, "C", "T"),
        ];
        let body = serde_json::to_string(&keys).unwrap();
        assert_eq!(body, r#"["1-100-G-A","2-200-C-T"]"#);
    }

    #[test]
    fn test_deserialize_variant() {
        let json = r#"{
            "allele_freq": 0.0125,
            "allele_count": 3,
            "vep_annotations": [
                {"major_consequence": "missense_variant", "Gene": "ENSG1"},
                {"major_consequence": "intron_variant"}
            ]
        }"#;
        let variant: ExacVariant = serde_json::from_str(json).unwrap();
        assert_eq!(variant.allele_freq, Some(0.0125));
        assert_eq!(variant.major_consequence(), Some("missense_variant"));
    }

    #[test]
    fn test_empty_record() {
        let variant: ExacVariant = serde_json::from_str("{}").unwrap();
        assert!(variant.is_empty());
        assert_eq!(variant.major_consequence(), None);
    }

    #[test]
    fn test_empty_annotation_list() {
        let variant: ExacVariant =
            serde_json::from_str(r#"{"allele_freq": null, "vep_annotations": []}"#).unwrap();
        assert_eq!(variant.allele_freq, None);
        assert_eq!(variant.major_consequence(), None);
    }

    #[test]
    fn test_annotation_without_consequence() {
        let variant: ExacVariant =
            serde_json::from_str(r#"{"vep_annotations": [{"SYMBOL": "BRCA1"}]}"#).unwrap();
        assert_eq!(variant.major_consequence(), None);
    }
}
