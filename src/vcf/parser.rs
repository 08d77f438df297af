//! VCF file parsing using noodles-vcf
//!
//! This module wraps the noodles reader. Records can be read either as raw
//! `RecordBuf`s (for re-serialization) or projected onto [`VcfRecord`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use noodles_vcf as nvcf;
use nvcf::variant::record::{AlternateBases, Filters, Ids};

use crate::error::FerroError;

use super::record::{InfoValue, Locus, VcfRecord, MISSING};

/// VCF file reader over a buffered source
pub struct VcfReader<R> {
    inner: nvcf::io::Reader<R>,
    header: nvcf::Header,
}

impl<R: BufRead> VcfReader<R> {
    /// Create a new VCF reader from a buffered reader, parsing the header
    pub fn new(reader: R) -> Result<Self, FerroError> {
        let mut inner = nvcf::io::Reader::new(reader);
        let header = inner.read_header().map_err(|e| FerroError::Vcf {
            msg: format!("Failed to parse VCF header: {}", e),
        })?;

        Ok(Self { inner, header })
    }

    /// Get a reference to the parsed header
    pub fn header(&self) -> &nvcf::Header {
        &self.header
    }

    /// Sample names from the header line
    pub fn sample_names(&self) -> Vec<String> {
        self.header
            .sample_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Read the next record into `record`, returning `false` at EOF
    pub fn read_record_buf(
        &mut self,
        record: &mut nvcf::variant::RecordBuf,
    ) -> Result<bool, FerroError> {
        match self.inner.read_record_buf(&self.header, record) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(e) => Err(FerroError::Vcf {
                msg: format!("Failed to parse VCF record: {}", e),
            }),
        }
    }

    /// Read the next VCF record
    pub fn read_record(&mut self) -> Result<Option<VcfRecord>, FerroError> {
        let mut record = nvcf::variant::RecordBuf::default();

        if self.read_record_buf(&mut record)? {
            Ok(Some(convert_record(&record, &self.header)?))
        } else {
            Ok(None)
        }
    }

    /// Iterate over all records in the VCF file
    pub fn records(self) -> VcfRecordIterator<R> {
        VcfRecordIterator {
            reader: self,
            done: false,
        }
    }
}

/// Open a VCF file from a path
pub fn open_vcf<P: AsRef<Path>>(path: P) -> Result<VcfReader<BufReader<File>>, FerroError> {
    let file = File::open(path.as_ref()).map_err(|e| FerroError::Io {
        msg: format!(
            "Failed to open VCF file {}: {}",
            path.as_ref().display(),
            e
        ),
    })?;
    VcfReader::new(BufReader::new(file))
}

/// Parse VCF from a string
pub fn parse_vcf_string(vcf_content: &str) -> Result<VcfReader<BufReader<&[u8]>>, FerroError> {
    let reader = BufReader::new(vcf_content.as_bytes());
    VcfReader::new(reader)
}

/// Count the data records in a VCF file
pub fn count_records<P: AsRef<Path>>(path: P) -> Result<usize, FerroError> {
    let mut reader = open_vcf(path)?;
    let mut record = nvcf::variant::RecordBuf::default();
    let mut n = 0;
    while reader.read_record_buf(&mut record)? {
        n += 1;
    }
    Ok(n)
}

/// Iterator over VCF records
pub struct VcfRecordIterator<R> {
    reader: VcfReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for VcfRecordIterator<R> {
    type Item = Result<VcfRecord, FerroError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Convert a noodles VCF record to our VcfRecord type
fn convert_record(
    record: &nvcf::variant::RecordBuf,
    header: &nvcf::Header,
) -> Result<VcfRecord, FerroError> {
    let chrom = record.reference_sequence_name().to_string();

    // noodles positions are already 1-based
    let pos = record
        .variant_start()
        .map(|p| p.get() as u64)
        .ok_or_else(|| FerroError::Vcf {
            msg: format!("Missing position in VCF record on {}", chrom),
        })?;

    let id = {
        let ids = record.ids();
        if ids.is_empty() {
            None
        } else {
            Some(
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(";"),
            )
        }
    };

    let reference = record.reference_bases().to_string();

    let alternates: Vec<String> = record
        .alternate_bases()
        .iter()
        .map(|a| match a {
            Ok(allele) => allele.to_string(),
            Err(_) => MISSING.to_string(),
        })
        .collect();

    let quality = record.quality_score();

    let filter = {
        let filters = record.filters();
        if filters.is_pass() {
            None
        } else {
            let filter_strs: Vec<_> = filters
                .iter(header)
                .filter_map(|f| f.ok())
                .map(|filter| filter.to_string())
                .collect();
            if filter_strs.is_empty() {
                None
            } else {
                Some(filter_strs.join(";"))
            }
        }
    };

    let mut info = HashMap::new();
    for (key, value) in record.info().as_ref() {
        let info_value = match value {
            Some(v) => convert_info_value(v),
            None => InfoValue::Missing,
        };
        info.insert(key.to_string(), info_value);
    }

    Ok(VcfRecord {
        locus: Locus {
            chrom,
            pos,
            id,
            reference,
            alternates,
            quality,
            filter,
        },
        info,
    })
}

/// Convert a noodles INFO value to our InfoValue type.
///
/// Arrays keep their length: an array with a missing element becomes a
/// string array holding `.` at that position, so parallel per-allele lists
/// stay aligned with the ALT column.
fn convert_info_value(value: &nvcf::variant::record_buf::info::field::Value) -> InfoValue {
    use nvcf::variant::record_buf::info::field::Value;

    match value {
        Value::Integer(v) => InfoValue::Integer(*v as i64),
        Value::Float(v) => InfoValue::Float(*v as f64),
        Value::Flag => InfoValue::Flag,
        Value::Character(v) => InfoValue::Character(*v),
        Value::String(v) => InfoValue::String(v.clone()),
        Value::Array(arr) => {
            use nvcf::variant::record_buf::info::field::value::Array;
            match arr {
                Array::Integer(vals) => {
                    let ints: Option<Vec<i64>> =
                        vals.iter().map(|v| v.map(|i| i as i64)).collect();
                    ints.map(InfoValue::IntegerArray)
                        .unwrap_or_else(|| InfoValue::StringArray(display_or_missing(vals)))
                }
                Array::Float(vals) => {
                    let floats: Option<Vec<f64>> =
                        vals.iter().map(|v| v.map(|f| f as f64)).collect();
                    floats
                        .map(InfoValue::FloatArray)
                        .unwrap_or_else(|| InfoValue::StringArray(display_or_missing(vals)))
                }
                Array::Character(vals) => InfoValue::StringArray(display_or_missing(vals)),
                Array::String(vals) => InfoValue::StringArray(
                    vals.iter()
                        .map(|v| v.clone().unwrap_or_else(|| MISSING.to_string()))
                        .collect(),
                ),
            }
        }
    }
}

fn display_or_missing<T: ToString>(vals: &[Option<T>]) -> Vec<String> {
    vals.iter()
        .map(|v| {
            v.as_ref()
                .map_or_else(|| MISSING.to_string(), |x| x.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREEBAYES_VCF: &str = "##fileformat=VCFv4.2
##contig=<ID=1,length=249250621>
##INFO=<ID=TYPE,Number=A,Type=String,Description=\"The type of allele\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total read depth\">
##INFO=<ID=RO,Number=1,Type=Integer,Description=\"Reference allele observations\">
##INFO=<ID=AO,Number=A,Type=Integer,Description=\"Alternate allele observations\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
1\t931393\trs123\tG\tT\t2.17\t.\tTYPE=snp;DP=20;RO=10;AO=10
1\t931397\t.\tT\tA,TA\t50\tPASS\tTYPE=snp,ins;DP=30;RO=20;AO=3,7
";

    #[test]
    fn test_parse_vcf_string() {
        let reader = parse_vcf_string(FREEBAYES_VCF).unwrap();
        assert!(reader.sample_names().is_empty());
        assert_eq!(reader.header().infos().len(), 4);
    }

    #[test]
    fn test_read_records() {
        let mut reader = parse_vcf_string(FREEBAYES_VCF).unwrap();

        let first = reader.read_record().unwrap().unwrap();
        assert_eq!(first.locus.chrom, "1");
        assert_eq!(first.locus.pos, 931393);
        assert_eq!(first.locus.id, Some("rs123".to_string()));
        assert_eq!(first.locus.reference, "G");
        assert_eq!(first.locus.alternates, vec!["T"]);
        assert_eq!(first.info.get("DP"), Some(&InfoValue::Integer(20)));
        assert_eq!(
            first.info.get("TYPE"),
            Some(&InfoValue::StringArray(vec!["snp".to_string()]))
        );

        let second = reader.read_record().unwrap().unwrap();
        assert!(second.locus.is_multiallelic());
        assert_eq!(second.locus.alternates, vec!["A", "TA"]);
        assert_eq!(
            second.info.get("AO"),
            Some(&InfoValue::IntegerArray(vec![3, 7]))
        );
        assert!(second.locus.filter.is_none());

        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn test_records_iterator() {
        let reader = parse_vcf_string(FREEBAYES_VCF).unwrap();
        let records: Vec<_> = reader.records().collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_count_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.vcf");
        std::fs::write(&path, FREEBAYES_VCF).unwrap();

        assert_eq!(count_records(&path).unwrap(), 2);
    }

    #[test]
    fn test_open_missing_file() {
        let err = open_vcf("does/not/exist.vcf").err().unwrap();
        assert!(matches!(err, FerroError::Io { .. }));
    }

    #[test]
    fn test_display_or_missing() {
        let vals = vec![Some(3), None, Some(7)];
        assert_eq!(display_or_missing(&vals), vec!["3", ".", "7"]);
    }
}
