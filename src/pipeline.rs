//! End-to-end annotation pipeline
//!
//! Runs load, prioritize, read fraction, enrich and write for one VCF file.
//! Any stage error aborts the run; the output file only appears once every
//! record has been written.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::FerroError;
use crate::exac::{apply_enrichment, ExacService};
use crate::fraction::apply_read_fraction;
use crate::prioritize::VariantPrioritizer;
use crate::table::{load_table, VariantTable};
use crate::vcf::{annotated_output_path, VcfAnnotationWriter};

/// Outcome of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    /// Records read and written
    pub records: usize,
    /// Records with more than one alternate allele
    pub multiallelic: usize,
    /// Rows that received an ExAC allele frequency
    pub with_frequency: usize,
    /// Rows that received a VEP major consequence
    pub with_consequence: usize,
    pub output: PathBuf,
}

/// Annotation pipeline bound to a configuration
#[derive(Debug, Clone, Default)]
pub struct AnnotationPipeline {
    config: PipelineConfig,
}

impl AnnotationPipeline {
    /// Create a pipeline; fails if the configuration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self, FerroError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn prioritizer(&self) -> VariantPrioritizer {
        let selection = &self.config.selection;
        VariantPrioritizer::new(selection.priority.clone())
            .with_type_field(&selection.type_field)
            .with_count_field(selection.count_field.as_deref())
    }

    /// Load `input` and select one allele per row. Depth is not read.
    pub fn prioritize<P: AsRef<Path>>(&self, input: P) -> Result<VariantTable, FerroError> {
        let mut table = load_table(
            input.as_ref(),
            &self.config.input.locus_fields,
            &self.config.input.info_fields,
        )?;
        self.prioritizer().apply(&mut table)?;
        Ok(table)
    }

    /// Load `input` and run the offline stages (selection and read fraction)
    pub fn select<P: AsRef<Path>>(&self, input: P) -> Result<VariantTable, FerroError> {
        let mut table = self.prioritize(input)?;
        if self.config.selection.count_field.is_some() {
            apply_read_fraction(&mut table, &self.config.selection.depth_field)?;
        }
        Ok(table)
    }

    /// Run every stage and return the enriched table
    pub fn enrich<P, S>(&self, input: P, service: &S) -> Result<VariantTable, FerroError>
    where
        P: AsRef<Path>,
        S: ExacService + ?Sized,
    {
        let mut table = self.select(input)?;
        apply_enrichment(&mut table, service)?;
        Ok(table)
    }

    /// Annotate `input` into the configured default location,
    /// `<dir>/<prefix><file name>`
    pub fn run<P, S>(&self, input: P, service: &S) -> Result<PipelineSummary, FerroError>
    where
        P: AsRef<Path>,
        S: ExacService + ?Sized,
    {
        let output = annotated_output_path(input.as_ref(), &self.config.output.prefix)?;
        self.run_to(input, &output, service)
    }

    /// Annotate `input` into `output`
    pub fn run_to<P, S>(
        &self,
        input: P,
        output: &Path,
        service: &S,
    ) -> Result<PipelineSummary, FerroError>
    where
        P: AsRef<Path>,
        S: ExacService + ?Sized,
    {
        let input = input.as_ref();
        if input == output {
            return Err(FerroError::Config {
                msg: format!("Output path {} is the input file", output.display()),
            });
        }

        let table = self.enrich(input, service)?;
        let summary = self.write(input, output, &table)?;
        info!(
            input = %input.display(),
            output = %output.display(),
            records = summary.records,
            "annotation complete"
        );
        Ok(summary)
    }

    /// Write an already enriched table as an annotated copy of `input`
    pub fn write(
        &self,
        input: &Path,
        output: &Path,
        table: &VariantTable,
    ) -> Result<PipelineSummary, FerroError> {
        let writer = VcfAnnotationWriter::new(&self.config.selection.priority);
        let records = writer.write(input, output, table)?;

        let rows = table.rows();
        Ok(PipelineSummary {
            records,
            multiallelic: rows.iter().filter(|r| r.locus.is_multiallelic()).count(),
            with_frequency: rows.iter().filter(|r| r.allele_freq.is_some()).count(),
            with_consequence: rows.iter().filter(|r| r.consequence.is_some()).count(),
            output: output.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exac::MockExacService;

    #[test]
    fn test_new_validates_config() {
        let mut config = PipelineConfig::default();
        config.output.prefix.clear();
        assert!(AnnotationPipeline::new(config).is_err());
        assert!(AnnotationPipeline::new(PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_run_to_refuses_input_as_output() {
        let pipeline = AnnotationPipeline::default();
        let path = Path::new("calls.vcf");
        let err = pipeline
            .run_to(path, path, &MockExacService::new())
            .unwrap_err();
        assert!(matches!(err, FerroError::Config { .. }));
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnnotationPipeline::default()
            .run(dir.path().join("absent.vcf"), &MockExacService::new())
            .unwrap_err();
        assert!(matches!(err, FerroError::Io { .. }));
    }
}
