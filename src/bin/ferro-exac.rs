// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-exac CLI
//!
//! Command-line interface for prioritized variant selection and ExAC
//! annotation of VCF files.

use clap::{Parser, Subcommand};
use ferro_exac::exac::build_keys;
use ferro_exac::{
    AnnotationPipeline, ExacClient, FerroError, PipelineConfig, PriorityOrder, VariantTable,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "ferro-exac")]
#[command(author, version, about = "Prioritized variant selection and ExAC annotation")]
#[command(
    long_about = "Select one alternate allele per VCF locus by variant-type priority and annotate
it with read fraction, ExAC allele frequency and VEP major consequence.

Examples:
  ferro-exac annotate -i calls.vcf
  ferro-exac annotate -i calls.vcf -c ferro-exac.toml -o annotated.vcf --table calls.tsv
  ferro-exac select -i calls.vcf --priority del,snp
  ferro-exac keys -i calls.vcf
  ferro-exac config -o ferro-exac.toml"
)]
struct Cli {
    /// Log level or filter directive (e.g. debug, ferro_exac=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write an annotated VCF
    Annotate {
        /// Input VCF file
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// ExAC bulk variant endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Variant-type priority, highest first (e.g. complex,ins,del,mnp,snp)
        #[arg(long)]
        priority: Option<String>,

        /// Output VCF file (default: <input dir>/<prefix><input name>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the enriched table as TSV
        #[arg(long)]
        table: Option<PathBuf>,
    },

    /// Select alleles and compute read fractions without contacting ExAC
    Select {
        /// Input VCF file
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Variant-type priority, highest first
        #[arg(long)]
        priority: Option<String>,

        /// Output TSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the ExAC lookup keys for each record
    Keys {
        /// Input VCF file
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print or write the default configuration
    Config {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let result = match cli.command {
        Commands::Annotate {
            input,
            config,
            endpoint,
            priority,
            output,
            table,
        } => run_annotate(
            &input,
            config.as_deref(),
            endpoint,
            priority.as_deref(),
            output.as_deref(),
            table.as_deref(),
        ),
        Commands::Select {
            input,
            config,
            priority,
            output,
        } => run_select(&input, config.as_deref(), priority.as_deref(), output.as_deref()),
        Commands::Keys { input, config } => run_keys(&input, config.as_deref()),
        Commands::Config { output } => run_config(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.detailed_message());
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) -> Result<(), String> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}

/// Load the configuration file (or defaults) and apply command-line overrides
fn load_config(
    path: Option<&Path>,
    endpoint: Option<String>,
    priority: Option<&str>,
) -> Result<PipelineConfig, FerroError> {
    let mut config = match path {
        Some(p) => {
            info!(config = %p.display(), "loading configuration");
            PipelineConfig::load_from_path(p)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(endpoint) = endpoint {
        config.service.endpoint = endpoint;
    }
    if let Some(priority) = priority {
        config.selection.priority = priority.parse::<PriorityOrder>()?;
    }

    config.validate()?;
    Ok(config)
}

fn run_annotate(
    input: &Path,
    config_path: Option<&Path>,
    endpoint: Option<String>,
    priority: Option<&str>,
    output: Option<&Path>,
    table_path: Option<&Path>,
) -> Result<(), FerroError> {
    let config = load_config(config_path, endpoint, priority)?;
    let client = ExacClient::new(&config.service.endpoint, config.service.timeout())?;
    let pipeline = AnnotationPipeline::new(config)?;

    let table = pipeline.enrich(input, &client)?;
    if let Some(path) = table_path {
        table.write_tsv_path(path)?;
        info!(table = %path.display(), "wrote enriched table");
    }

    let output = match output {
        Some(p) => p.to_path_buf(),
        None => ferro_exac::vcf::annotated_output_path(input, &pipeline.config().output.prefix)?,
    };
    if output == input {
        return Err(FerroError::Config {
            msg: format!("Output path {} is the input file", output.display()),
        });
    }
    let summary = pipeline.write(input, &output, &table)?;

    eprintln!(
        "Annotated {} records ({} multi-allelic, {} with ExAC frequency, {} with VEP consequence) -> {}",
        summary.records,
        summary.multiallelic,
        summary.with_frequency,
        summary.with_consequence,
        summary.output.display()
    );
    Ok(())
}

fn run_select(
    input: &Path,
    config_path: Option<&Path>,
    priority: Option<&str>,
    output: Option<&Path>,
) -> Result<(), FerroError> {
    let config = load_config(config_path, None, priority)?;
    let table = AnnotationPipeline::new(config)?.select(input)?;
    write_table(&table, output)
}

fn write_table(table: &VariantTable, output: Option<&Path>) -> Result<(), FerroError> {
    match output {
        Some(path) => table.write_tsv_path(path),
        None => {
            let stdout = io::stdout();
            table.write_tsv(stdout.lock())
        }
    }
}

fn run_keys(input: &Path, config_path: Option<&Path>) -> Result<(), FerroError> {
    let config = load_config(config_path, None, None)?;
    let table = AnnotationPipeline::new(config)?.prioritize(input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for key in build_keys(&table)? {
        writeln!(out, "{}", key)?;
    }
    Ok(())
}

fn run_config(output: Option<&Path>) -> Result<(), FerroError> {
    let text = PipelineConfig::default().to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Wrote default configuration to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
