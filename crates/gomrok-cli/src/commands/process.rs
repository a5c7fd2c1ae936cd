//! Process command - extract fields from a single declaration page.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use gomrok_core::catalog::FieldGroup;
use gomrok_core::{
    DeclarationExtractor, ExtractionRecord, OcrPage, PatternCatalog, ResolverStrategy,
    token_stream, validate_record,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (plain text or OCR JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Page number within the declaration
    #[arg(short, long)]
    page: Option<u32>,

    /// Resolver strategy for fields without an override
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Pattern catalog file (default: built-in)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Match against the quoted token stream of the text
    #[arg(long)]
    token_stream: bool,

    /// Try the next candidate when the best one fails validation
    #[arg(long)]
    fall_through: bool,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,

    /// Validate extracted data
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per field
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// First match by pattern rank
    Priority,
    /// Most frequent value
    Voting,
}

impl From<StrategyArg> for ResolverStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Priority => ResolverStrategy::Priority,
            StrategyArg::Voting => ResolverStrategy::Voting,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(strategy) = args.strategy {
        config.extraction.strategy = strategy.into();
    }
    if args.fall_through {
        config.extraction.fall_through_on_rejection = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    pb.set_message("Loading catalog...");
    let catalog = super::load_catalog(&config, args.catalog.as_ref())?;
    let extractor = super::build_extractor(&config, catalog)?;

    pb.set_message("Reading page...");
    let mut page = read_page(&args.input)?;
    if let Some(number) = args.page {
        page.page_number = Some(number);
    }
    if args.token_stream {
        page.text = token_stream(&page.text);
        debug!("Token stream: {}", page.text);
    }

    pb.set_message("Extracting fields...");
    let record = extractor.extract_ocr(&page);

    pb.finish_and_clear();

    if args.validate {
        let report = validate_record(&record, config.extraction.low_confidence_warning);
        if !report.invalid_fields.is_empty() || !report.warnings.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for invalid in &report.invalid_fields {
                eprintln!(
                    "  - {}: {} ({})",
                    invalid.field,
                    invalid.reason,
                    invalid.raw_value.as_deref().unwrap_or("")
                );
            }
            for warning in &report.warnings {
                eprintln!("  - {}", warning);
            }
        }
    }

    let output = format_record(&record, extractor.catalog(), args.format, args.show_confidence)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Extracted {}/{} fields ({:.1}%), {} high confidence",
            style("ℹ").blue(),
            record.stats.extracted_fields,
            record.stats.total_fields,
            record.stats.success_rate,
            record.stats.high_confidence_fields
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            record.stats.elapsed_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read a page from a text file or an OCR JSON document.
pub fn read_page(path: &Path) -> anyhow::Result<OcrPage> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => Ok(OcrPage::from_file(path)?),
        "txt" | "text" => Ok(OcrPage::from_text(fs::read_to_string(path)?)),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Extract one file with a prepared extractor.
pub fn extract_file(path: &Path, extractor: &DeclarationExtractor) -> anyhow::Result<ExtractionRecord> {
    let page = read_page(path)?;
    if page.text.trim().is_empty() {
        warn!("No text in {}", path.display());
    }
    Ok(extractor.extract_ocr(&page))
}

pub fn format_record(
    record: &ExtractionRecord,
    catalog: &PatternCatalog,
    format: OutputFormat,
    show_confidence: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(record.to_json()?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record, catalog, show_confidence)),
    }
}

fn format_csv(record: &ExtractionRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "field",
        "status",
        "value",
        "confidence",
        "raw_value",
        "matched_pattern",
    ])?;

    for result in &record.fields {
        let value = result.value().map(|v| v.to_string()).unwrap_or_default();
        let confidence = format!("{:.2}", result.confidence);
        wtr.write_record([
            result.field.as_str(),
            result.status(),
            value.as_str(),
            confidence.as_str(),
            result.raw_value.as_deref().unwrap_or(""),
            result.matched_pattern.as_deref().unwrap_or(""),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ExtractionRecord, catalog: &PatternCatalog, show_confidence: bool) -> String {
    let mut output = String::new();
    let info = &record.document_info;

    output.push_str(&format!("Customs declaration ({})\n", info.page_type));
    if let Some(page) = info.page_number {
        output.push_str(&format!("Page: {}\n", page));
    }
    output.push_str(&format!("Catalog: v{}\n", info.catalog_version));

    let sections = [
        ("Identifiers", Some(FieldGroup::Identifiers)),
        ("Financial", Some(FieldGroup::Financial)),
        ("Goods", Some(FieldGroup::Goods)),
        ("Administrative", Some(FieldGroup::Administrative)),
        ("Other", None),
    ];

    for (title, group) in sections {
        let lines: Vec<String> = catalog
            .fields()
            .iter()
            .filter(|f| f.spec.group == group)
            .filter_map(|f| record.field(f.name()))
            .filter_map(|result| {
                let value = result.value()?;
                Some(if show_confidence {
                    format!("  {}: {} ({:.0}%)\n", result.field, value, result.confidence * 100.0)
                } else {
                    format!("  {}: {}\n", result.field, value)
                })
            })
            .collect();

        if lines.is_empty() {
            continue;
        }
        output.push('\n');
        output.push_str(&format!("{}:\n", title));
        for line in lines {
            output.push_str(&line);
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "Extracted {}/{} fields ({:.1}%)\n",
        record.stats.extracted_fields, record.stats.total_fields, record.stats.success_rate
    ));

    output
}
