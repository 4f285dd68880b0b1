//! Process command - extract data from a single detection dump.
//!
//! A detection dump is the JSON handed over by the OCR-invocation
//! layer: an ordered list of pages, each mapping engine identifiers to
//! that engine's raw detections for the page.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use serde::Deserialize;
use tracing::{debug, info};

use danfex_core::{
    fuse_and_extract, BoundingBox, Detection, DocumentRecord, PageDetections, PipelineConfig,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input detection dump (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show document confidence summary
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// On-disk detection dump format.
#[derive(Debug, Deserialize)]
struct DetectionDump {
    pages: Vec<BTreeMap<String, Vec<RawDetection>>>,
}

/// One raw detection as produced by an engine adapter.
#[derive(Debug, Deserialize)]
struct RawDetection {
    text: String,
    /// [x_min, y_min, x_max, y_max] in image coordinates.
    bbox: [f32; 4],
    confidence: f32,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let record = process_file(&args.input, &config)?;

    let output = format_record(&record, args.format)?;

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
            "{} Document confidence: {:.1}%",
            style("ℹ").blue(),
            record.confidence_score * 100.0
        );
        println!(
            "{} Extraction ratio: {}/{}",
            style("ℹ").blue(),
            record.present_count(),
            danfex_core::FIELD_COUNT
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load the pipeline configuration, falling back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => PipelineConfig::from_file(Path::new(path))
            .with_context(|| format!("failed to load config from {}", path)),
        None => Ok(PipelineConfig::default()),
    }
}

/// Read a detection dump and run the full fusion/extraction pipeline.
pub fn process_file(path: &Path, config: &PipelineConfig) -> anyhow::Result<DocumentRecord> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let dump: DetectionDump = serde_json::from_str(&data)
        .with_context(|| format!("invalid detection dump: {}", path.display()))?;

    let pages = convert_pages(dump)?;

    debug!(pages = pages.len(), "loaded detection dump");

    let record = fuse_and_extract(&pages, config)?;
    Ok(record)
}

/// Convert the raw dump into validated core detections.
fn convert_pages(dump: DetectionDump) -> anyhow::Result<Vec<PageDetections>> {
    let mut pages = Vec::with_capacity(dump.pages.len());

    for (page_index, engines) in dump.pages.into_iter().enumerate() {
        let mut page = PageDetections::new();
        for (engine, raw_detections) in engines {
            let mut detections = Vec::with_capacity(raw_detections.len());
            for raw in raw_detections {
                let [x_min, y_min, x_max, y_max] = raw.bbox;
                let detection = Detection::new(
                    raw.text,
                    BoundingBox::new(x_min, y_min, x_max, y_max),
                    raw.confidence,
                    engine.clone(),
                )
                .with_context(|| {
                    format!("invalid detection on page {} from {}", page_index, engine)
                })?;
                detections.push(detection);
            }
            page.insert(engine, detections);
        }
        pages.push(page);
    }

    Ok(pages)
}

pub fn format_record(record: &DocumentRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => format_text(record),
    }
}

fn format_csv(record: &DocumentRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["field", "value", "raw", "valid", "confidence"])?;

    for (name, field) in record.fields() {
        let value = field.value.as_ref().map(|v| v.display()).unwrap_or_default();
        let valid = field.is_valid.to_string();
        let confidence = format!("{:.0}", field.confidence);
        wtr.write_record([
            name.as_str(),
            value.as_str(),
            field.raw.as_str(),
            valid.as_str(),
            confidence.as_str(),
        ])?;
    }

    let score = format!("{:.3}", record.confidence_score);
    wtr.write_record(["confidence_score", score.as_str(), "", "", ""])?;
    let ratio = format!("{:.3}", record.extraction_ratio);
    wtr.write_record(["extraction_ratio", ratio.as_str(), "", "", ""])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &DocumentRecord) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str("Extracted fields:\n");
    for (name, field) in record.fields() {
        if !field.present {
            continue;
        }
        let value = field.value.as_ref().map(|v| v.display()).unwrap_or_default();
        let marker = if field.is_valid { " " } else { "!" };
        output.push_str(&format!(
            "  {}{:<20} {} ({:.0}%)\n",
            marker,
            name.as_str(),
            value,
            field.confidence
        ));
    }

    output.push_str(&format!(
        "\nDocument confidence: {:.1}%  (OCR avg {:.2}, {} of {} fields)\n",
        record.confidence_score * 100.0,
        record.ocr_confidence_avg,
        record.present_count(),
        danfex_core::FIELD_COUNT
    ));

    Ok(output)
}
