//! Batch processing command for multiple detection dumps.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use danfex_core::DocumentRecord;

use super::process::{format_record, load_config, process_file, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    record: Option<DocumentRecord>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_file(&path, &config);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(record) => {
                if let Some(ref output_dir) = args.output_dir {
                    let output = format_record(&record, args.format)?;
                    let extension = match args.format {
                        OutputFormat::Json => "json",
                        OutputFormat::Csv => "csv",
                        OutputFormat::Text => "txt",
                    };
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("output");
                    let output_path = output_dir.join(format!("{}.out.{}", stem, extension));
                    fs::write(&output_path, output)?;
                }

                results.push(ProcessResult {
                    path: path.clone(),
                    record: Some(record),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path: path.clone(),
                        record: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        let summary = build_summary(&results)?;
        match args.output_dir {
            Some(ref output_dir) => {
                let summary_path = output_dir.join("summary.csv");
                fs::write(&summary_path, summary)?;
                println!(
                    "{} Summary written to {}",
                    style("✓").green(),
                    summary_path.display()
                );
            }
            None => println!("{}", summary),
        }
    }

    let succeeded = results.iter().filter(|r| r.record.is_some()).count();
    let failed = results.len() - succeeded;

    println!(
        "{} Processed {} files in {:.1}s ({} ok, {} failed)",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs_f32(),
        succeeded,
        failed
    );

    Ok(())
}

fn build_summary(results: &[ProcessResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "file",
        "confidence_score",
        "extraction_ratio",
        "ocr_confidence_avg",
        "time_ms",
        "error",
    ])?;

    for result in results {
        let file = result.path.display().to_string();
        let time_ms = result.processing_time_ms.to_string();
        match &result.record {
            Some(record) => {
                let score = format!("{:.3}", record.confidence_score);
                let ratio = format!("{:.3}", record.extraction_ratio);
                let ocr_avg = format!("{:.3}", record.ocr_confidence_avg);
                wtr.write_record([
                    file.as_str(),
                    score.as_str(),
                    ratio.as_str(),
                    ocr_avg.as_str(),
                    time_ms.as_str(),
                    "",
                ])?;
            }
            None => {
                wtr.write_record([
                    file.as_str(),
                    "",
                    "",
                    "",
                    time_ms.as_str(),
                    result.error.as_deref().unwrap_or("unknown"),
                ])?;
            }
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
