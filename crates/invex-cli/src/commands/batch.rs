//! Batch processing command for multiple invoice files.

use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invex_core::{Decimal, DocumentKind, ResponseSource};

use super::process::{OutputFormat, format_response};
use super::{build_pipeline, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory (default: one JSON line per file on stdout)
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
struct FileResult {
    path: PathBuf,
    source: Option<ResponseSource>,
    item_count: Option<usize>,
    reconciled_amount: Option<Decimal>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let api_key = config.fallback.resolve_api_key()?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && DocumentKind::from_path(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let pb = overall_pb.clone();
    let output_dir = args.output_dir.clone();
    let (format, continue_on_error) = (args.format, args.continue_on_error);

    let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<FileResult>> {
        let pipeline = build_pipeline(&config, api_key)?;
        let mut results = Vec::with_capacity(files.len());

        for path in files {
            let file_start = Instant::now();
            let outcome = isolate(&path, || {
                let out = pipeline.process(&path)?;
                write_file_output(&path, output_dir.as_deref(), &out.response, format)?;
                Ok(out)
            });
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(out) => {
                    let extraction = out.response.extraction();
                    results.push(FileResult {
                        path,
                        source: Some(out.source),
                        item_count: extraction.map(|r| r.total_item_count),
                        reconciled_amount: extraction.map(|r| r.reconciled_amount),
                        error: None,
                        processing_time_ms,
                    });
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    if !continue_on_error {
                        error!("Failed to process {}: {}", path.display(), error_msg);
                        anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                    }
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        source: None,
                        item_count: None,
                        reconciled_amount: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                }
            }

            pb.inc(1);
        }

        Ok(results)
    })
    .await??;

    overall_pb.finish_and_clear();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Run one file's work, turning a panic into an error for that file only.
fn isolate<T>(path: &Path, work: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            anyhow::bail!("panicked while processing {}: {}", path.display(), reason)
        }
    }
}

fn write_file_output(
    path: &Path,
    output_dir: Option<&Path>,
    response: &invex_core::ExtractionResponse,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let Some(output_dir) = output_dir else {
        println!("{}", serde_json::to_string(response)?);
        return Ok(());
    };

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("invoice");
    let output_path = output_dir.join(format!("{}.{}", name, format.extension()));

    fs::write(&output_path, format_response(response, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "file",
        "source",
        "items",
        "reconciled_amount",
        "error",
        "processing_time_ms",
    ])?;

    for result in results {
        wtr.write_record([
            result.path.display().to_string(),
            result.source.map(|s| s.to_string()).unwrap_or_default(),
            result.item_count.map(|n| n.to_string()).unwrap_or_default(),
            result.reconciled_amount.map(|a| a.to_string()).unwrap_or_default(),
            result.error.clone().unwrap_or_default(),
            result.processing_time_ms.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_summary_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let results = vec![
            FileResult {
                path: PathBuf::from("a.pdf"),
                source: Some(ResponseSource::Horizontal),
                item_count: Some(2),
                reconciled_amount: Some(Decimal::from_str("27.50").unwrap()),
                error: None,
                processing_time_ms: 12,
            },
            FileResult {
                path: PathBuf::from("b.png"),
                source: None,
                item_count: None,
                reconciled_amount: None,
                error: Some("failed to read image: bad header".to_string()),
                processing_time_ms: 3,
            },
        ];

        write_summary(&path, &results).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "file,source,items,reconciled_amount,error,processing_time_ms\n\
             a.pdf,horizontal,2,27.50,,12\n\
             b.png,,,,failed to read image: bad header,3\n"
        );
    }

    #[test]
    fn test_isolate_turns_panic_into_error() {
        let path = Path::new("bad.pdf");
        let err = isolate::<()>(path, || panic!("malformed xref")).unwrap_err();

        assert_eq!(
            err.to_string(),
            "panicked while processing bad.pdf: malformed xref"
        );
    }

    #[test]
    fn test_isolate_passes_results_through() {
        let path = Path::new("ok.pdf");
        assert_eq!(isolate(path, || Ok(7)).unwrap(), 7);
        assert!(isolate::<()>(path, || anyhow::bail!("boom")).is_err());
    }
}
