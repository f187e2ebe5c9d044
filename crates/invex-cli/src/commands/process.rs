//! Process command - extract line items from a single invoice file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, info, warn};

use invex_core::{DocumentKind, ExtractionResponse, ExtractionResult};

use super::{build_acquirer, build_pipeline, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the acquired text only, without extraction
    #[arg(long)]
    raw_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
    /// One CSV row per line item
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json | Self::Pretty => "json",
            Self::Csv => "csv",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // The credential is checked before the document is touched.
    let api_key = if args.raw_text {
        None
    } else {
        Some(config.fallback.resolve_api_key()?)
    };

    DocumentKind::from_path(&args.input)?;
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));

    let input = args.input.clone();
    let output = match api_key {
        None => {
            pb.set_message("Acquiring text...");
            let text = tokio::task::spawn_blocking(move || {
                build_acquirer(&config).extract_text(&input)
            })
            .await??;
            pb.finish_and_clear();
            text
        }
        Some(api_key) => {
            pb.set_message("Extracting line items...");
            let result = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
                let pipeline = build_pipeline(&config, api_key)?;
                Ok(pipeline.process(&input)?)
            })
            .await??;
            pb.finish_and_clear();

            debug!(
                "Response from {} after {}ms",
                result.source, result.processing_time_ms
            );
            format_response(&result.response, args.format)?
        }
    };

    write_output(args.output.as_deref(), &output)?;

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("{} Output written to {}", style("✓").green(), path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub fn format_response(response: &ExtractionResponse, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(response)?),
        OutputFormat::Pretty => Ok(serde_json::to_string_pretty(response)?),
        OutputFormat::Csv => format_csv(response),
    }
}

/// Line items as CSV, one row per item.
///
/// Model responses are written when their `data` has the canonical shape.
/// A raw-text response yields only the header.
fn format_csv(response: &ExtractionResponse) -> anyhow::Result<String> {
    let result = match response {
        ExtractionResponse::Items { data, .. } => Some(data.clone()),
        ExtractionResponse::Model(value) => {
            let data = canonical_data(value);
            if data.is_none() {
                warn!("Model response is not in the canonical shape, writing header only");
            }
            data
        }
        ExtractionResponse::RawText { .. } => {
            warn!("No line items extracted, writing header only");
            None
        }
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["page_no", "item_name", "item_quantity", "item_rate", "item_amount"])?;

    if let Some(result) = result {
        for page in &result.pagewise_line_items {
            for item in &page.bill_items {
                wtr.write_record([
                    page.page_no.as_str(),
                    item.item_name.as_str(),
                    &item.item_quantity.to_string(),
                    &item.item_rate.map(|r| r.to_string()).unwrap_or_default(),
                    &item.item_amount.to_string(),
                ])?;
            }
        }
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn canonical_data(value: &Value) -> Option<ExtractionResult> {
    serde_json::from_value(value.get("data")?.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use invex_core::{Decimal, ExtractedLineItem};
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_csv_rows_for_items() {
        let response = ExtractionResponse::items(ExtractionResult::single_page(vec![
            ExtractedLineItem::new("Paracetamol 500mg", dec("10"), dec("25.00")).with_rate(dec("2.50")),
            ExtractedLineItem::new("Cough, Syrup", dec("1"), dec("4.00")),
        ])
        .unwrap());

        let csv = format_response(&response, OutputFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "page_no,item_name,item_quantity,item_rate,item_amount\n\
             1,Paracetamol 500mg,10,2.50,25.00\n\
             1,\"Cough, Syrup\",1,,4.00\n"
        );
    }

    #[test]
    fn test_csv_for_model_response() {
        let response = ExtractionResponse::Model(json!({
            "is_success": true,
            "data": {
                "pagewise_line_items": [{
                    "page_no": "2",
                    "bill_items": [{"item_name": "Gauze", "item_quantity": 3, "item_amount": 6.5}]
                }],
                "total_item_count": 1,
                "reconciled_amount": 6.5
            }
        }));

        let csv = format_response(&response, OutputFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "page_no,item_name,item_quantity,item_rate,item_amount\n2,Gauze,3,,6.5\n"
        );
    }

    #[test]
    fn test_csv_for_raw_text_is_header_only() {
        let csv = format_response(&ExtractionResponse::raw_text("hello"), OutputFormat::Csv).unwrap();
        assert_eq!(csv, "page_no,item_name,item_quantity,item_rate,item_amount\n");
    }
}
