//! CLI application for Thai e-slip OCR extraction.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use console::style;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use eslip_core::{EslipConfig, ReceiptPipeline, ReceiptValidator, Severity, SidecarBackend};

/// Thai e-slip OCR - Extract structured data from payment receipts
#[derive(Parser)]
#[command(name = "eslip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input slip image
    image: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// OCR language code
    #[arg(long, default_value = "th")]
    lang: String,

    /// Validate extracted data and report issues
    #[arg(long)]
    validate: bool,

    /// Apply stricter validation rules
    #[arg(long)]
    strict: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = if let Some(path) = &cli.config {
        EslipConfig::from_file(path)?
    } else {
        EslipConfig::default()
    };
    config.ocr.lang = cli.lang.clone();

    if !cli.image.exists() {
        anyhow::bail!("Input file not found: {}", cli.image.display());
    }

    info!("Processing slip: {}", cli.image.display());

    let strict = cli.strict || config.validation.strict;
    let pipeline = ReceiptPipeline::with_config(SidecarBackend::new(), config);
    let result = pipeline.extract(&cli.image)?;

    if cli.validate {
        let validator = if strict {
            ReceiptValidator::new().strict()
        } else {
            ReceiptValidator::new()
        };
        let outcome = validator.validate(&result);

        let verdict = if outcome.is_valid {
            style("valid").green()
        } else {
            style("invalid").red()
        };
        eprintln!(
            "{} (score {:.2}, {} issue(s))",
            verdict,
            outcome.validation_score,
            outcome.issues.len()
        );
        for issue in &outcome.issues {
            let tag = match issue.severity {
                Severity::Error => style("error").red(),
                Severity::Warning => style("warning").yellow(),
                Severity::Info => style("info").dim(),
            };
            eprintln!("  [{}] {}: {}", tag, issue.field, issue.message);
            if let Some(suggested) = &issue.suggested_value {
                eprintln!("        suggested: {suggested}");
            }
        }
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &json)?;
            info!("Wrote result to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
