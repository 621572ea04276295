//! CLI binary for marksheet-extract.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ExtractionConfig` and prints the extracted record as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use marksheet_extract::{extract, extract_to_file, ExtractionConfig, ProviderKind};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Extract structured marksheet data from a scanned PDF or image.
///
/// The document is OCRed page by page, structured by the configured LLM
/// provider, and every field is scored by blending model and OCR
/// confidence. Output is a JSON record on stdout (or --out FILE).
#[derive(Parser, Debug)]
#[command(name = "marksheet-extract", version, about, long_about = None)]
struct Cli {
    /// Path to the marksheet document (PDF, PNG, or JPEG).
    input: PathBuf,

    /// LLM provider: 'chat' (OpenAI-style) or 'generic' (prompt-in JSON endpoint).
    #[arg(long, env = "LLM_PROVIDER", default_value = "chat")]
    provider: String,

    /// Bearer credential for the provider.
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name for the chat provider (default: gpt-4o-mini).
    #[arg(long, env = "LLM_MODEL")]
    model: Option<String>,

    /// Provider endpoint URL (required for --provider generic).
    #[arg(long, env = "LLM_ENDPOINT")]
    endpoint: Option<String>,

    /// OCR engine executable.
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    ocr_cmd: String,

    /// OCR language(s), e.g. 'eng' or 'eng+hin'.
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Pages OCRed concurrently.
    #[arg(long, default_value_t = 4)]
    ocr_concurrency: usize,

    /// Provider call timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Write the JSON record to this file instead of stdout.
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let provider: ProviderKind = cli.provider.parse().context("invalid --provider")?;

    // Provider-specific environment fallbacks from the original deployments;
    // explicit flags and LLM_* variables take precedence.
    let api_key = cli.api_key.or_else(|| match provider {
        ProviderKind::Chat => std::env::var("OPENAI_API_KEY").ok(),
        ProviderKind::Generic => std::env::var("GEMINI_API_KEY").ok(),
    });
    let endpoint = cli.endpoint.or_else(|| match provider {
        ProviderKind::Generic => std::env::var("GEMINI_ENDPOINT").ok(),
        ProviderKind::Chat => None,
    });

    let mut builder = ExtractionConfig::builder()
        .provider(provider)
        .ocr_cmd(&cli.ocr_cmd)
        .ocr_language(&cli.lang)
        .ocr_concurrency(cli.ocr_concurrency)
        .api_timeout_secs(cli.timeout);
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint(endpoint);
    }
    let config = builder.build().context("invalid configuration")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Extracting {}…", cli.input.display()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let input = cli.input.to_string_lossy();
    let result = match &cli.out {
        Some(out_path) => extract_to_file(&*input, out_path, &config).await,
        None => extract(&*input, &config).await,
    };

    spinner.finish_and_clear();

    let record = result.with_context(|| format!("extraction failed for {}", cli.input.display()))?;

    match &cli.out {
        Some(out_path) => {
            eprintln!("Wrote {}", out_path.display());
        }
        None => {
            let json = if cli.pretty {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string(&record)?
            };
            println!("{json}");
        }
    }

    Ok(())
}
