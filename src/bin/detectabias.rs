//! CLI binary for detectabias.
//!
//! `serve` starts the web UI; `analyze` runs one PDF through the same
//! pipeline and prints the report. Both map flags to `AnalysisConfig`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use detectabias::web::{self, AppState};
use detectabias::{
    analyze_file, secrets, AnalysisConfig, AnalysisProgressCallback, Classification, ParseOutcome,
    PdfiumExtractor, ProgressCallback, PromptTemplate, ReportView, ServerConfig, TextExtractor,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner following the analysis stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, pdf_bytes: usize) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("{pdf_bytes} bytes"));
    }

    fn on_extraction_complete(&self, pages: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Text extracted  {}",
            green("✓"),
            dim(&format!("{pages} pages, {chars} chars"))
        ));
    }

    fn on_request_start(&self, prompt_chars: usize) {
        self.bar.set_prefix("Analyzing");
        self.bar.set_message(format!("waiting for the model ({prompt_chars} chars sent)"));
    }

    fn on_response(&self, response_chars: usize, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} Model answered  {}",
            green("✓"),
            dim(&format!("{response_chars} chars, {:.1}s", elapsed_ms as f64 / 1000.0))
        ));
    }

    fn on_analysis_complete(&self, parsed: bool) {
        self.bar.finish_and_clear();
        if parsed {
            eprintln!("{} Analysis complete", green("✔"));
        } else {
            eprintln!("{} Analysis failed", red("✘"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web UI on http://127.0.0.1:8501
  detectabias serve

  # Listen on all interfaces
  detectabias serve --bind 0.0.0.0:8080

  # Analyze one decision, Markdown report on stdout
  detectabias analyze decision.pdf

  # Raw record and stats as JSON
  detectabias analyze --json decision.pdf > report.json

  # Another provider and a custom prompt
  detectabias --provider openai --model gpt-4.1-mini --prompt-file my_prompt.txt analyze decision.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  DETECTABIAS_PROVIDER    Override provider
  DETECTABIAS_MODEL       Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q

SECRETS:
  API keys are read from the environment, then from ./.env, then from
  ./secrets.toml (flat KEY = "value" pairs, see --secrets-file).
"#;

/// Detect linguistic bias in judicial decisions with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "detectabias",
    version,
    about = "Detect linguistic bias in judicial decisions (PDF) with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    analysis: AnalysisArgs,

    /// TOML file with API keys.
    #[arg(long, global = true, env = "DETECTABIAS_SECRETS")]
    secrets_file: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DETECTABIAS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DETECTABIAS_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, global = true, env = "DETECTABIAS_PROVIDER", default_value = detectabias::config::DEFAULT_PROVIDER)]
    provider: String,

    /// LLM model ID.
    #[arg(long, global = true, env = "DETECTABIAS_MODEL", default_value = detectabias::config::DEFAULT_MODEL)]
    model: String,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, global = true, env = "DETECTABIAS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "DETECTABIAS_MAX_TOKENS", default_value_t = 32_768)]
    max_tokens: usize,

    /// LLM call timeout in seconds. Provider client default when unset.
    #[arg(long, global = true, env = "DETECTABIAS_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, global = true, env = "DETECTABIAS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Prompt template file; must contain `{text}`, may contain `{schema}`.
    #[arg(long, global = true, env = "DETECTABIAS_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Path to the pdfium shared library (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web UI.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DETECTABIAS_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "DETECTABIAS_MAX_UPLOAD_MB", default_value_t = 25,
              value_parser = clap::value_parser!(u32).range(1..=1024))]
        max_upload_mb: u32,
    },

    /// Analyze one PDF and print the report.
    Analyze {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Write the report to this file instead of stdout.
        #[arg(short, long, env = "DETECTABIAS_OUTPUT")]
        output: Option<PathBuf>,

        /// Output the record and stats as JSON instead of Markdown.
        #[arg(long)]
        json: bool,

        /// Thematic classification shown on the report.
        #[arg(long, default_value = "unclassified")]
        classification: Classification,

        /// Disable the progress spinner.
        #[arg(long, env = "DETECTABIAS_NO_PROGRESS")]
        no_progress: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters during `analyze`, so
    // library INFO logs are only shown for `serve` or with --verbose.
    let spinner = match &cli.command {
        Command::Analyze { json, no_progress, .. } => !cli.quiet && !json && !no_progress,
        Command::Serve { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Exported into the environment, so this runs before any thread exists.
    secrets::load_secrets(cli.secrets_file.as_deref()).context("Failed to load secrets")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the tokio runtime")?
        .block_on(run(cli, spinner))
}

async fn run(cli: Cli, spinner: bool) -> Result<()> {
    match cli.command {
        Command::Serve { bind, max_upload_mb } => {
            let config = build_config(&cli.analysis, None)?;
            let server = ServerConfig {
                bind,
                max_upload_bytes: max_upload_mb as usize * 1024 * 1024,
            };
            let extractor: Arc<dyn TextExtractor> =
                Arc::new(PdfiumExtractor::new(config.pdfium_lib_path.clone()));
            let state = Arc::new(AppState::new(config, extractor).context("Failed to build the web UI")?);
            web::serve(state, &server).await.context("Server failed")
        }
        Command::Analyze {
            input,
            output,
            json,
            classification,
            ..
        } => {
            let progress: Option<ProgressCallback> = if spinner {
                Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
            } else {
                None
            };
            let config = build_config(&cli.analysis, progress)?;

            let result = analyze_file(&input, &config)
                .await
                .context("Analysis failed")?;

            let rendered = match &result.outcome {
                ParseOutcome::Parsed { record, .. } if json => serde_json::to_string_pretty(
                    &serde_json::json!({ "record": record, "stats": result.stats }),
                )
                .context("Failed to serialise output")?,
                ParseOutcome::Parsed { record, .. } => {
                    ReportView::new(record, classification).to_markdown()
                }
                ParseOutcome::Unrecoverable { raw, reason } => {
                    eprintln!("{} {}", red("✘"), bold("The model response could not be parsed."));
                    eprintln!("{}", dim(reason));
                    eprintln!("{raw}");
                    anyhow::bail!("Unrecoverable model response");
                }
            };

            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered.as_bytes())
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
                    }
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    handle
                        .write_all(rendered.as_bytes())
                        .context("Failed to write to stdout")?;
                    if !rendered.ends_with('\n') {
                        handle.write_all(b"\n").ok();
                    }
                }
            }

            if !cli.quiet && !json {
                eprintln!(
                    "   {} tokens in  /  {} tokens out  —  {}ms total",
                    dim(&result.stats.input_tokens.to_string()),
                    dim(&result.stats.output_tokens.to_string()),
                    result.stats.total_duration_ms,
                );
            }
            Ok(())
        }
    }
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(args: &AnalysisArgs, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .provider_name(&args.provider)
        .model(&args.model)
        .max_tokens(args.max_tokens)
        .download_timeout_secs(args.download_timeout);

    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(secs) = args.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = args.prompt_file {
        let prompt = PromptTemplate::from_file(path)
            .with_context(|| format!("Failed to load prompt from {}", path.display()))?;
        builder = builder.prompt(prompt);
    }
    if let Some(ref path) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
