//! CLI binary for gazette-report.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig`, runs one analysis and prints where the report went.

use anyhow::{Context, Result};
use clap::Parser;
use gazette_report::config::{API_BASE_ENV, API_KEY_ENV, DEFAULT_INPUT_DIR, DEFAULT_REPORTS_DIR};
use gazette_report::{
    analyze_file, analyze_latest, AnalysisOutput, AnalyzerConfig, GazetteError,
    PipelineProgressCallback, ProgressCallback, ReportTheme, ServiceConfig, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// One spinner for the whole run; each finished stage prints a log line
/// above it.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::ReadDocument => "Reading gazette text…",
        Stage::Segment => "Splitting pages…",
        Stage::Extract => "Waiting for the extraction service…",
        Stage::Render => "Writing report…",
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar
            .println(format!("  {} {:<8} {}", green("✓"), stage, dim(detail)));
    }

    fn on_run_complete(&self, _report_path: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse the newest PDF in ./downloads, report into ./reports
  gazette-report

  # Analyse a specific issue
  gazette-report downloads/el-peruano-2024-05-20.pdf

  # Banner layout, sections flowing without page breaks
  gazette-report --theme banner --no-hard-breaks

  # Print the extracted analysis as JSON as well
  gazette-report --json > analysis.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Google Gemini API key (required)
  GAZETTE_MODEL       Override model ID (default gemini-2.5-pro)
  GAZETTE_API_BASE    Override API base URL
  GAZETTE_INPUT_DIR   Directory scanned for the newest PDF
  GAZETTE_OUTPUT_DIR  Directory receiving reports
  PDFIUM_LIB_PATH     Path to libpdfium (file or directory)
  RUST_LOG            tracing filter, overrides -v / -q

EXIT CODES:
  0 success, 2 configuration, 3 no input found, 4 extraction, 5 I/O, 1 other
"#;

/// Analyse an El Peruano gazette PDF and write a PDF report.
#[derive(Parser, Debug)]
#[command(
    name = "gazette-report",
    version,
    about = "Analyse an El Peruano gazette PDF and write a PDF report",
    long_about = "Extract the legal norms relevant to the water and sanitation sector and the \
public appointments from an issue of the official gazette El Peruano, using a Gemini model \
with schema-constrained output, and lay them out as a branded PDF report.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF to analyse. Default: newest PDF in --input-dir.
    input: Option<PathBuf>,

    /// Directory scanned for the newest PDF when no input is given.
    #[arg(long, env = "GAZETTE_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Directory receiving the report (created when absent).
    #[arg(short, long, env = "GAZETTE_OUTPUT_DIR", default_value = DEFAULT_REPORTS_DIR)]
    output_dir: PathBuf,

    /// Gemini API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID.
    #[arg(long, env = "GAZETTE_MODEL")]
    model: Option<String>,

    /// API base URL up to the version segment.
    #[arg(long, env = API_BASE_ENV)]
    api_base: Option<String>,

    /// Sampling temperature (0.0–2.0). Default: service default.
    #[arg(long, env = "GAZETTE_TEMPERATURE")]
    temperature: Option<f32>,

    /// Report layout.
    #[arg(long, env = "GAZETTE_THEME", value_enum, default_value = "sunass")]
    theme: ThemeArg,

    /// Let sections follow each other instead of starting new pages.
    #[arg(long)]
    no_hard_breaks: bool,

    /// Also print the extracted analysis as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "GAZETTE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ThemeArg {
    Sunass,
    Banner,
}

impl From<ThemeArg> for ReportTheme {
    fn from(v: ThemeArg) -> Self {
        match v {
            ThemeArg::Sunass => ReportTheme::sunass(),
            ThemeArg::Banner => ReportTheme::banner(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep INFO logs out of the way while the spinner is drawing.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    match run(&cli, show_progress.then(CliProgressCallback::new)).await {
        Ok(output) => {
            if !cli.quiet {
                eprintln!(
                    "{}  {} norms, {} designated, {} concluded  →  {}",
                    green("✔"),
                    output.analysis.norms.len(),
                    output.analysis.designated_appointments.len(),
                    output.analysis.concluded_appointments.len(),
                    bold(&output.report_path.display().to_string()),
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("{} {err:#}", red("✘"));
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Category exit code of the first [`GazetteError`] in the chain, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<GazetteError>())
        .map(|e| e.category().exit_code())
        .unwrap_or(1)
}

async fn run(cli: &Cli, spinner: Option<Arc<CliProgressCallback>>) -> Result<AnalysisOutput> {
    let progress = spinner
        .clone()
        .map(|cb| cb as Arc<dyn PipelineProgressCallback>);
    let result = run_with_progress(cli, progress).await;
    // A successful run already cleared it in `on_run_complete`.
    if let (Err(_), Some(spinner)) = (&result, spinner) {
        spinner.bar.finish_and_clear();
    }
    result
}

async fn run_with_progress(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisOutput> {
    let config = build_config(cli, progress)?;

    let output = match cli.input {
        Some(ref path) => analyze_file(path, &config)
            .await
            .with_context(|| format!("Analysis of {} failed", path.display()))?,
        None => analyze_latest(&cli.input_dir, &config)
            .await
            .context("Analysis failed")?,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output.analysis)
            .context("Failed to serialise analysis")?;
        println!("{json}");
    }
    Ok(output)
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let mut service = ServiceConfig::from_env();
    if let Some(ref key) = cli.api_key {
        service.api_key = Some(key.clone());
    }
    if let Some(ref model) = cli.model {
        service.model = model.clone();
    }
    if let Some(ref base) = cli.api_base {
        service.api_base = base.clone();
    }
    service.temperature = cli.temperature;

    let mut builder = AnalyzerConfig::builder()
        .service(service)
        .output_dir(&cli.output_dir)
        .theme(cli.theme.clone().into())
        .hard_section_breaks(!cli.no_hard_breaks);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}
