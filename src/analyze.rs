//! Pipeline entry points.
//!
//! [`analyze_text`] is the core run: segment, extract, render. The other two
//! entry points only add a way of getting the text in:
//! [`analyze_file`] reads a named PDF, [`analyze_latest`] first picks the
//! newest PDF in a download directory.
//!
//! Every stage is awaited before the next starts and nothing is retried; the
//! first error ends the run and is returned unchanged.

use crate::config::AnalyzerConfig;
use crate::error::GazetteError;
use crate::model::AnalysisResult;
use crate::pipeline::extract::{CompletionService, SchemaExtractor};
use crate::pipeline::gemini::GeminiService;
use crate::pipeline::render::ReportRenderer;
use crate::pipeline::{input, segment, text};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Where the report was written.
    pub report_path: PathBuf,
    pub analysis: AnalysisResult,
    /// Page-break–separated chunks in the input text, blank ones included.
    pub total_pages: usize,
    /// Pages that survived segmentation and were sent for extraction.
    pub kept_pages: usize,
}

/// Use the injected service, or build the HTTP one from `config.service`.
///
/// Building validates the credential, so a missing key fails here before
/// any text is extracted or any request is made.
fn resolve_service(config: &AnalyzerConfig) -> Result<Arc<dyn CompletionService>, GazetteError> {
    if let Some(ref service) = config.completion_service {
        debug!("Using injected completion service: {}", service.name());
        return Ok(Arc::clone(service));
    }
    let service = GeminiService::new(&config.service)?;
    info!("Completion service: {} ({})", config.service.model, service.endpoint());
    Ok(Arc::new(service))
}

fn stage_start(config: &AnalyzerConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &AnalyzerConfig, stage: Stage, detail: &str) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, detail);
    }
}

/// Analyse already-extracted document text and write the report.
///
/// `text` holds page texts separated by form feeds. `source_label` is shown
/// in the report header as the analysed file.
///
/// # Errors
/// Configuration errors (missing credential) before anything else, then
/// extraction errors from the service, then I/O errors from writing.
pub async fn analyze_text(
    text: &str,
    source_label: &str,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, GazetteError> {
    let service = resolve_service(config)?;
    run_from_text(service, text, source_label, config).await
}

async fn run_from_text(
    service: Arc<dyn CompletionService>,
    text: &str,
    source_label: &str,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, GazetteError> {
    let start = Instant::now();

    // ── Step 1: Segment ──────────────────────────────────────────────────
    stage_start(config, Stage::Segment);
    let total_pages = text.split(segment::PAGE_BREAK).count();
    let pages = segment::segment_pages(text);
    info!("{} of {} pages have text", pages.len(), total_pages);
    stage_complete(config, Stage::Segment, &format!("{} pages", pages.len()));

    // ── Step 2: Extract ──────────────────────────────────────────────────
    stage_start(config, Stage::Extract);
    let analysis = SchemaExtractor::new(service).extract(&pages).await?;
    stage_complete(
        config,
        Stage::Extract,
        &format!(
            "{} norms, {} appointments",
            analysis.norms.len(),
            analysis.designated_appointments.len() + analysis.concluded_appointments.len()
        ),
    );

    // ── Step 3: Render ───────────────────────────────────────────────────
    stage_start(config, Stage::Render);
    let renderer = ReportRenderer::new(config.report.clone());
    let report_path = renderer.render(&analysis, source_label).await?;
    stage_complete(config, Stage::Render, &report_path.display().to_string());

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&report_path);
    }
    info!(
        "Analysis complete: {} in {}ms",
        report_path.display(),
        start.elapsed().as_millis()
    );

    Ok(AnalysisOutput {
        report_path,
        analysis,
        total_pages,
        kept_pages: pages.len(),
    })
}

/// Analyse the PDF at `path`.
///
/// The file name (not the full path) is the report's source label.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, GazetteError> {
    let service = resolve_service(config)?;
    analyze_resolved_file(service, path.as_ref(), config).await
}

/// Analyse the most recently modified PDF in `dir`.
pub async fn analyze_latest(
    dir: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, GazetteError> {
    // Fail on the credential before touching the directory.
    let service = resolve_service(config)?;
    let path = input::find_latest_pdf(dir.as_ref())?;
    analyze_resolved_file(service, &path, config).await
}

async fn analyze_resolved_file(
    service: Arc<dyn CompletionService>,
    path: &Path,
    config: &AnalyzerConfig,
) -> Result<AnalysisOutput, GazetteError> {
    let path = input::resolve_local(path)?;
    info!("Analysing {}", path.display());

    stage_start(config, Stage::ReadDocument);
    let document = text::extract_text(&path).await?;
    stage_complete(
        config,
        Stage::ReadDocument,
        &format!("{} pages", document.page_count),
    );

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    run_from_text(service, &document.text, &label, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::CompletionRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingService {
        calls: AtomicUsize,
        answer: &'static str,
    }

    #[async_trait]
    impl CompletionService for CountingService {
        fn name(&self) -> &str {
            "counting"
        }

        async fn complete(&self, _r: &CompletionRequest) -> Result<Option<String>, GazetteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.answer.to_string()))
        }
    }

    #[test]
    fn missing_credential_fails_before_anything_else() {
        let config = AnalyzerConfig::default();
        let err = resolve_service(&config).err().expect("no key configured");
        assert!(matches!(err, GazetteError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn counts_total_and_kept_pages() {
        let tmp = TempDir::new().unwrap();
        let service = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
            answer: r#"{"gazetteDate": "Martes, 21 de mayo de 2024"}"#,
        });
        let config = AnalyzerConfig::builder()
            .output_dir(tmp.path())
            .completion_service(service.clone())
            .build()
            .unwrap();

        let out = analyze_text(" \u{000C}\u{000C}contenido", "g.pdf", &config)
            .await
            .unwrap();
        assert_eq!(out.total_pages, 3);
        assert_eq!(out.kept_pages, 1);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert!(out
            .report_path
            .ends_with("analisis-el-peruano-martes-21-de-mayo-de-2024.pdf"));
    }

    #[tokio::test]
    async fn latest_in_missing_dir_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let config = AnalyzerConfig::builder()
            .completion_service(Arc::new(CountingService {
                calls: AtomicUsize::new(0),
                answer: "{}",
            }))
            .build()
            .unwrap();
        let err = analyze_latest(tmp.path().join("downloads"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, GazetteError::InputDirMissing { .. }));
    }

    #[tokio::test]
    async fn latest_checks_credential_before_directory() {
        let tmp = TempDir::new().unwrap();
        let config = AnalyzerConfig::builder()
            .output_dir(tmp.path())
            .build()
            .unwrap();
        let err = analyze_latest(tmp.path().join("downloads"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, GazetteError::MissingCredential { .. }));
    }
}
