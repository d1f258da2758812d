//! Report rendering: lay out an [`AnalysisResult`] as PDF and write it to disk.
//!
//! The file name is derived from the gazette date, so one report per gazette
//! day lands in the output directory and a rerun for the same day replaces
//! it. Writes are atomic (temp file + rename) to prevent partial files.

use crate::config::ReportConfig;
use crate::error::GazetteError;
use crate::model::AnalysisResult;
use crate::pipeline::layout::layout_report;
use crate::pipeline::pdf::PdfSurface;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-name segment used when the gazette date is unknown.
pub const UNDATED_SEGMENT: &str = "sin-fecha";

static RE_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_À-ÿ]+").expect("static regex is valid"));
static RE_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("static regex is valid"));

/// Turn a free-text gazette date into a file-name-safe segment.
///
/// Runs of anything other than ASCII letters, digits, `_` or Latin-1 letters
/// become a single `-`; the result is trimmed of `-` and lowercased. An empty
/// result becomes [`UNDATED_SEGMENT`].
pub fn date_segment(gazette_date: &str) -> String {
    let replaced = RE_UNSAFE.replace_all(gazette_date, "-");
    let collapsed = RE_DASHES.replace_all(&replaced, "-");
    let segment = collapsed.trim_matches('-').to_lowercase();
    if segment.is_empty() {
        UNDATED_SEGMENT.to_string()
    } else {
        segment
    }
}

/// `{prefix}-{date segment}.pdf` for `analysis`.
pub fn report_file_name(prefix: &str, analysis: &AnalysisResult) -> String {
    let segment = if analysis.has_fallback_date() {
        UNDATED_SEGMENT.to_string()
    } else {
        date_segment(&analysis.gazette_date)
    };
    format!("{prefix}-{segment}.pdf")
}

/// Writes report PDFs according to a [`ReportConfig`].
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Where the report for `analysis` will be written.
    pub fn target_path(&self, analysis: &AnalysisResult) -> PathBuf {
        self.config
            .output_dir
            .join(report_file_name(&self.config.file_prefix, analysis))
    }

    /// Lay out the report in memory and return the PDF bytes and page count.
    pub fn render_bytes(
        &self,
        analysis: &AnalysisResult,
        source_label: &str,
    ) -> Result<(Vec<u8>, usize), GazetteError> {
        let theme = &self.config.theme;
        let mut surface = PdfSurface::new(theme.page_size);
        let pages = layout_report(&mut surface, analysis, source_label, theme);
        let title = format!("{} - {}", theme.brand, analysis.gazette_date);
        let bytes = surface.finish(&title)?;
        debug!("Report encoded: {} pages, {} bytes", pages, bytes.len());
        Ok((bytes, pages))
    }

    /// Render `analysis` and write it under the output directory, creating
    /// the directory when absent. Returns the report path.
    pub async fn render(
        &self,
        analysis: &AnalysisResult,
        source_label: &str,
    ) -> Result<PathBuf, GazetteError> {
        let path = self.target_path(analysis);
        let (bytes, pages) = self.render_bytes(analysis, source_label)?;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| GazetteError::OutputWriteFailed {
                path: self.config.output_dir.clone(),
                source: e,
            })?;

        write_atomic(&path, &bytes).await?;
        info!("Report written: {} ({} pages)", path.display(), pages);
        Ok(path)
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), GazetteError> {
    let tmp_path = path.with_extension("pdf.tmp");
    let write_failed = |source| GazetteError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let result = match tokio::fs::write(&tmp_path, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
        }
        return Err(write_failed(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GAZETTE_DATE_FALLBACK;
    use tempfile::TempDir;

    fn dated(date: &str) -> AnalysisResult {
        AnalysisResult {
            gazette_date: date.into(),
            ..AnalysisResult::empty()
        }
    }

    #[test]
    fn spanish_long_date_becomes_slug() {
        assert_eq!(
            date_segment("Lunes, 20 de mayo de 2024"),
            "lunes-20-de-mayo-de-2024"
        );
    }

    #[test]
    fn latin1_letters_survive() {
        assert_eq!(
            date_segment("Miércoles 5 de Junio"),
            "miércoles-5-de-junio"
        );
    }

    #[test]
    fn separators_only_becomes_undated() {
        assert_eq!(date_segment(" / -- , "), UNDATED_SEGMENT);
        assert_eq!(date_segment(""), UNDATED_SEGMENT);
    }

    #[test]
    fn segment_has_no_edge_or_double_dashes() {
        for input in ["--Martes--21--", "¡Hoy! 1/2/2024", "a  b\tc"] {
            let s = date_segment(input);
            assert!(!s.starts_with('-') && !s.ends_with('-'), "{s}");
            assert!(!s.contains("--"), "{s}");
            assert_eq!(s, s.to_lowercase());
        }
    }

    #[test]
    fn fallback_date_is_undated_file() {
        let name = report_file_name("analisis-el-peruano", &dated(GAZETTE_DATE_FALLBACK));
        assert_eq!(name, "analisis-el-peruano-sin-fecha.pdf");
    }

    #[test]
    fn file_name_uses_prefix_and_segment() {
        let name = report_file_name("informe", &dated("20/05/2024"));
        assert_eq!(name, "informe-20-05-2024.pdf");
    }

    #[tokio::test]
    async fn render_creates_directory_and_replaces_existing() {
        let tmp = TempDir::new().unwrap();
        let config = ReportConfig {
            output_dir: tmp.path().join("reports").join("nested"),
            ..ReportConfig::default()
        };
        let renderer = ReportRenderer::new(config);
        let analysis = dated("Lunes, 20 de mayo de 2024");

        let first = renderer.render(&analysis, "a.pdf").await.unwrap();
        assert!(first.ends_with("analisis-el-peruano-lunes-20-de-mayo-de-2024.pdf"));
        let second = renderer.render(&analysis, "a.pdf").await.unwrap();
        assert_eq!(first, second);

        let entries: Vec<_> = std::fs::read_dir(first.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1, "no temp file left behind: {entries:?}");
        let bytes = std::fs::read(&first).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn write_into_a_file_path_fails_as_io() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("reports");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let renderer = ReportRenderer::new(ReportConfig {
            output_dir: blocker,
            ..ReportConfig::default()
        });
        let err = renderer
            .render(&AnalysisResult::empty(), "x.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, GazetteError::OutputWriteFailed { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Io);
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let renderer = ReportRenderer::new(ReportConfig {
            output_dir: tmp.path().to_path_buf(),
            ..ReportConfig::default()
        });
        let analysis = dated("Lunes, 20 de mayo de 2024");
        // A non-empty directory under the final name cannot be replaced.
        let target = renderer.target_path(&analysis);
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"x").unwrap();

        let err = renderer.render(&analysis, "x.pdf").await.unwrap_err();

        assert!(matches!(err, GazetteError::OutputWriteFailed { ref path, .. } if *path == target));
        assert!(!target.with_extension("pdf.tmp").exists());
        assert!(target.join("keep.txt").is_file());
    }
}
