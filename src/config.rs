//! Configuration types for a gazette analysis run.
//!
//! Three groups of settings, one struct each:
//!
//! * [`ServiceConfig`]: where and how to reach the completion service. It is
//!   validated at the start of a run, before any network call, and then
//!   handed to the service by reference.
//! * [`ReportConfig`]: where the report goes and how it looks.
//! * [`AnalyzerConfig`]: both of the above plus injectable collaborators
//!   (a pre-built completion service, a progress callback). Built via
//!   [`AnalyzerConfig::builder()`].

use crate::error::GazetteError;
use crate::pipeline::extract::CompletionService;
use crate::pipeline::layout::ReportTheme;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_ENV: &str = "GAZETTE_MODEL";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "GAZETTE_API_BASE";

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_INPUT_DIR: &str = "downloads";
pub const DEFAULT_FILE_PREFIX: &str = "analisis-el-peruano";

/// Connection settings for the remote structured-completion service.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Access credential. `None` or blank fails the run before any request.
    pub api_key: Option<String>,

    /// Base URL up to and including the API version segment.
    pub api_base: String,

    /// Model identifier, e.g. `gemini-2.5-pro`.
    pub model: String,

    /// Sampling temperature. Default: none (service default).
    pub temperature: Option<f32>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ServiceConfig {
    /// Read the credential and optional overrides from the environment.
    ///
    /// Does not fail: a missing key surfaces from [`ServiceConfig::validate`].
    pub fn from_env() -> Self {
        let non_empty = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        let mut config = Self {
            api_key: non_empty(API_KEY_ENV),
            ..Self::default()
        };
        if let Some(model) = non_empty(MODEL_ENV) {
            config.model = model;
        }
        if let Some(base) = non_empty(API_BASE_ENV) {
            config.api_base = base;
        }
        config
    }

    /// Check the settings and return the usable credential.
    pub fn validate(&self) -> Result<&str, GazetteError> {
        let key = match self.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => k,
            _ => {
                return Err(GazetteError::MissingCredential {
                    var: API_KEY_ENV.to_string(),
                })
            }
        };
        if self.model.trim().is_empty() {
            return Err(GazetteError::InvalidConfig("model name is empty".into()));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(GazetteError::InvalidConfig(format!(
                "API base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(GazetteError::InvalidConfig(format!(
                    "temperature must be 0.0–2.0, got {t}"
                )));
            }
        }
        Ok(key)
    }
}

/// Where the report is written and how it is laid out.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Directory receiving the report; created when absent. Default: `reports`.
    pub output_dir: PathBuf,

    /// File name prefix before the sanitised date. Default: `analisis-el-peruano`.
    pub file_prefix: String,

    /// Section order, palette, titles and break policy.
    pub theme: ReportTheme,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            theme: ReportTheme::default(),
        }
    }
}

/// Configuration for one pipeline run.
#[derive(Clone, Default)]
pub struct AnalyzerConfig {
    pub service: ServiceConfig,

    pub report: ReportConfig,

    /// Pre-constructed completion service. Takes precedence over `service`,
    /// which is then not validated.
    pub completion_service: Option<Arc<dyn CompletionService>>,

    /// Optional stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("service", &self.service)
            .field("report", &self.report)
            .field(
                "completion_service",
                &self
                    .completion_service
                    .as_ref()
                    .map(|_| "<dyn CompletionService>"),
            )
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.config.service = service;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.service.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.service.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.service.api_base = base.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.service.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.report.output_dir = dir.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.report.file_prefix = prefix.into();
        self
    }

    pub fn theme(mut self, theme: ReportTheme) -> Self {
        self.config.report.theme = theme;
        self
    }

    pub fn hard_section_breaks(mut self, v: bool) -> Self {
        self.config.report.theme.hard_section_breaks = v;
        self
    }

    pub fn completion_service(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.config.completion_service = Some(service);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints that do not depend on
    /// the environment. The credential is checked when the run starts.
    pub fn build(self) -> Result<AnalyzerConfig, GazetteError> {
        let c = &self.config;
        if c.report.file_prefix.trim().is_empty() {
            return Err(GazetteError::InvalidConfig(
                "report file prefix is empty".into(),
            ));
        }
        if c.report.file_prefix.contains(['/', '\\']) {
            return Err(GazetteError::InvalidConfig(format!(
                "report file prefix must not contain path separators, got '{}'",
                c.report.file_prefix
            )));
        }
        if c.report.output_dir.as_os_str().is_empty() {
            return Err(GazetteError::InvalidConfig(
                "report output directory is empty".into(),
            ));
        }
        Ok(self.config)
    }
}
