//! Configuration for the text-extraction pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! [`PipelineConfigBuilder`]. The builder records what the caller asked for;
//! [`PipelineConfigBuilder::build`] validates it and is the only place a
//! `ConfigError` can come from at construction time.

use crate::error::PdfTextError;
use crate::observer::{NoopObserver, SharedObserver};
use encoding_rs::Encoding;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default chunk length, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 8000;

/// Default download timeout, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Default cap on the remote body excerpt carried by HTTP errors, in characters.
pub const DEFAULT_ERROR_EXCERPT_CHARS: usize = 500;

/// Configuration for one [`crate::Pipeline`].
///
/// # Example
/// ```rust
/// use edgequake_pdftext::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .chunk_size(4000)
///     .download_timeout_secs(10)
///     .encoding("windows-1252")
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 4000);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Maximum chunk length in characters. Must be ≥ 1. Default: 8000.
    pub chunk_size: usize,

    /// Timeout for the whole download (connect + body), in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Maximum length of the remote body excerpt attached to HTTP errors,
    /// in characters. Default: 500.
    pub error_excerpt_chars: usize,

    /// Target encoding of the normalised text. Characters it cannot
    /// represent are dropped. Default: UTF-8.
    pub encoding: &'static Encoding,

    /// User password for encrypted PDFs.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library. If None, the system
    /// library is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// `User-Agent` header sent with downloads.
    pub user_agent: String,

    /// Receives stage events. Default: [`NoopObserver`].
    pub observer: SharedObserver,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            error_excerpt_chars: DEFAULT_ERROR_EXCERPT_CHARS,
            encoding: encoding_rs::UTF_8,
            password: None,
            pdfium_library_path: None,
            user_agent: concat!("edgequake-pdftext/", env!("CARGO_PKG_VERSION")).to_string(),
            observer: Arc::new(NoopObserver),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("chunk_size", &self.chunk_size)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("error_excerpt_chars", &self.error_excerpt_chars)
            .field("encoding", &self.encoding.name())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("user_agent", &self.user_agent)
            .field("observer", &"<dyn PipelineObserver>")
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
            encoding_label: None,
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
    encoding_label: Option<String>,
}

impl PipelineConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn error_excerpt_chars(mut self, n: usize) -> Self {
        self.config.error_excerpt_chars = n;
        self
    }

    /// Target encoding by WHATWG label (`"utf-8"`, `"latin1"`, `"shift_jis"`, …).
    /// Unknown labels are reported by [`Self::build`].
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding_label = Some(label.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.config.observer = observer;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<PipelineConfig, PdfTextError> {
        if let Some(label) = self.encoding_label.take() {
            self.config.encoding = Encoding::for_label_no_replacement(label.trim().as_bytes())
                .ok_or_else(|| {
                    PdfTextError::InvalidConfig(format!("Unknown text encoding '{label}'"))
                })?;
        }

        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(PdfTextError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(PdfTextError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults() {
        let c = PipelineConfig::builder().build().unwrap();
        assert_eq!(c.chunk_size, 8000);
        assert_eq!(c.download_timeout_secs, 30);
        assert_eq!(c.error_excerpt_chars, 500);
        assert_eq!(c.encoding, encoding_rs::UTF_8);
        assert!(c.password.is_none());
        assert!(c.user_agent.starts_with("edgequake-pdftext/"));
    }

    #[test]
    fn zero_chunk_size_is_config_error() {
        let err = PipelineConfig::builder().chunk_size(0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn zero_timeout_is_config_error() {
        let err = PipelineConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn encoding_labels_resolve() {
        let c = PipelineConfig::builder().encoding("latin1").build().unwrap();
        assert_eq!(c.encoding, encoding_rs::WINDOWS_1252);

        let err = PipelineConfig::builder()
            .encoding("klingon-8")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("klingon-8"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = PipelineConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
