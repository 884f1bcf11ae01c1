//! Configuration types for HTML-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The formatting itself is not
//! configurable: every document is normalised to the same rule set (see
//! [`crate::pipeline::rules`]) and laid out on the same [`PageProfile`].
//! What remains configurable is how the result is named and reported.
//!
//! A [`Settings`] file lets the CLI pick up defaults from TOML so a
//! deployment does not have to repeat flags on every invocation.

use crate::error::Html2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for an HTML-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use html2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .add_timestamp(false)
///     .title("Quarterly report")
///     .build()
///     .unwrap();
/// assert!(!config.add_timestamp);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Append `_YYYYmmdd_HHMMSS` to the suggested output file name. Default: true.
    ///
    /// The timestamp only affects the name, never the PDF bytes.
    pub add_timestamp: bool,

    /// Report conversion details (sizes, ratio, stage timings). Default: true.
    ///
    /// Purely a presentation hint for front ends; it has no effect on the
    /// produced document.
    pub show_details: bool,

    /// Document title written into the PDF. If None, the `<title>` of the
    /// input is used, then the input's file stem.
    pub title: Option<String>,

    /// Embed fonts into the PDF. Default: true.
    pub font_embedding: bool,

    /// Page geometry. Default: [`PageProfile::LETTER`].
    pub page: PageProfile,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional observer for stage progress.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            add_timestamp: true,
            show_details: true,
            title: None,
            font_embedding: true,
            page: PageProfile::LETTER,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("add_timestamp", &self.add_timestamp)
            .field("show_details", &self.show_details)
            .field("title", &self.title)
            .field("font_embedding", &self.font_embedding)
            .field("page", &self.page)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn add_timestamp(mut self, v: bool) -> Self {
        self.config.add_timestamp = v;
        self
    }

    pub fn show_details(mut self, v: bool) -> Self {
        self.config.show_details = v;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn font_embedding(mut self, v: bool) -> Self {
        self.config.font_embedding = v;
        self
    }

    pub fn page(mut self, page: PageProfile) -> Self {
        self.config.page = page;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Apply the values present in a settings file. Unset keys keep the
    /// builder's current value.
    pub fn settings(mut self, settings: &ConversionSettings) -> Self {
        if let Some(v) = settings.add_timestamp {
            self.config.add_timestamp = v;
        }
        if let Some(v) = settings.show_details {
            self.config.show_details = v;
        }
        if let Some(ref t) = settings.title {
            self.config.title = Some(t.clone());
        }
        if let Some(v) = settings.font_embedding {
            self.config.font_embedding = v;
        }
        if let Some(v) = settings.download_timeout_secs {
            self.config.download_timeout_secs = v;
        }
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Html2PdfError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(Html2PdfError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref t) = c.title {
            if t.trim().is_empty() {
                return Err(Html2PdfError::InvalidConfig(
                    "Title must not be blank".into(),
                ));
            }
        }
        c.page.validate()?;
        Ok(self.config)
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Physical page size and margin handed to the renderer, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageProfile {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageProfile {
    /// US Letter (8.5 × 11 in) with a 1 cm margin.
    pub const LETTER: PageProfile = PageProfile {
        width_mm: 215.9,
        height_mm: 279.4,
        margin_mm: 10.0,
    };

    fn validate(&self) -> Result<(), Html2PdfError> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(Html2PdfError::InvalidConfig(format!(
                "Page size must be positive, got {}×{} mm",
                self.width_mm, self.height_mm
            )));
        }
        if self.margin_mm < 0.0
            || self.margin_mm * 2.0 >= self.width_mm.min(self.height_mm)
        {
            return Err(Html2PdfError::InvalidConfig(format!(
                "Margin {} mm leaves no printable area",
                self.margin_mm
            )));
        }
        Ok(())
    }

    /// Margin as a CSS length.
    pub fn css_margin(&self) -> String {
        if self.margin_mm % 10.0 == 0.0 {
            format!("{}cm", self.margin_mm / 10.0)
        } else {
            format!("{}mm", self.margin_mm)
        }
    }
}

impl Default for PageProfile {
    fn default() -> Self {
        Self::LETTER
    }
}

// ── Settings file ────────────────────────────────────────────────────────

/// Declarative settings loaded from a TOML file.
///
/// ```toml
/// [conversion]
/// add_timestamp = false
/// show_details = true
/// output_dir = "out"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub conversion: ConversionSettings,
}

/// The `[conversion]` table of a [`Settings`] file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionSettings {
    pub add_timestamp: Option<bool>,
    pub show_details: Option<bool>,
    pub title: Option<String>,
    pub font_embedding: Option<bool>,
    pub download_timeout_secs: Option<u64>,
    /// Directory for derived output file names (CLI only).
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, Html2PdfError> {
        toml::from_str(text).map_err(|e| Html2PdfError::InvalidConfig(e.to_string()))
    }

    /// Read and parse a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Html2PdfError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Html2PdfError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Html2PdfError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_form() {
        let c = ConversionConfig::default();
        assert!(c.add_timestamp);
        assert!(c.show_details);
        assert!(c.font_embedding);
        assert_eq!(c.page, PageProfile::LETTER);
        assert_eq!(c.download_timeout_secs, 120);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = ConversionConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_blank_title() {
        assert!(ConversionConfig::builder().title("   ").build().is_err());
    }

    #[test]
    fn builder_rejects_oversized_margin() {
        let page = PageProfile {
            width_mm: 100.0,
            height_mm: 100.0,
            margin_mm: 50.0,
        };
        assert!(ConversionConfig::builder().page(page).build().is_err());
    }

    #[test]
    fn letter_margin_is_one_centimetre() {
        assert_eq!(PageProfile::LETTER.css_margin(), "1cm");
        let page = PageProfile {
            margin_mm: 12.5,
            ..PageProfile::LETTER
        };
        assert_eq!(page.css_margin(), "12.5mm");
    }

    #[test]
    fn settings_parse_and_apply() {
        let settings = Settings::from_toml(
            r#"
            [conversion]
            add_timestamp = false
            title = "Minutes"
            download_timeout_secs = 30
            output_dir = "pdfs"
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.conversion.output_dir.as_deref(),
            Some(Path::new("pdfs"))
        );

        let c = ConversionConfig::builder()
            .settings(&settings.conversion)
            .build()
            .unwrap();
        assert!(!c.add_timestamp);
        assert!(c.show_details, "unset keys keep their default");
        assert_eq!(c.title.as_deref(), Some("Minutes"));
        assert_eq!(c.download_timeout_secs, 30);
    }

    #[test]
    fn settings_reject_unknown_keys() {
        let err = Settings::from_toml("[conversion]\nport = 8501\n").unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn empty_settings_file_is_valid() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }
}
