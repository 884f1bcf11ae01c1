//! Input resolution: turn a path, URL or uploaded bytes into HTML text.
//!
//! Every source ends up in [`decode_html`], which pins the behaviour for
//! degenerate inputs:
//!
//! | Input | Result |
//! |-------|--------|
//! | zero bytes or whitespace only | [`Html2PdfError::EmptyInput`] |
//! | invalid UTF-8 | [`Html2PdfError::NotUtf8`] |
//! | NUL or other C0 control bytes | [`Html2PdfError::MalformedMarkup`] |
//! | anything else | accepted; the HTML parser repairs structure later |
//!
//! A UTF-8 byte-order mark is stripped.

use crate::error::Html2PdfError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decoded HTML together with the name it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Display name: file name, URL or upload name.
    pub name: String,
    /// Name without directory or extension, used for the output file name.
    pub stem: String,
    /// The decoded markup.
    pub html: String,
}

impl SourceDocument {
    /// Decode uploaded bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, Html2PdfError> {
        let name = name.into();
        let html = decode_html(&name, bytes)?;
        Ok(Self {
            stem: file_stem(&name),
            name,
            html,
        })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to decoded HTML.
///
/// If the input is a URL, download it; otherwise read the local file.
pub async fn resolve_input(
    input: &str,
    timeout_secs: u64,
) -> Result<SourceDocument, Html2PdfError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Read a local file, mapping I/O failures to the file error variants.
async fn read_local(path: &Path) -> Result<SourceDocument, Html2PdfError> {
    if path.as_os_str().is_empty() {
        return Err(Html2PdfError::InvalidInput {
            input: String::new(),
            reason: "no input file given".into(),
        });
    }
    if path.is_dir() {
        return Err(Html2PdfError::InvalidInput {
            input: path.display().to_string(),
            reason: "is a directory, not an HTML file".into(),
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Html2PdfError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Html2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Html2PdfError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    SourceDocument::from_bytes(name, &bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, Html2PdfError> {
    info!("Downloading HTML from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Html2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Html2PdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Html2PdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Html2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Html2PdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());

    let html = decode_html(url, &bytes)?;
    Ok(SourceDocument {
        name: url.to_string(),
        stem: url_stem(url),
        html,
    })
}

/// Decode and validate raw input bytes. See the module docs for the rules.
pub fn decode_html(name: &str, bytes: &[u8]) -> Result<String, Html2PdfError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let text = std::str::from_utf8(bytes).map_err(|e| Html2PdfError::NotUtf8 {
        name: name.to_string(),
        offset: e.valid_up_to(),
    })?;

    if text.trim().is_empty() {
        return Err(Html2PdfError::EmptyInput {
            name: name.to_string(),
        });
    }

    if let Some((offset, ch)) = text
        .char_indices()
        .find(|(_, c)| c.is_control() && (*c as u32) < 0x20 && !c.is_ascii_whitespace())
    {
        return Err(Html2PdfError::MalformedMarkup {
            name: name.to_string(),
            detail: format!(
                "control character U+{:04X} at offset {offset}; looks like binary data",
                ch as u32
            ),
        });
    }

    Ok(text.to_string())
}

/// File name without directory or extension; `document` when nothing is left.
pub fn file_stem(name: &str) -> String {
    let stem = PathBuf::from(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.trim().is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

/// Stem from the last URL path segment, e.g. `https://x.org/a/report.html` → `report`.
fn url_stem(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return file_stem(last);
                }
            }
        }
        if let Some(host) = parsed.host_str() {
            return host.replace('.', "_");
        }
    }
    "document".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/page.html"));
        assert!(is_url("http://example.com/page.html"));
        assert!(!is_url("/tmp/page.html"));
        assert!(!is_url("page.html"));
        assert!(!is_url(""));
    }

    #[test]
    fn empty_bytes_are_invalid_input() {
        let err = decode_html("empty.html", b"").unwrap_err();
        assert!(matches!(err, Html2PdfError::EmptyInput { .. }));
    }

    #[test]
    fn whitespace_only_is_invalid_input() {
        let err = decode_html("blank.html", b" \n\t\r\n ").unwrap_err();
        assert!(matches!(err, Html2PdfError::EmptyInput { .. }));
    }

    #[test]
    fn bom_only_is_empty() {
        let err = decode_html("bom.html", b"\xEF\xBB\xBF").unwrap_err();
        assert!(matches!(err, Html2PdfError::EmptyInput { .. }));
    }

    #[test]
    fn bom_is_stripped() {
        let html = decode_html("bom.html", b"\xEF\xBB\xBF<p>Hi</p>").unwrap();
        assert_eq!(html, "<p>Hi</p>");
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let err = decode_html("latin1.html", b"<p>caf\xE9</p>").unwrap_err();
        match err {
            Html2PdfError::NotUtf8 { offset, .. } => assert_eq!(offset, 6),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nul_bytes_are_malformed_markup() {
        let err = decode_html("blob.bin", b"<p>\0\0\x01</p>").unwrap_err();
        assert!(matches!(err, Html2PdfError::MalformedMarkup { .. }));
    }

    #[test]
    fn tabs_and_newlines_are_fine() {
        assert!(decode_html("ok.html", b"<p>\ta\r\nb</p>").is_ok());
    }

    #[test]
    fn stems() {
        assert_eq!(file_stem("report.html"), "report");
        assert_eq!(file_stem("/tmp/dir/notes.htm"), "notes");
        assert_eq!(file_stem("archive.tar.html"), "archive.tar");
        assert_eq!(file_stem(""), "document");
        assert_eq!(url_stem("https://example.org/docs/guide.html"), "guide");
        assert_eq!(url_stem("https://example.org/"), "example_org");
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let err = resolve_input("/definitely/not/here.html", 5).await.unwrap_err();
        assert!(matches!(err, Html2PdfError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.html");
        std::fs::write(&path, "<h1>Hello</h1>").unwrap();

        let doc = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.name, "hello.html");
        assert_eq!(doc.stem, "hello");
        assert_eq!(doc.html, "<h1>Hello</h1>");
    }

    #[tokio::test]
    async fn directory_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::InvalidInput { .. }));
    }
}
