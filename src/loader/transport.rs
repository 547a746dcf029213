//! Chunked byte transport for model files.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::TransportError;
use crate::mesh::LoadObserver;

/// Bytes read between progress callbacks and cancellation checks.
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Where a model's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Local file.
    File(PathBuf),
    /// `http://` or `https://` URL.
    Url(String),
}

impl ModelSource {
    /// Interpret a command-line argument: URLs by scheme, everything else
    /// as a path.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(input.to_owned())
        } else {
            Self::File(PathBuf::from(input))
        }
    }

    /// Local path, if this is a file source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Url(_) => None,
        }
    }

    /// Short name for titles and logs.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::File(path) => path.file_name().map_or_else(
                || path.display().to_string(),
                |name| name.to_string_lossy().into_owned(),
            ),
            Self::Url(url) => url
                .rsplit('/')
                .find(|s| !s.is_empty())
                .unwrap_or(url)
                .to_owned(),
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Fetch every byte of `source`.
///
/// `observer.on_progress` fires after each chunk. `cancel` is polled
/// between chunks; once set the fetch stops with
/// [`TransportError::Cancelled`].
///
/// # Errors
///
/// Returns [`TransportError::File`] / [`TransportError::Http`] on I/O
/// failure and [`TransportError::Cancelled`] when cancelled.
pub fn fetch(
    source: &ModelSource,
    cancel: &AtomicBool,
    observer: &mut dyn LoadObserver,
) -> Result<Vec<u8>, TransportError> {
    match source {
        ModelSource::File(path) => fetch_file(path, cancel, observer),
        ModelSource::Url(url) => fetch_url(url, cancel, observer),
    }
}

/// Fetch `source` and require UTF-8 text.
///
/// # Errors
///
/// As [`fetch`], plus [`TransportError::Encoding`] for non-UTF-8 bytes.
pub fn fetch_text(
    source: &ModelSource,
    cancel: &AtomicBool,
    observer: &mut dyn LoadObserver,
) -> Result<String, TransportError> {
    let bytes = fetch(source, cancel, observer)?;
    String::from_utf8(bytes)
        .map_err(|e| TransportError::Encoding(e.utf8_error()))
}

fn fetch_file(
    path: &Path,
    cancel: &AtomicBool,
    observer: &mut dyn LoadObserver,
) -> Result<Vec<u8>, TransportError> {
    let file_error = |source| TransportError::File {
        path: path.display().to_string(),
        source,
    };
    let file = std::fs::File::open(path).map_err(file_error)?;
    let total = file.metadata().map_or(0, |m| m.len());
    read_chunked(file, total, cancel, observer).map_err(|e| match e {
        ChunkError::Io(source) => file_error(source),
        ChunkError::Cancelled => TransportError::Cancelled,
    })
}

#[cfg(feature = "http")]
fn fetch_url(
    url: &str,
    cancel: &AtomicBool,
    observer: &mut dyn LoadObserver,
) -> Result<Vec<u8>, TransportError> {
    let http_error = |message: String| TransportError::Http {
        url: url.to_owned(),
        message,
    };
    let response =
        ureq::get(url).call().map_err(|e| http_error(e.to_string()))?;
    let body = response.into_body();
    let total = body.content_length().unwrap_or(0);
    read_chunked(body.into_reader(), total, cancel, observer).map_err(|e| {
        match e {
            ChunkError::Io(source) => http_error(source.to_string()),
            ChunkError::Cancelled => TransportError::Cancelled,
        }
    })
}

#[cfg(not(feature = "http"))]
fn fetch_url(
    url: &str,
    _cancel: &AtomicBool,
    _observer: &mut dyn LoadObserver,
) -> Result<Vec<u8>, TransportError> {
    Err(TransportError::Http {
        url: url.to_owned(),
        message: "built without the `http` feature".into(),
    })
}

enum ChunkError {
    Io(std::io::Error),
    Cancelled,
}

fn read_chunked(
    mut reader: impl Read,
    total: u64,
    cancel: &AtomicBool,
    observer: &mut dyn LoadObserver,
) -> Result<Vec<u8>, ChunkError> {
    let mut bytes = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(ChunkError::Cancelled);
        }
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChunkError::Io(e)),
        };
        bytes.extend_from_slice(&chunk[..n]);
        let loaded = bytes.len() as u64;
        let percent = if total > 0 {
            (loaded as f32 / total as f32 * 100.0).min(100.0)
        } else {
            0.0
        };
        observer.on_progress(percent, loaded, total);
    }
    Ok(bytes)
}
