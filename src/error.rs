//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the scanview crate.
#[derive(Debug)]
pub enum ViewerError {
    /// Model bytes could not be fetched (filesystem or network).
    Transport(TransportError),
    /// The mesh text contained a malformed record.
    Parse(ParseError),
    /// A texture image could not be read or decoded.
    Texture(String),
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Texture(msg) => write!(f, "texture error: {msg}"),
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Gpu(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for ViewerError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TransportError> for ViewerError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ParseError> for ViewerError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

/// Failure while fetching model bytes.
#[derive(Debug)]
pub enum TransportError {
    /// Local file could not be opened or read.
    File {
        /// Path that was being read.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Remote fetch failed.
    Http {
        /// URL that was being fetched.
        url: String,
        /// Human-readable failure reason.
        message: String,
    },
    /// Bytes arrived but are not valid UTF-8 text.
    Encoding(std::str::Utf8Error),
    /// The load was superseded by a newer request before it finished.
    Cancelled,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, source } => {
                write!(f, "failed to read {path}: {source}")
            }
            Self::Http { url, message } => {
                write!(f, "failed to fetch {url}: {message}")
            }
            Self::Encoding(e) => write!(f, "model is not UTF-8 text: {e}"),
            Self::Cancelled => write!(f, "load cancelled"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::File { source, .. } => Some(source),
            Self::Encoding(e) => Some(e),
            Self::Http { .. } | Self::Cancelled => None,
        }
    }
}

/// What was wrong with a mesh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A numeric field could not be parsed as a float.
    InvalidFloat(String),
    /// A face index could not be parsed as an integer.
    InvalidIndex(String),
    /// A record had fewer components than required.
    MissingComponent {
        /// Record keyword (`v`, `vn`, `vt`, `f`).
        record: &'static str,
        /// Minimum number of components for that record.
        expected: usize,
        /// Number actually present.
        found: usize,
    },
}

/// A malformed record at a specific source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number in the source text.
    pub line: usize,
    /// Kind of failure.
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::InvalidFloat(token) => {
                write!(f, "line {}: invalid number {token:?}", self.line)
            }
            ParseErrorKind::InvalidIndex(token) => {
                write!(f, "line {}: invalid face index {token:?}", self.line)
            }
            ParseErrorKind::MissingComponent {
                record,
                expected,
                found,
            } => write!(
                f,
                "line {}: `{record}` needs {expected} components, found \
                 {found}",
                self.line
            ),
        }
    }
}

impl std::error::Error for ParseError {}
