//! Model loading off the frame loop: byte transport plus a background
//! worker that runs ingestion and texture decoding.

/// Chunked file/HTTP byte transport.
pub mod transport;
/// Background load thread with last-load-wins ids.
pub mod worker;

pub use transport::ModelSource;
pub use worker::{LoadEvent, LoadId, LoadRequest, LoadWorker};
