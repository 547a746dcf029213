//! Background load worker.
//!
//! One thread runs transport, ingestion and texture decoding for each
//! request and reports back over a channel, so the frame loop only ever
//! sees progress messages and finished models. Every request carries a
//! [`LoadId`]; submitting a new request cancels the one in flight.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use super::transport::{fetch_text, ModelSource};
use crate::error::{TransportError, ViewerError};
use crate::mesh::{IngestJob, IngestStatus, LoadObserver, RenderableMesh};
use crate::options::IngestOptions;
use crate::texture::{self, TextureImage};

/// Monotonically increasing load request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadId(pub u64);

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to load.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Model bytes.
    pub source: ModelSource,
    /// Explicit texture; when `None` and auto-texture is on, one is looked
    /// for next to a local model.
    pub texture: Option<PathBuf>,
    /// Ingestion settings for this load.
    pub options: IngestOptions,
}

/// Worker output. For each id, progress events come first and exactly one
/// of `Loaded` / `Failed` comes last.
#[derive(Debug)]
pub enum LoadEvent {
    /// Byte transfer progress.
    Progress {
        /// Request this belongs to.
        id: LoadId,
        /// 0–100, or 0 when the size is unknown.
        percent: f32,
        /// Bytes received so far.
        loaded: u64,
        /// Expected total, 0 if unknown.
        total: u64,
    },
    /// Parse/build phase message.
    ParseProgress {
        /// Request this belongs to.
        id: LoadId,
        /// Human-readable message.
        message: String,
    },
    /// The model is ready.
    Loaded {
        /// Request this belongs to.
        id: LoadId,
        /// Ingested mesh.
        mesh: Box<RenderableMesh>,
        /// Decoded texture, if one was given or found.
        texture: Option<TextureImage>,
        /// Where the texture came from.
        texture_path: Option<PathBuf>,
    },
    /// The load failed or was superseded.
    Failed {
        /// Request this belongs to.
        id: LoadId,
        /// Why.
        error: ViewerError,
    },
}

impl LoadEvent {
    /// Id of the request this event belongs to.
    #[must_use]
    pub fn id(&self) -> LoadId {
        match self {
            Self::Progress { id, .. }
            | Self::ParseProgress { id, .. }
            | Self::Loaded { id, .. }
            | Self::Failed { id, .. } => *id,
        }
    }

    /// Whether this is the last event for its id.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Failed { .. })
    }
}

enum WorkerRequest {
    Load {
        id: LoadId,
        request: LoadRequest,
        cancel: Arc<AtomicBool>,
    },
    Shutdown,
}

/// Background thread that turns [`LoadRequest`]s into [`LoadEvent`]s.
pub struct LoadWorker {
    request_tx: mpsc::Sender<WorkerRequest>,
    event_rx: mpsc::Receiver<LoadEvent>,
    in_flight: Option<Arc<AtomicBool>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl LoadWorker {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ThreadSpawn`] if the thread fails to spawn.
    pub fn new() -> Result<Self, ViewerError> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>();
        let (event_tx, event_rx) = mpsc::channel::<LoadEvent>();

        let thread = std::thread::Builder::new()
            .name("scanview-loader".into())
            .spawn(move || Self::thread_loop(&request_rx, &event_tx))
            .map_err(ViewerError::ThreadSpawn)?;

        Ok(Self {
            request_tx,
            event_rx,
            in_flight: None,
            thread: Some(thread),
        })
    }

    /// Queue a load under `id`, cancelling whatever is in flight. Ids
    /// should increase with every call.
    pub fn submit(&mut self, id: LoadId, request: LoadRequest) {
        self.cancel_in_flight();

        let cancel = Arc::new(AtomicBool::new(false));
        self.in_flight = Some(Arc::clone(&cancel));
        log::info!("load {id}: {}", request.source);
        let _ = self.request_tx.send(WorkerRequest::Load {
            id,
            request,
            cancel,
        });
    }

    /// Ask the running load (if any) to stop at its next checkpoint.
    pub fn cancel_in_flight(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            previous.store(true, Ordering::Relaxed);
        }
    }

    /// Non-blocking receive of the next event.
    #[must_use]
    pub fn try_recv(&self) -> Option<LoadEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocking receive with a timeout.
    #[must_use]
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Option<LoadEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Shut down the background thread and wait for it to finish.
    pub fn shutdown(&mut self) {
        self.cancel_in_flight();
        let _ = self.request_tx.send(WorkerRequest::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn thread_loop(
        request_rx: &mpsc::Receiver<WorkerRequest>,
        event_tx: &mpsc::Sender<LoadEvent>,
    ) {
        while let Ok(request) = request_rx.recv() {
            match drain_latest(request, request_rx, event_tx) {
                WorkerRequest::Shutdown => break,
                WorkerRequest::Load {
                    id,
                    request,
                    cancel,
                } => {
                    let event = run_load(id, &request, &cancel, event_tx);
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for LoadWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Skip to the newest queued request. Superseded loads still get their
/// terminal event.
fn drain_latest(
    mut latest: WorkerRequest,
    request_rx: &mpsc::Receiver<WorkerRequest>,
    event_tx: &mpsc::Sender<LoadEvent>,
) -> WorkerRequest {
    while let Ok(next) = request_rx.try_recv() {
        if let WorkerRequest::Load { id, .. } = latest {
            let _ = event_tx.send(cancelled(id));
        }
        latest = next;
    }
    latest
}

fn cancelled(id: LoadId) -> LoadEvent {
    LoadEvent::Failed {
        id,
        error: TransportError::Cancelled.into(),
    }
}

/// Forwards observer callbacks as [`LoadEvent`]s.
struct ChannelObserver<'a> {
    id: LoadId,
    tx: &'a mpsc::Sender<LoadEvent>,
    last_percent: Option<u32>,
}

impl LoadObserver for ChannelObserver<'_> {
    fn on_progress(&mut self, percent: f32, loaded: u64, total: u64) {
        // One event per whole percent keeps the channel small.
        let whole = percent as u32;
        if total > 0 && self.last_percent == Some(whole) {
            return;
        }
        self.last_percent = Some(whole);
        let _ = self.tx.send(LoadEvent::Progress {
            id: self.id,
            percent,
            loaded,
            total,
        });
    }

    fn on_parse_progress(&mut self, message: &str) {
        log::debug!("load {}: {message}", self.id);
        let _ = self.tx.send(LoadEvent::ParseProgress {
            id: self.id,
            message: message.to_owned(),
        });
    }
}

/// Run one request to its terminal event.
fn run_load(
    id: LoadId,
    request: &LoadRequest,
    cancel: &AtomicBool,
    tx: &mpsc::Sender<LoadEvent>,
) -> LoadEvent {
    let mut observer = ChannelObserver {
        id,
        tx,
        last_percent: None,
    };

    let text = match fetch_text(&request.source, cancel, &mut observer) {
        Ok(text) => text,
        Err(e) => {
            return LoadEvent::Failed {
                id,
                error: e.into(),
            }
        }
    };

    let mut job = IngestJob::new(&text, &request.options);
    let mesh = loop {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("load {id} superseded during ingestion");
            return cancelled(id);
        }
        match job.step(request.options.step_budget, &mut observer) {
            IngestStatus::Pending => {}
            IngestStatus::Complete(mesh) => break mesh,
            IngestStatus::Failed(error) => {
                return LoadEvent::Failed { id, error };
            }
        }
    };

    let (texture_path, texture) = match load_texture(request, &mesh) {
        Some((path, image)) => (Some(path), Some(image)),
        None => (None, None),
    };
    log::info!(
        "load {id}: {} vertices, {} triangles{}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        if texture.is_some() { ", textured" } else { "" }
    );

    LoadEvent::Loaded {
        id,
        mesh,
        texture,
        texture_path,
    }
}

/// Texture failures never fail the load; the model shows untextured.
fn load_texture(
    request: &LoadRequest,
    mesh: &RenderableMesh,
) -> Option<(PathBuf, TextureImage)> {
    if let Some(path) = &request.texture {
        return match TextureImage::open(path) {
            Ok(image) => Some((path.clone(), image)),
            Err(e) => {
                log::warn!("{e}; showing the model untextured");
                None
            }
        };
    }
    if !request.options.auto_texture || !mesh.has_tex_coords() {
        return None;
    }
    let model_path = request.source.path()?;
    texture::discover(model_path, &mesh.report.material_libraries)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn write_model(name: &str, text: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("scanview-worker-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.obj");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn request(path: PathBuf) -> LoadRequest {
        LoadRequest {
            source: ModelSource::File(path),
            texture: None,
            options: IngestOptions::default(),
        }
    }

    /// Collect events for `id` until its terminal event.
    fn collect_until_terminal(
        worker: &LoadWorker,
        id: LoadId,
    ) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Some(event) = worker.recv_timeout(Duration::from_secs(10)) {
            let done = event.id() == id && event.is_terminal();
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn loads_a_model_in_the_background() {
        let path = write_model("ok", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let mut worker = LoadWorker::new().unwrap();
        let id = LoadId(1);
        worker.submit(id, request(path));

        let events = collect_until_terminal(&worker, id);
        let last = events.last().unwrap();
        match last {
            LoadEvent::Loaded { mesh, texture, .. } => {
                assert_eq!(mesh.positions.len(), 9);
                assert!(texture.is_none());
            }
            other => panic!("unexpected terminal event: {other:?}"),
        }
        // Progress precedes the terminal event and there is only one.
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, LoadEvent::Progress { .. })));
    }

    #[test]
    fn parse_errors_are_reported_as_failures() {
        let path = write_model("bad", "v 0 0 zero\n");
        let mut worker = LoadWorker::new().unwrap();
        let id = LoadId(7);
        worker.submit(id, request(path));
        let events = collect_until_terminal(&worker, id);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Failed {
                error: ViewerError::Parse(_),
                ..
            })
        ));
    }

    #[test]
    fn every_request_gets_one_terminal_event() {
        let path = write_model("many", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let mut worker = LoadWorker::new().unwrap();
        let ids: Vec<_> = (1..=4).map(LoadId).collect();
        for id in &ids {
            worker.submit(*id, request(path.clone()));
        }

        let last = *ids.last().unwrap();
        let events = collect_until_terminal(&worker, last);
        for id in &ids {
            let terminals = events
                .iter()
                .filter(|e| e.id() == *id && e.is_terminal())
                .count();
            assert_eq!(terminals, 1, "load {id}");
        }
        assert!(matches!(events.last(), Some(LoadEvent::Loaded { .. })));
    }

    #[test]
    fn missing_explicit_texture_is_not_fatal() {
        let path = write_model(
            "notex",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n",
        );
        let mut worker = LoadWorker::new().unwrap();
        let id = LoadId(3);
        worker.submit(
            id,
            LoadRequest {
                texture: Some(PathBuf::from("/no/such/texture.png")),
                ..request(path)
            },
        );
        let events = collect_until_terminal(&worker, id);
        assert!(matches!(
            events.last(),
            Some(LoadEvent::Loaded { texture: None, .. })
        ));
    }
}
