//! Resumable OBJ ingestion.
//!
//! [`IngestJob`] does a bounded amount of work per [`step`](IngestJob::step)
//! so a caller can interleave ingestion with frame updates; [`ingest`]
//! drives a job to completion and reports through a [`LoadObserver`].

use std::iter::Enumerate;
use std::str::Lines;

use super::normals::synthesize;
use super::parser::ObjScanner;
use super::resolve::Resolver;
use super::{IngestReport, MeshMaterial, RenderableMesh, VertexPool};
use crate::error::ViewerError;
use crate::options::IngestOptions;

/// Callbacks for one load attempt.
///
/// Progress callbacks fire zero or more times, always before the single
/// terminal callback (`on_loaded` or `on_error`).
pub trait LoadObserver {
    /// Byte transfer progress. `total_bytes` is 0 (and `percent` 0) when
    /// the size is not known up front.
    fn on_progress(&mut self, _percent: f32, _loaded_bytes: u64, _total_bytes: u64) {}

    /// Human-readable phase/percentage text while scanning and resolving.
    fn on_parse_progress(&mut self, _message: &str) {}

    /// The mesh is ready.
    fn on_loaded(&mut self, _mesh: RenderableMesh) {}

    /// The load failed; no partial result is delivered.
    fn on_error(&mut self, _error: ViewerError) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LoadObserver for NoopObserver {}

/// Outcome of one [`IngestJob::step`].
#[derive(Debug)]
pub enum IngestStatus {
    /// More work remains.
    Pending,
    /// Ingestion succeeded.
    Complete(Box<RenderableMesh>),
    /// Ingestion failed.
    Failed(ViewerError),
}

enum Phase<'a> {
    Scanning {
        lines: Enumerate<Lines<'a>>,
        scanner: ObjScanner,
    },
    Resolving {
        pool: VertexPool,
        resolver: Resolver,
        report: IngestReport,
    },
    Finished,
}

/// A resumable ingestion of one OBJ text.
pub struct IngestJob<'a> {
    phase: Phase<'a>,
    total_lines: usize,
    options: IngestOptions,
}

impl<'a> IngestJob<'a> {
    /// Start ingesting `text`.
    #[must_use]
    pub fn new(text: &'a str, options: &IngestOptions) -> Self {
        Self {
            phase: Phase::Scanning {
                lines: text.lines().enumerate(),
                scanner: ObjScanner::new(),
            },
            total_lines: text.lines().count(),
            options: options.clone(),
        }
    }

    /// Whether the job has produced its terminal status.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Process at most `budget` lines (while scanning) or triangle groups
    /// (while resolving).
    pub fn step(
        &mut self,
        budget: usize,
        observer: &mut dyn LoadObserver,
    ) -> IngestStatus {
        let budget = budget.max(1);
        match std::mem::replace(&mut self.phase, Phase::Finished) {
            Phase::Scanning { lines, scanner } => {
                self.scan(lines, scanner, budget, observer)
            }
            Phase::Resolving {
                pool,
                resolver,
                report,
            } => self.resolve(pool, resolver, report, budget, observer),
            Phase::Finished => IngestStatus::Failed(ViewerError::Viewer(
                "ingestion already finished".into(),
            )),
        }
    }

    fn scan(
        &mut self,
        mut lines: Enumerate<Lines<'a>>,
        mut scanner: ObjScanner,
        budget: usize,
        observer: &mut dyn LoadObserver,
    ) -> IngestStatus {
        let interval = self.options.progress_line_interval.max(1);
        for _ in 0..budget {
            let Some((index, line)) = lines.next() else {
                return self.begin_resolve(scanner, observer);
            };
            if let Err(e) = scanner.scan_line(index + 1, line) {
                return IngestStatus::Failed(e.into());
            }
            let scanned = scanner.lines_scanned();
            if scanned % interval == 0 {
                observer.on_parse_progress(&format!(
                    "Parsing: {}% ({scanned}/{} lines)",
                    percent(scanned, self.total_lines),
                    self.total_lines
                ));
            }
        }
        self.phase = Phase::Scanning { lines, scanner };
        IngestStatus::Pending
    }

    fn begin_resolve(
        &mut self,
        scanner: ObjScanner,
        observer: &mut dyn LoadObserver,
    ) -> IngestStatus {
        let (mut pool, corners, report) = scanner.finish();
        log::debug!(
            "scanned {} lines: {} positions, {} normals, {} uvs, {} faces",
            report.lines,
            report.positions,
            report.normals,
            report.tex_coords,
            report.faces
        );
        if report.polygon_faces > 0 {
            log::warn!(
                "{} faces have more than three corners; faces are expected \
                 to be triangulated",
                report.polygon_faces
            );
        }
        if self.options.normalize {
            pool.normalize(self.options.normalize_extent);
        }
        observer.on_parse_progress("Parsing: 100%");
        self.phase = Phase::Resolving {
            pool,
            resolver: Resolver::new(corners),
            report,
        };
        IngestStatus::Pending
    }

    fn resolve(
        &mut self,
        pool: VertexPool,
        mut resolver: Resolver,
        report: IngestReport,
        budget: usize,
        observer: &mut dyn LoadObserver,
    ) -> IngestStatus {
        let interval = self.options.progress_group_interval.max(1);
        let total = resolver.total_groups();
        let mut remaining = budget;
        while remaining > 0 && !resolver.is_done() {
            let until_report = interval - resolver.groups_done() % interval;
            let done = resolver.resolve_groups(&pool, remaining.min(until_report));
            remaining = remaining.saturating_sub(done.max(1));
            let groups = resolver.groups_done();
            if groups % interval == 0 && groups < total {
                observer.on_parse_progress(&format!(
                    "Building geometry: {}%",
                    percent(groups, total)
                ));
            }
        }

        if resolver.is_done() {
            observer.on_parse_progress("Building geometry: 100%");
            return IngestStatus::Complete(Box::new(build_mesh(
                &pool, resolver, report, observer,
            )));
        }

        self.phase = Phase::Resolving {
            pool,
            resolver,
            report,
        };
        IngestStatus::Pending
    }
}

fn build_mesh(
    pool: &VertexPool,
    resolver: Resolver,
    mut report: IngestReport,
    observer: &mut dyn LoadObserver,
) -> RenderableMesh {
    let buffers = resolver.finish();
    report.dropped_corners = buffers.dropped_corners;
    report.dropped_attributes = buffers.dropped_attributes;
    if buffers.dropped_corners > 0 {
        log::warn!(
            "{} face corners reference missing vertices and were skipped",
            buffers.dropped_corners
        );
    }

    let missing = buffers.normal_present.iter().filter(|p| !**p).count();
    let normals = if buffers.normals.is_empty() {
        observer.on_parse_progress("Computing normals");
        report.synthesized_normals = true;
        synthesize(&buffers.positions, &buffers.sources, pool.position_count())
    } else if missing > 0 {
        observer.on_parse_progress("Computing normals");
        report.filled_normals = missing;
        log::debug!("{missing} corners have no normal; synthesizing those");
        let smooth = synthesize(
            &buffers.positions,
            &buffers.sources,
            pool.position_count(),
        );
        fill_missing(buffers.normals, &buffers.normal_present, &smooth)
    } else {
        buffers.normals
    };

    RenderableMesh {
        positions: buffers.positions,
        normals,
        tex_coords: buffers.tex_coords,
        material: MeshMaterial::default(),
        report,
    }
}

/// Replace the normals of corners flagged absent with synthesized ones.
fn fill_missing(
    mut normals: Vec<f32>,
    present: &[bool],
    synthesized: &[f32],
) -> Vec<f32> {
    for (corner, _) in present.iter().enumerate().filter(|(_, p)| !**p) {
        let range = corner * 3..corner * 3 + 3;
        if let (Some(dst), Some(src)) =
            (normals.get_mut(range.clone()), synthesized.get(range))
        {
            dst.copy_from_slice(src);
        }
    }
    normals
}

fn percent(done: usize, total: usize) -> usize {
    if total == 0 {
        100
    } else {
        done * 100 / total
    }
}

/// Ingest `text` to completion, delivering exactly one terminal callback.
pub fn ingest(
    text: &str,
    options: &IngestOptions,
    observer: &mut dyn LoadObserver,
) {
    let mut job = IngestJob::new(text, options);
    loop {
        match job.step(options.step_budget, observer) {
            IngestStatus::Pending => {}
            IngestStatus::Complete(mesh) => {
                observer.on_loaded(*mesh);
                return;
            }
            IngestStatus::Failed(e) => {
                observer.on_error(e);
                return;
            }
        }
    }
}

/// Ingest `text` and return the mesh directly.
///
/// # Errors
///
/// Returns [`ViewerError::Parse`] for malformed records.
pub fn ingest_str(
    text: &str,
    options: &IngestOptions,
) -> Result<RenderableMesh, ViewerError> {
    let mut job = IngestJob::new(text, options);
    loop {
        match job.step(options.step_budget, &mut NoopObserver) {
            IngestStatus::Pending => {}
            IngestStatus::Complete(mesh) => return Ok(*mesh),
            IngestStatus::Failed(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn raw_options() -> IngestOptions {
        IngestOptions {
            normalize: false,
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        mesh: Option<RenderableMesh>,
    }

    impl LoadObserver for Recorder {
        fn on_parse_progress(&mut self, message: &str) {
            self.events.push(format!("progress:{message}"));
        }

        fn on_loaded(&mut self, mesh: RenderableMesh) {
            self.events.push("loaded".into());
            self.mesh = Some(mesh);
        }

        fn on_error(&mut self, error: ViewerError) {
            self.events.push(format!("error:{error}"));
        }
    }

    const QUAD: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\n";

    #[test]
    fn single_triangle_uses_listed_vertices() {
        let mesh = ingest_str(QUAD, &raw_options()).unwrap();
        assert_eq!(
            mesh.positions,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn position_buffer_is_nine_floats_per_triangle() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
                    f 1 2 3\nf 2 4 3\nf 1 2 4\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        assert_eq!(mesh.positions.len(), 3 * 3 * 3);
    }

    #[test]
    fn out_of_range_corner_desynchronizes_buffer() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 99\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        assert_eq!(mesh.positions.len(), 6);
        assert_ne!(mesh.positions.len() % 9, 0);
        assert_eq!(mesh.report.dropped_corners, 1);
    }

    #[test]
    fn tex_coords_are_flipped() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
                    vt 0 0\nvt 1 0.25\nvt 0.5 1\n\
                    f 1/1 2/2 3/3\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        let vs: Vec<f32> =
            mesh.tex_coords.chunks_exact(2).map(|uv| uv[1]).collect();
        let expected = [1.0, 0.75, 0.0];
        for (v, e) in vs.iter().zip(expected) {
            assert!((v - e).abs() < 1e-6);
        }
    }

    #[test]
    fn missing_normals_are_synthesized_unit_length() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0.5\n\
                    f 1 2 3\nf 2 4 3\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        assert!(mesh.report.synthesized_normals);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        for n in mesh.normals.chunks_exact(3) {
            let len = Vec3::new(n[0], n[1], n[2]).length();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn source_normals_are_kept() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\n\
                    f 1//1 2//1 3//1\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        assert!(!mesh.report.synthesized_normals);
        assert_eq!(mesh.normals, vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0]);
    }

    const MIXED_NORMALS: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\n\
                                 f 1 2 3\nf 1//1 2//1 3//1\n";

    #[test]
    fn faces_without_normals_get_synthesized_ones() {
        let mesh = ingest_str(MIXED_NORMALS, &raw_options()).unwrap();
        assert_eq!(mesh.positions.len(), 18);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.report.filled_normals, 3);
        assert!(!mesh.report.synthesized_normals);

        // First triangle winds counter-clockwise about +Z.
        for n in mesh.normals[..9].chunks_exact(3) {
            assert!((n[2] - 1.0).abs() < 1e-5, "{n:?}");
        }
        // Second triangle keeps its source normal.
        for n in mesh.normals[9..].chunks_exact(3) {
            assert_eq!(n, [0.0, 0.0, -1.0]);
        }
    }

    #[test]
    fn faces_without_uvs_stay_aligned() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.5\n\
                    f 1 2 3\nf 1/1 2/1 3/1\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        assert_eq!(mesh.tex_coords.len() / 2, mesh.positions.len() / 3);
        assert_eq!(&mesh.tex_coords[..6], &[0.0; 6]);
        for uv in mesh.tex_coords[6..].chunks_exact(2) {
            assert_eq!(uv, [0.5, 0.5]);
        }
    }

    #[test]
    fn out_of_range_attributes_keep_buffers_aligned() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 1\nvn 0 0 1\n\
                    f 1/1/1 2/9/9 3/1/1\n";
        let mesh = ingest_str(text, &raw_options()).unwrap();
        assert_eq!(mesh.report.dropped_attributes, 2);
        assert_eq!(mesh.report.dropped_corners, 0);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.tex_coords.len() / 2, mesh.positions.len() / 3);
        assert_eq!(&mesh.tex_coords[2..4], &[0.0, 0.0]);
        let n = &mesh.normals[3..6];
        assert!((Vec3::new(n[0], n[1], n[2]).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn observer_gets_progress_then_one_terminal_call() {
        let mut recorder = Recorder::default();
        let options = IngestOptions {
            progress_line_interval: 2,
            ..raw_options()
        };
        ingest(QUAD, &options, &mut recorder);
        assert_eq!(recorder.events.last().map(String::as_str), Some("loaded"));
        let terminal = recorder
            .events
            .iter()
            .filter(|e| *e == "loaded" || e.starts_with("error:"))
            .count();
        assert_eq!(terminal, 1);
        assert!(recorder.events.iter().any(|e| e.starts_with("progress:Parsing")));
        assert!(recorder.mesh.is_some());
    }

    #[test]
    fn parse_failure_reports_error_only() {
        let mut recorder = Recorder::default();
        ingest("v 0 0 0\nv 1 nope 0\n", &raw_options(), &mut recorder);
        assert!(recorder.mesh.is_none());
        let last = recorder.events.last().unwrap();
        assert!(last.starts_with("error:"));
        assert!(last.contains("line 2"));
        assert!(!recorder.events.iter().any(|e| e == "loaded"));
    }

    #[test]
    fn stepping_one_unit_at_a_time_matches_bulk() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nvt 0 1\n\
                    f 1/1 2/1 3/1\nf 2/1 4/1 3/1\n";
        let options = raw_options();
        let mut job = IngestJob::new(text, &options);
        let mut steps = 0;
        let mesh = loop {
            steps += 1;
            match job.step(1, &mut NoopObserver) {
                IngestStatus::Pending => {}
                IngestStatus::Complete(mesh) => break *mesh,
                IngestStatus::Failed(e) => panic!("unexpected failure: {e}"),
            }
        };
        assert!(steps > 7);
        assert!(job.is_finished());
        assert_eq!(mesh, ingest_str(text, &options).unwrap());
    }

    #[test]
    fn normalize_option_centers_the_pool() {
        let text = "v 10 10 10\nv 12 10 10\nv 10 12 10\nf 1 2 3\n";
        let options = IngestOptions {
            normalize: true,
            normalize_extent: 2.0,
            ..raw_options()
        };
        let mesh = ingest_str(text, &options).unwrap();
        let bounds = mesh.bounds().unwrap();
        assert!(bounds.max.abs().max_element() <= 2.0 + 1e-5);
        assert!(bounds.min.abs().max_element() <= 2.0 + 1e-5);
    }

    #[test]
    fn empty_text_yields_empty_mesh() {
        let mesh = ingest_str("", &raw_options()).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.normals.is_empty());
    }
}
