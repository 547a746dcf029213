// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![warn(unused_results)]
#![warn(unused_qualifications)]
// Cast hygiene
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
// Tests unwrap freely
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Lightweight wgpu viewer for photogrammetry OBJ meshes.
//!
//! scanview streams an OBJ file (from disk, or over HTTP with the `http`
//! feature), turns it into an unwelded triangle buffer with synthesized
//! normals, finds a texture next to it, and shows it under an orbit camera
//! with damping and auto-rotation.
//!
//! # Key entry points
//!
//! - [`session::ViewerSession`] - owns options, the orbit camera, the current
//!   model, and last-load-wins bookkeeping
//! - [`mesh::ingest`] - OBJ text to [`mesh::RenderableMesh`]
//! - [`camera::OrbitCameraController`] - pointer/wheel driven orbit camera
//! - [`options::Options`] - TOML configuration (camera, ingest, display,
//!   keybindings)
//! - `Viewer` - the winit window (feature `viewer`)
//!
//! # Architecture
//!
//! Loads run on a background [`loader::LoadWorker`] thread that fetches,
//! parses, and decodes, sending progress and exactly one terminal event per
//! request. The session applies only the newest load; retired models are
//! handed back to the renderer so their GPU buffers are destroyed
//! explicitly.

pub mod camera;
pub mod error;
pub mod gpu;
pub mod input;
pub mod loader;
pub mod mesh;
pub mod options;
pub mod session;
pub mod texture;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use error::ViewerError;
pub use session::ViewerSession;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
