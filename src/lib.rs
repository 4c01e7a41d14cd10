//! Meshkiln
//!
//! Bakes parsed 3D scenes into flat, engine-ready binaries: static
//! meshes, rigged meshes and animation clips. This crate hosts the
//! batch conversion driver; scene loading and artifact encoding live
//! in the workspace libraries.

pub mod driver;

pub use driver::{ExportConfig, RunSummary};
