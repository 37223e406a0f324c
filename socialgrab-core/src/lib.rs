//! Orchestration core for socialgrab.
//!
//! Everything here is independent of the concrete extraction engine: the
//! engine is reached only through [`core::engine::ExtractionEngine`] and the
//! presentation layer only through [`core::events::DownloadEvents`] and
//! [`core::format::QualityPrompt`].

pub mod core;
pub mod error;
pub mod fs_paths;
pub mod models;

pub use error::{DownloadError, FailureKind};
