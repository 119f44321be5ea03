// lib.rs
//
// pixelbatch: batch image resizing and export
//
// A caller loads source images, defines named output presets (target size,
// crop policy, shape mask, format, filename pattern), and the pipeline
// produces one artifact per (image x preset) pair, ready for individual
// download, a ZIP bundle, or a combined multi-resolution icon.

pub mod engine;
pub mod error;
pub mod filename;
pub mod package;
pub mod preset;

mod util;

pub use engine::{
    BatchOutcome, BatchPipeline, EncodedImage, ProgressEvent, RenderError, RenderResult,
    SourceImage,
};
pub use error::{ErrorKind, PixelbatchError};
pub use preset::{
    Color, CropMode, OutputFormat, Preset, PresetLibrary, PresetSettings, ResampleQuality, Shape,
};

/// Result alias used throughout the crate.
pub type PixelbatchResult<T> = std::result::Result<T, PixelbatchError>;

/// Crate version, for config documents and diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
