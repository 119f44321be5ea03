// src/engine.rs
//
// The processing core of pixelbatch: decode, geometry, raster transform,
// encode, and the concurrency-bounded batch pipeline.
//
// This file is a facade that delegates to the decomposed modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
/// This is the same limit used by libvips/sharp.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

/// Maximum accepted source file size: 200MB of encoded input.
pub const MAX_SOURCE_BYTES: u64 = 200 * 1024 * 1024;

mod common;
mod decoder;
mod encoder;
mod geometry;
mod ico;
mod pipeline;
mod pool;
mod transform;

pub use decoder::{check_dimensions, InputFormat, SourceImage};
pub use encoder::{encode, encode_jpeg, encode_png, encode_webp, EncodedImage};
pub use geometry::{calculate_output_size, plan, prepare_rects, OutputGeometry, Rect};
pub use ico::{encode_ico, read_directory, write_ico, IcoEntry};
pub use pipeline::{
    BatchOutcome, BatchPipeline, ProgressEvent, RenderError, RenderResult, RenderTask,
};
pub use pool::get_pool;
pub use transform::render;
