// src/error.rs
//
// Unified error handling for pixelbatch
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - Validation: bad inputs, rejected before any render task exists
// - Render: a single (image, preset) task failed; siblings keep running
// - Packaging: a batch-level ZIP/ICO assembly failed; results stay valid

use std::borrow::Cow;
use thiserror::Error;

/// Classifies every error by where it surfaces in the batch lifecycle.
///
/// - Validation: invalid input, surfaced before any task is created
/// - Render: per-task failure, isolated to one (image, preset) pair
/// - Packaging: ZIP/ICO assembly failure over already-produced results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Render,
    Packaging,
}

/// pixelbatch error types
///
/// All errors are type-safe and provide clear, actionable messages.
/// No numeric error codes - just clear error variants.
#[derive(Debug, Error)]
pub enum PixelbatchError {
    // Input validation
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Source '{name}' is {size} bytes, exceeding the {max} byte limit")]
    SourceTooLarge {
        name: Cow<'static, str>,
        size: u64,
        max: u64,
    },

    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Preset configuration
    #[error("Invalid value for preset field {field}: {value}. {reason}")]
    InvalidPresetValue {
        field: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("Invalid preset configuration: {message}")]
    InvalidConfig { message: Cow<'static, str> },

    #[error("Unknown preset id: {id}")]
    UnknownPreset { id: Cow<'static, str> },

    #[error("At least one preset must remain")]
    LastPreset,

    // Per-task render failures
    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Batch-level packaging failures
    #[error("Failed to build {operation}: {message}")]
    PackagingFailed {
        operation: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Internal errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },

    #[error("{message}")]
    Generic { message: Cow<'static, str> },
}

// io::Error is not Clone, so derive(Clone) is unavailable. RenderError entries
// hold owned copies of their underlying failure, hence the manual impl.
impl Clone for PixelbatchError {
    fn clone(&self) -> Self {
        match self {
            Self::UnsupportedFormat { format } => Self::UnsupportedFormat {
                format: format.clone(),
            },
            Self::SourceTooLarge { name, size, max } => Self::SourceTooLarge {
                name: name.clone(),
                size: *size,
                max: *max,
            },
            Self::FileReadFailed { path, source } => Self::FileReadFailed {
                path: path.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::DecodeFailed { message } => Self::DecodeFailed {
                message: message.clone(),
            },
            Self::DimensionExceedsLimit { dimension, max } => Self::DimensionExceedsLimit {
                dimension: *dimension,
                max: *max,
            },
            Self::PixelCountExceedsLimit { pixels, max } => Self::PixelCountExceedsLimit {
                pixels: *pixels,
                max: *max,
            },
            Self::InvalidPresetValue {
                field,
                value,
                reason,
            } => Self::InvalidPresetValue {
                field: field.clone(),
                value: value.clone(),
                reason: reason.clone(),
            },
            Self::InvalidConfig { message } => Self::InvalidConfig {
                message: message.clone(),
            },
            Self::UnknownPreset { id } => Self::UnknownPreset { id: id.clone() },
            Self::LastPreset => Self::LastPreset,
            Self::ResizeFailed {
                source_width,
                source_height,
                target_width,
                target_height,
                message,
            } => Self::ResizeFailed {
                source_width: *source_width,
                source_height: *source_height,
                target_width: *target_width,
                target_height: *target_height,
                message: message.clone(),
            },
            Self::EncodeFailed { format, message } => Self::EncodeFailed {
                format: format.clone(),
                message: message.clone(),
            },
            Self::PackagingFailed { operation, message } => Self::PackagingFailed {
                operation: operation.clone(),
                message: message.clone(),
            },
            Self::InternalPanic { message } => Self::InternalPanic {
                message: message.clone(),
            },
            Self::Generic { message } => Self::Generic {
                message: message.clone(),
            },
        }
    }
}

// Constructor Helpers
impl PixelbatchError {
    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn source_too_large(name: impl Into<Cow<'static, str>>, size: u64, max: u64) -> Self {
        Self::SourceTooLarge {
            name: name.into(),
            size,
            max,
        }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn invalid_preset_value(
        field: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidPresetValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn unknown_preset(id: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownPreset { id: id.into() }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn packaging_failed(
        operation: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::PackagingFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Where in the batch lifecycle this error surfaces.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. }
            | Self::SourceTooLarge { .. }
            | Self::FileReadFailed { .. }
            | Self::DecodeFailed { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::InvalidPresetValue { .. }
            | Self::InvalidConfig { .. }
            | Self::UnknownPreset { .. }
            | Self::LastPreset => ErrorKind::Validation,
            Self::ResizeFailed { .. }
            | Self::EncodeFailed { .. }
            | Self::InternalPanic { .. }
            | Self::Generic { .. } => ErrorKind::Render,
            Self::PackagingFailed { .. } => ErrorKind::Packaging,
        }
    }
}
