// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::PixelbatchError;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub type EngineResult<T> = std::result::Result<T, PixelbatchError>;

/// Run a codec or resample stage with panics converted to errors.
/// mozjpeg and fast_image_resize abort via panic on some malformed inputs;
/// a batch must survive one bad file.
pub fn run_with_panic_policy<T>(
    stage: &'static str,
    f: impl FnOnce() -> EngineResult<T>,
) -> EngineResult<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PixelbatchError::internal_panic(format!("{stage}: {detail}")))
        }
    }
}
