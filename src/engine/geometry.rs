// src/engine/geometry.rs
//
// Pure geometry: output canvas sizing plus the source/target sub-rectangle
// pair for one (source size, preset) combination. No pixels touched here.

use crate::preset::{CropMode, OutputFormat, Preset};

/// Sub-rectangle in fractional pixel coordinates. Kept as f64 until the
/// raster stage rounds, so fill and fit share exact anchor math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    fn full(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Width rounded to a whole pixel, minimum 1.
    pub fn rounded_width(&self) -> u32 {
        (self.width.round() as i64).max(1) as u32
    }

    pub fn rounded_height(&self) -> u32 {
        (self.height.round() as i64).max(1) as u32
    }
}

/// The full geometric plan for one render: output canvas size plus the
/// crop window in the source and the placement window in the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGeometry {
    pub width: u32,
    pub height: u32,
    pub source: Rect,
    pub target: Rect,
}

/// Output canvas size for a source and preset.
///
/// With aspect maintained (and the format not ICO, which always forces the
/// literal box), the binding axis is chosen by comparing the box aspect to
/// the source aspect: a box wider than the source binds height, a box
/// narrower binds width. A zero preset axis means "derive from source".
pub fn calculate_output_size(source_width: u32, source_height: u32, preset: &Preset) -> (u32, u32) {
    let maintain = preset.maintain_aspect_ratio && preset.format != OutputFormat::Ico;
    if !maintain {
        let width = if preset.width > 0 { preset.width } else { source_width };
        let height = if preset.height > 0 { preset.height } else { source_height };
        return (width.max(1), height.max(1));
    }

    let aspect = source_width as f64 / source_height as f64;
    let (mut width, mut height) = (source_width as f64, source_height as f64);
    match (preset.width, preset.height) {
        (0, 0) => {}
        (max_w, 0) => {
            width = max_w as f64;
            height = (width / aspect).round();
        }
        (0, max_h) => {
            height = max_h as f64;
            width = (height * aspect).round();
        }
        (max_w, max_h) => {
            if max_w as f64 / max_h as f64 > aspect {
                height = max_h as f64;
                width = (height * aspect).round();
            } else {
                width = max_w as f64;
                height = (width / aspect).round();
            }
        }
    }
    ((width as i64).max(1) as u32, (height as i64).max(1) as u32)
}

/// Crop window in the source and placement window in the output.
///
/// One anchor primitive drives both crop policies: offset percent times the
/// slack on whichever axis has slack. Fill trims the source, fit pads the
/// target, stretch is identity on both.
pub fn prepare_rects(
    source_width: u32,
    source_height: u32,
    output_width: u32,
    output_height: u32,
    preset: &Preset,
) -> (Rect, Rect) {
    let src_w = source_width as f64;
    let src_h = source_height as f64;
    let out_w = output_width as f64;
    let out_h = output_height as f64;
    let source_aspect = src_w / src_h;
    let target_aspect = out_w / out_h;

    let mut source = Rect::full(src_w, src_h);
    let mut target = Rect::full(out_w, out_h);

    match preset.crop_mode {
        CropMode::Fill => {
            if source_aspect > target_aspect {
                source.width = src_h * target_aspect;
                source.x = (src_w - source.width) * (preset.horizontal_offset as f64 / 100.0);
            } else {
                source.height = src_w / target_aspect;
                source.y = (src_h - source.height) * (preset.vertical_offset as f64 / 100.0);
            }
        }
        CropMode::Fit => {
            if source_aspect > target_aspect {
                target.height = out_w / source_aspect;
                target.y = (out_h - target.height) * (preset.vertical_offset as f64 / 100.0);
            } else {
                target.width = out_h * source_aspect;
                target.x = (out_w - target.width) * (preset.horizontal_offset as f64 / 100.0);
            }
        }
        CropMode::Stretch => {}
    }

    (source, target)
}

/// Convenience wrapper computing the full plan in one call.
pub fn plan(source_width: u32, source_height: u32, preset: &Preset) -> OutputGeometry {
    let (width, height) = calculate_output_size(source_width, source_height, preset);
    let (source, target) = prepare_rects(source_width, source_height, width, height, preset);
    OutputGeometry {
        width,
        height,
        source,
        target,
    }
}
