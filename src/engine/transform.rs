// src/engine/transform.rs
//
// The per-artifact raster transform: crop, resample, composite, shape mask.
// Geometry comes from engine/geometry.rs; this module touches pixels.

use crate::engine::common::run_with_panic_policy;
use crate::engine::geometry;
use crate::error::PixelbatchError;
use crate::preset::{Preset, Shape};
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{imageops, Rgba, RgbaImage};

type TransformResult<T> = std::result::Result<T, PixelbatchError>;

/// Render one output raster from a shared source raster and a preset.
///
/// Pipeline: geometry plan, background fill, source crop, resample at the
/// preset's quality level, alpha-over composite at the target offset, then
/// the optional shape mask.
pub fn render(source: &RgbaImage, preset: &Preset) -> TransformResult<RgbaImage> {
    let plan = geometry::plan(source.width(), source.height(), preset);

    let opaque_background = !preset.transparent_background || !preset.supports_transparency();
    let mut output = if opaque_background {
        let bg = preset.background_color;
        RgbaImage::from_pixel(plan.width, plan.height, Rgba([bg.r, bg.g, bg.b, 255]))
    } else {
        RgbaImage::new(plan.width, plan.height)
    };

    let cropped = crop_source(source, &plan.source);
    let target_width = plan.target.rounded_width();
    let target_height = plan.target.rounded_height();
    let resized = resample(cropped, target_width, target_height, preset.quality.level())?;

    imageops::overlay(
        &mut output,
        &resized,
        plan.target.x.round() as i64,
        plan.target.y.round() as i64,
    );

    match preset.shape {
        Shape::Rectangle => {}
        Shape::Circle => apply_circle_mask(&mut output, preset),
        Shape::Rounded => apply_rounded_mask(&mut output, preset),
    }

    Ok(output)
}

/// Extract the crop window as an owned raster, clamped to the source bounds.
fn crop_source(source: &RgbaImage, rect: &geometry::Rect) -> RgbaImage {
    let width = rect.rounded_width().min(source.width());
    let height = rect.rounded_height().min(source.height());
    let x = (rect.x.round() as i64).clamp(0, (source.width() - width) as i64) as u32;
    let y = (rect.y.round() as i64).clamp(0, (source.height() - height) as i64) as u32;
    imageops::crop_imm(source, x, y, width, height).to_image()
}

/// Map the 0..3 quality level to a resample algorithm. Level 0 must be
/// visibly cheaper than level 3.
fn resize_options(quality: u8) -> ResizeOptions {
    let alg = match quality {
        0 => fir::ResizeAlg::Nearest,
        1 => fir::ResizeAlg::Convolution(fir::FilterType::Box),
        2 => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
        _ => fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3),
    };
    ResizeOptions::new().resize_alg(alg)
}

/// Resample an RGBA raster with fast_image_resize, premultiplying around
/// the convolution so translucent edges do not bleed background color.
pub fn resample(
    source: RgbaImage,
    dst_width: u32,
    dst_height: u32,
    quality: u8,
) -> TransformResult<RgbaImage> {
    let src_width = source.width();
    let src_height = source.height();
    if src_width == dst_width && src_height == dst_height {
        return Ok(source);
    }

    run_with_panic_policy("resize:fir", || {
        let mut src_pixels = source.into_raw();
        let options = resize_options(quality);

        let resized = match fir::images::Image::from_slice_u8(
            src_width,
            src_height,
            src_pixels.as_mut_slice(),
            PixelType::U8x4,
        ) {
            Ok(src_image) => resize_with_source_image(src_image, dst_width, dst_height, &options),
            Err(ImageBufferError::InvalidBufferAlignment) => {
                let mut aligned = fir::images::Image::new(src_width, src_height, PixelType::U8x4);
                aligned.buffer_mut().copy_from_slice(&src_pixels);
                resize_with_source_image(aligned, dst_width, dst_height, &options)
            }
            Err(other) => Err(format!("fir source image error: {other:?}")),
        };

        resized.map_err(|message| {
            PixelbatchError::resize_failed(
                (src_width, src_height),
                (dst_width, dst_height),
                message,
            )
        })
    })
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<RgbaImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, PixelType::U8x4);

    // Skip the alpha round trip when every pixel is already opaque
    let needs_premultiply = !src_image.buffer().iter().skip(3).step_by(4).all(|&a| a == 255);

    let mul_div = MulDiv::default();
    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    RgbaImage::from_raw(dst_width, dst_height, dst_image.into_vec())
        .ok_or_else(|| "failed to create rgba image from resized data".to_string())
}

/// Pixels outside the inscribed circle become transparent, or are
/// overwritten with the background color when transparency is unavailable.
fn apply_circle_mask(output: &mut RgbaImage, preset: &Preset) {
    let width = output.width();
    let height = output.height();
    let radius = width.min(height) as f64 / 2.0;
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let transparent = preset.transparent_background && preset.supports_transparency();
    let bg = preset.background_color;

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = x as f64 - center_x;
        let dy = y as f64 - center_y;
        if (dx * dx + dy * dy).sqrt() > radius {
            if transparent {
                pixel.0[3] = 0;
            } else {
                pixel.0[0] = bg.r;
                pixel.0[1] = bg.g;
                pixel.0[2] = bg.b;
            }
        }
    }
}

/// Corner pixels outside the rounded-rectangle path become transparent.
/// Unlike the circle mask this always punches alpha, matching the
/// established output of existing presets.
fn apply_rounded_mask(output: &mut RgbaImage, preset: &Preset) {
    let width = output.width() as f64;
    let height = output.height() as f64;
    let radius = (preset.corner_radius as f64).min(width / 2.0).min(height / 2.0);
    if radius <= 0.0 {
        return;
    }

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let px = x as f64;
        let py = y as f64;
        let corner_x = if px < radius {
            Some(radius)
        } else if px > width - radius {
            Some(width - radius)
        } else {
            None
        };
        let corner_y = if py < radius {
            Some(radius)
        } else if py > height - radius {
            Some(height - radius)
        } else {
            None
        };
        if let (Some(cx), Some(cy)) = (corner_x, corner_y) {
            let dx = px - cx;
            let dy = py - cy;
            if (dx * dx + dy * dy).sqrt() > radius {
                pixel.0[3] = 0;
            }
        }
    }
}
