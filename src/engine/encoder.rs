// src/engine/encoder.rs
//
// Raster to bytes: PNG via the image crate, JPEG via mozjpeg
// (libjpeg-turbo), WebP via libwebp, ICO via engine/ico.rs.

use crate::engine::common::run_with_panic_policy;
use crate::engine::{ico, MAX_DIMENSION};
use crate::error::PixelbatchError;
use crate::preset::{OutputFormat, Preset};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use mozjpeg::{ColorSpace, Compress};
use std::io::Cursor;

type EncoderResult<T> = std::result::Result<T, PixelbatchError>;

/// An encoded artifact: the compressed bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Encode one rendered raster according to the preset's format settings.
pub fn encode(raster: &RgbaImage, preset: &Preset) -> EncoderResult<EncodedImage> {
    let bytes = match preset.format {
        OutputFormat::Png => encode_png(raster)?,
        OutputFormat::Jpeg => encode_jpeg(raster, preset.jpeg_quality)?,
        OutputFormat::Webp => encode_webp(raster, preset.webp_quality)?,
        OutputFormat::Ico => ico::encode_ico(std::slice::from_ref(raster))?,
    };
    Ok(EncodedImage {
        bytes,
        mime: preset.format.mime(),
    })
}

/// Lossless PNG via the image crate.
pub fn encode_png(raster: &RgbaImage) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let mut buf = Vec::new();
        image::write_buffer_with_format(
            &mut Cursor::new(&mut buf),
            raster.as_raw(),
            raster.width(),
            raster.height(),
            image::ExtendedColorType::Rgba8,
            ImageFormat::Png,
        )
        .map_err(|e| PixelbatchError::encode_failed("png", format!("PNG encode failed: {e}")))?;
        Ok(buf)
    })
}

/// Progressive JPEG via mozjpeg. Alpha is dropped; the transform stage has
/// already flattened onto the background color for this format.
pub fn encode_jpeg(raster: &RgbaImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let rgb = flatten_to_rgb(raster);
        let (w, h) = rgb.dimensions();

        if w == 0 || h == 0 {
            return Err(PixelbatchError::encode_failed(
                "jpeg",
                "invalid image dimensions: width or height is zero",
            ));
        }
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(PixelbatchError::dimension_exceeds_limit(w.max(h), MAX_DIMENSION));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(quality.min(100) as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);
        let mut writer = comp.start_compress(&mut output).map_err(|e| {
            PixelbatchError::encode_failed(
                "jpeg",
                format!("mozjpeg: failed to start compress: {e:?}"),
            )
        })?;

        let stride = w as usize * 3;
        for row in rgb.as_raw().chunks(stride) {
            writer.write_scanlines(row).map_err(|e| {
                PixelbatchError::encode_failed(
                    "jpeg",
                    format!("mozjpeg: failed to write scanlines: {e:?}"),
                )
            })?;
        }

        writer.finish().map_err(|e| {
            PixelbatchError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
        })?;

        Ok(output)
    })
}

/// WebP via libwebp's advanced encoder, RGBA so masked shapes keep their
/// transparency.
pub fn encode_webp(raster: &RgbaImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let (w, h) = raster.dimensions();
        let encoder = webp::Encoder::from_rgba(raster.as_raw(), w, h);

        let mut config = webp::WebPConfig::new()
            .map_err(|_| PixelbatchError::encode_failed("webp", "failed to create WebPConfig"))?;
        config.quality = quality.min(100) as f32;
        config.method = 4;
        config.autofilter = 1;

        let mem = encoder.encode_advanced(&config).map_err(|e| {
            PixelbatchError::encode_failed("webp", format!("WebP encode failed: {e:?}"))
        })?;
        Ok(mem.to_vec())
    })
}

fn flatten_to_rgb(raster: &RgbaImage) -> RgbImage {
    DynamicImage::ImageRgba8(raster.clone()).into_rgb8()
}
