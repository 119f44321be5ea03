// src/engine/ico.rs
//
// ICO container writer. Little-endian layout:
//   u16 reserved = 0, u16 type = 1, u16 count
//   count x 16-byte directory entries (u8 width, u8 height, 0, 0,
//     u16 planes = 1, u16 bit count = 32, u32 payload length, u32 offset)
//   then the PNG payloads in directory order.
// A stored width/height byte of 0 means 256.

use crate::engine::{encoder, transform};
use crate::error::PixelbatchError;
use image::{imageops, RgbaImage};

type IcoResult<T> = std::result::Result<T, PixelbatchError>;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;
const MAX_ICON_SIDE: u32 = 256;

/// One directory entry: the icon's square side and its PNG payload.
#[derive(Debug, Clone)]
pub struct IcoEntry {
    pub size: u32,
    pub png: Vec<u8>,
}

impl IcoEntry {
    /// Square an arbitrary raster for embedding: center-crop to
    /// min(width, height), downscale to 256 if still larger, PNG-encode.
    pub fn from_raster(raster: &RgbaImage) -> IcoResult<Self> {
        let crop_side = raster.width().min(raster.height());
        let size = crop_side.min(MAX_ICON_SIDE);

        let squared = if crop_side == raster.width() && crop_side == raster.height() {
            raster.clone()
        } else {
            let x = (raster.width() - crop_side) / 2;
            let y = (raster.height() - crop_side) / 2;
            imageops::crop_imm(raster, x, y, crop_side, crop_side).to_image()
        };
        let sized = if size == crop_side {
            squared
        } else {
            transform::resample(squared, size, size, 3)?
        };

        Ok(Self {
            size,
            png: encoder::encode_png(&sized)?,
        })
    }
}

/// Serialize entries into an ICO file. Directory order follows the input
/// list; callers wanting a visual ordering sort before calling.
pub fn write_ico(entries: &[IcoEntry]) -> IcoResult<Vec<u8>> {
    if entries.is_empty() {
        return Err(PixelbatchError::packaging_failed(
            "ico",
            "no images to embed",
        ));
    }
    if entries.len() > u16::MAX as usize {
        return Err(PixelbatchError::packaging_failed(
            "ico",
            format!("too many images for one icon: {}", entries.len()),
        ));
    }

    let payload_len: usize = entries.iter().map(|e| e.png.len()).sum();
    let mut out = Vec::with_capacity(HEADER_LEN + entries.len() * ENTRY_LEN + payload_len);

    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());

    let mut png_offset = (HEADER_LEN + entries.len() * ENTRY_LEN) as u32;
    for entry in entries {
        let side_byte = if entry.size >= MAX_ICON_SIDE {
            0u8
        } else {
            entry.size as u8
        };
        out.push(side_byte);
        out.push(side_byte);
        out.push(0);
        out.push(0);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&32u16.to_le_bytes());
        out.extend_from_slice(&(entry.png.len() as u32).to_le_bytes());
        out.extend_from_slice(&png_offset.to_le_bytes());
        png_offset += entry.png.len() as u32;
    }
    for entry in entries {
        out.extend_from_slice(&entry.png);
    }

    Ok(out)
}

/// Parse an ICO file back into its entries, for inspection. The payload
/// bytes are copied out; size is the directory's declared side (0 = 256).
pub fn read_directory(data: &[u8]) -> IcoResult<Vec<IcoEntry>> {
    let header_error = |msg: &'static str| PixelbatchError::packaging_failed("ico", msg);
    if data.len() < HEADER_LEN {
        return Err(header_error("truncated header"));
    }
    if u16::from_le_bytes([data[0], data[1]]) != 0 || u16::from_le_bytes([data[2], data[3]]) != 1 {
        return Err(header_error("not an icon file"));
    }
    let count = u16::from_le_bytes([data[4], data[5]]) as usize;
    if data.len() < HEADER_LEN + count * ENTRY_LEN {
        return Err(header_error("truncated directory"));
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let base = HEADER_LEN + i * ENTRY_LEN;
        let size = match data[base] {
            0 => MAX_ICON_SIDE,
            side => side as u32,
        };
        let len = u32::from_le_bytes([
            data[base + 8],
            data[base + 9],
            data[base + 10],
            data[base + 11],
        ]) as usize;
        let offset = u32::from_le_bytes([
            data[base + 12],
            data[base + 13],
            data[base + 14],
            data[base + 15],
        ]) as usize;
        let payload = data
            .get(offset..offset + len)
            .ok_or_else(|| header_error("payload outside file bounds"))?;
        entries.push(IcoEntry {
            size,
            png: payload.to_vec(),
        });
    }
    Ok(entries)
}

/// Square, PNG-encode, and wrap a list of rasters into one icon file.
pub fn encode_ico(rasters: &[RgbaImage]) -> IcoResult<Vec<u8>> {
    let entries = rasters
        .iter()
        .map(IcoEntry::from_raster)
        .collect::<IcoResult<Vec<_>>>()?;
    write_ico(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    fn solid(side: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(side, side, Rgba([value, 0, 0, 255]))
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn header_and_directory_layout() {
        let entries = vec![
            IcoEntry::from_raster(&solid(16, 1)).unwrap(),
            IcoEntry::from_raster(&solid(32, 2)).unwrap(),
            IcoEntry::from_raster(&solid(48, 3)).unwrap(),
        ];
        let ico = write_ico(&entries).unwrap();

        assert_eq!(u16_at(&ico, 0), 0);
        assert_eq!(u16_at(&ico, 2), 1);
        assert_eq!(u16_at(&ico, 4), 3);

        let mut expected_offset = (HEADER_LEN + 3 * ENTRY_LEN) as u32;
        for (i, entry) in entries.iter().enumerate() {
            let base = HEADER_LEN + i * ENTRY_LEN;
            assert_eq!(ico[base], entry.size as u8);
            assert_eq!(ico[base + 1], entry.size as u8);
            assert_eq!(ico[base + 2], 0);
            assert_eq!(ico[base + 3], 0);
            assert_eq!(u16_at(&ico, base + 4), 1);
            assert_eq!(u16_at(&ico, base + 6), 32);
            assert_eq!(u32_at(&ico, base + 8), entry.png.len() as u32);
            assert_eq!(u32_at(&ico, base + 12), expected_offset);

            let payload =
                &ico[expected_offset as usize..expected_offset as usize + entry.png.len()];
            assert_eq!(payload, entry.png.as_slice());
            let decoded = image::load_from_memory(payload).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (entry.size, entry.size));
            expected_offset += entry.png.len() as u32;
        }
        assert_eq!(ico.len(), expected_offset as usize);
    }

    #[test]
    fn non_square_sources_are_center_cropped() {
        let wide = RgbaImage::from_fn(64, 16, |x, _| {
            // Left and right thirds red, center band green
            if (24..40).contains(&x) {
                Rgba([0, 255, 0, 255])
            } else {
                Rgba([255, 0, 0, 255])
            }
        });
        let entry = IcoEntry::from_raster(&wide).unwrap();
        assert_eq!(entry.size, 16);
        let decoded = image::load_from_memory(&entry.png).unwrap().into_rgba8();
        assert_eq!(decoded.get_pixel(8, 8), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn oversized_sources_store_zero_side_byte() {
        let entry = IcoEntry::from_raster(&solid(300, 9)).unwrap();
        assert_eq!(entry.size, 256);
        let ico = write_ico(std::slice::from_ref(&entry)).unwrap();
        assert_eq!(ico[HEADER_LEN], 0);
        assert_eq!(ico[HEADER_LEN + 1], 0);
    }

    #[test]
    fn empty_input_is_a_packaging_error() {
        assert!(matches!(
            write_ico(&[]),
            Err(PixelbatchError::PackagingFailed { .. })
        ));
        assert!(encode_ico(&[]).is_err());
    }

    #[test]
    fn read_directory_round_trips_entries() {
        let entries = vec![
            IcoEntry::from_raster(&solid(16, 1)).unwrap(),
            IcoEntry::from_raster(&solid(32, 2)).unwrap(),
            IcoEntry::from_raster(&solid(300, 3)).unwrap(),
        ];
        let ico = write_ico(&entries).unwrap();
        let parsed = read_directory(&ico).unwrap();

        assert_eq!(parsed.len(), 3);
        for (original, parsed) in entries.iter().zip(&parsed) {
            assert_eq!(parsed.size, original.size);
            assert_eq!(parsed.png, original.png);
        }
        assert_eq!(parsed[2].size, 256);
    }

    #[test]
    fn read_directory_rejects_garbage() {
        assert!(read_directory(&[0, 0]).is_err());
        assert!(read_directory(&[9, 9, 9, 9, 9, 9]).is_err());
        let mut truncated = encode_ico(&[solid(16, 1)]).unwrap();
        truncated.truncate(10);
        assert!(read_directory(&truncated).is_err());
    }

    #[test]
    fn directory_order_follows_input_order() {
        let ico = encode_ico(&[solid(48, 1), solid(16, 2), solid(32, 3)]).unwrap();
        assert_eq!(ico[HEADER_LEN], 48);
        assert_eq!(ico[HEADER_LEN + ENTRY_LEN], 16);
        assert_eq!(ico[HEADER_LEN + 2 * ENTRY_LEN], 32);
    }
}
