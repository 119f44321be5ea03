// src/package.rs
//
// Batch packaging for already-produced results: a ZIP of every artifact,
// or one combined multi-resolution ICO. Both are all-or-nothing; a failure
// here leaves the underlying results intact for retry.

use crate::engine::{write_ico, IcoEntry, RenderResult};
use crate::error::PixelbatchError;
use crate::filename::split_name_and_ext;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

type PackageResult<T> = std::result::Result<T, PixelbatchError>;

/// Timestamped download name, e.g. `pixelbatch-20240309140507.zip`.
pub fn packaging_filename(ext: &str) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    format!("pixelbatch-{stamp}.{ext}")
}

/// Bundle every result into a ZIP archive. Colliding filenames get a
/// ` (n)` suffix before the extension, compared case-insensitively.
pub fn zip_archive(results: &[RenderResult]) -> PackageResult<Vec<u8>> {
    if results.is_empty() {
        return Err(PixelbatchError::packaging_failed(
            "zip",
            "no results to package",
        ));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for result in results {
        let key = result.filename.to_lowercase();
        let count = counts.entry(key).or_insert(0);
        let name = if *count > 0 {
            let (stem, ext) = split_name_and_ext(&result.filename);
            if ext.is_empty() {
                format!("{stem} ({count})")
            } else {
                format!("{stem} ({count}).{ext}")
            }
        } else {
            result.filename.clone()
        };
        *count += 1;

        writer
            .start_file(name, options)
            .map_err(|e| PixelbatchError::packaging_failed("zip", e.to_string()))?;
        writer
            .write_all(&result.bytes)
            .map_err(|e| PixelbatchError::packaging_failed("zip", e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| PixelbatchError::packaging_failed("zip", e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Combine every result's raster into one multi-resolution icon, widest
/// image first.
pub fn combined_ico(results: &[RenderResult]) -> PackageResult<Vec<u8>> {
    if results.is_empty() {
        return Err(PixelbatchError::packaging_failed(
            "ico",
            "no results to package",
        ));
    }

    let mut rasters: Vec<&image::RgbaImage> =
        results.iter().map(|r| r.raster.as_ref()).collect();
    rasters.sort_by(|a, b| b.width().cmp(&a.width()));

    let entries = rasters
        .into_iter()
        .map(IcoEntry::from_raster)
        .collect::<PackageResult<Vec<_>>>()?;
    write_ico(&entries)
}
