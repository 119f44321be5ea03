use image::{GenericImageView, Rgba, RgbaImage};
use pixelbatch::engine::BatchPipeline;
use pixelbatch::{package, CropMode, OutputFormat, Preset, PresetLibrary, SourceImage};
use std::io::Cursor;

fn source(name: &str, width: u32, height: u32) -> SourceImage {
    let raster = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 200, 255])
    });
    SourceImage::from_decoded(name, raster).unwrap()
}

#[test]
fn full_batch_produces_one_artifact_per_pair() {
    let images = vec![source("alpha.png", 120, 80), source("beta.png", 64, 64)];
    let presets = vec![
        Preset::builder().name("Small").size(32, 32).build(),
        Preset::builder()
            .name("Thumb")
            .size(16, 16)
            .format(OutputFormat::Jpeg)
            .build(),
        Preset::builder()
            .name("Icon")
            .size(48, 48)
            .format(OutputFormat::Ico)
            .build(),
    ];

    let outcome = BatchPipeline::new().process(&images, &presets);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.results.len(), 6);

    // Every artifact decodes (or parses) as its declared format
    for result in &outcome.results {
        match result.mime {
            "image/png" | "image/jpeg" => {
                let decoded = image::load_from_memory(&result.bytes).unwrap();
                assert_eq!((decoded.width(), decoded.height()), (result.width, result.height));
            }
            "image/vnd.microsoft.icon" => {
                assert_eq!(u16::from_le_bytes([result.bytes[2], result.bytes[3]]), 1);
                assert_eq!(u16::from_le_bytes([result.bytes[4], result.bytes[5]]), 1);
            }
            other => panic!("unexpected mime: {other}"),
        }
    }
}

#[test]
fn result_order_is_stable_under_uneven_task_cost() {
    // Wildly different preset sizes make completion order diverge from
    // dispatch order; placement must still follow (image x preset) order.
    let images = vec![source("a.png", 400, 400), source("b.png", 400, 400)];
    let presets = vec![
        Preset::builder().name("Big").size(380, 380).build(),
        Preset::builder().name("Tiny").size(4, 4).build(),
        Preset::builder().name("Mid").size(150, 150).build(),
    ];

    for _ in 0..5 {
        let outcome = BatchPipeline::new()
            .with_concurrency(3)
            .process(&images, &presets);
        assert!(outcome.errors.is_empty());
        let order: Vec<(String, String)> = outcome
            .results
            .iter()
            .map(|r| (r.source_id.clone(), r.preset_id.clone()))
            .collect();
        let expected: Vec<(String, String)> = images
            .iter()
            .flat_map(|img| {
                presets
                    .iter()
                    .map(move |p| (img.id.clone(), p.id.clone()))
            })
            .collect();
        assert_eq!(order, expected);
    }
}

#[test]
fn failing_task_is_isolated_and_siblings_keep_their_positions() {
    // JPEG output wider than the dimension limit fails at encode time
    let images = vec![source("a.png", 100, 10)];
    let poison = Preset::builder()
        .name("Poison")
        .size(40_000, 1)
        .format(OutputFormat::Jpeg)
        .crop_mode(CropMode::Stretch)
        .maintain_aspect_ratio(false)
        .build();
    let presets = vec![
        Preset::builder().name("First").size(50, 50).build(),
        poison.clone(),
        Preset::builder().name("Last").size(20, 20).build(),
    ];

    let outcome = BatchPipeline::new().process(&images, &presets);

    assert_eq!(outcome.errors.len(), 1);
    let error = &outcome.errors[0];
    assert_eq!(error.task_index, 1);
    assert_eq!(error.source_id, images[0].id);
    assert_eq!(error.preset_id, poison.id);
    assert_eq!(error.preset_name, "Poison");

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].preset_id, presets[0].id);
    assert_eq!(outcome.results[1].preset_id, presets[2].id);
}

#[test]
fn batch_results_package_into_zip_and_combined_ico() {
    let images = vec![source("logo.png", 256, 256)];
    let presets = vec![
        Preset::builder().name("L").size(64, 64).build(),
        Preset::builder().name("M").size(32, 32).build(),
        Preset::builder().name("S").size(16, 16).build(),
    ];
    let outcome = BatchPipeline::new().process(&images, &presets);
    assert_eq!(outcome.results.len(), 3);

    let zip_bytes = package::zip_archive(&outcome.results).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    let ico = package::combined_ico(&outcome.results).unwrap();
    assert_eq!(u16::from_le_bytes([ico[4], ico[5]]), 3);
    // Widest first in the directory
    assert_eq!(ico[6], 64);
    assert_eq!(ico[6 + 16], 32);
    assert_eq!(ico[6 + 32], 16);
}

#[test]
fn default_presets_drive_a_batch_end_to_end() {
    let library = PresetLibrary::with_defaults();
    let images = vec![source("photo.png", 900, 600)];
    let outcome = BatchPipeline::new().process(&images, library.presets());

    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.results.len(), 4);
    // Default presets are square fit boxes; landscape input binds width
    assert_eq!((outcome.results[0].width, outcome.results[0].height), (100, 67));
    assert_eq!((outcome.results[3].width, outcome.results[3].height), (800, 533));
    assert_eq!(outcome.results[0].filename, "photo_100x67.png");
}
