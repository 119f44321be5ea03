use image::{Rgba, RgbaImage};
use pixelbatch::engine::{calculate_output_size, prepare_rects, render};
use pixelbatch::filename::{format_filename, FilenameContext};
use pixelbatch::{CropMode, Preset, SourceImage};
use proptest::prelude::*;

fn test_raster(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

fn source_dims_strategy() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=512, 1u32..=512)
}

fn box_dims_strategy() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=256, 1u32..=256)
}

proptest! {
    // Aspect-maintained output keeps the source aspect within a pixel
    #[test]
    fn maintained_aspect_is_preserved(
        (src_w, src_h) in source_dims_strategy(),
        (box_w, box_h) in box_dims_strategy(),
    ) {
        let preset = Preset::builder().size(box_w, box_h).build();
        let (out_w, out_h) = calculate_output_size(src_w, src_h, &preset);

        // One axis binds to the box; the other is derived by aspect and
        // rounded, clamped to a 1px floor.
        let aspect = src_w as f64 / src_h as f64;
        let width_from_height = ((out_h as f64 * aspect).round() as i64).max(1);
        let height_from_width = ((out_w as f64 / aspect).round() as i64).max(1);
        prop_assert!(
            (out_w as i64 - width_from_height).abs() <= 1
                || (out_h as i64 - height_from_width).abs() <= 1,
            "source {}x{} box {}x{} gave {}x{}",
            src_w, src_h, box_w, box_h, out_w, out_h
        );
        prop_assert!(out_w >= 1 && out_h >= 1);
        prop_assert!(out_w <= box_w && out_h <= box_h);
    }

    // Fill always produces exactly the requested box
    #[test]
    fn fill_output_has_exact_requested_dimensions(
        (src_w, src_h) in (8u32..=128, 8u32..=128),
        (box_w, box_h) in (4u32..=64, 4u32..=64),
    ) {
        let preset = Preset::builder()
            .size(box_w, box_h)
            .crop_mode(CropMode::Fill)
            .maintain_aspect_ratio(false)
            .build();
        let out = render(&test_raster(src_w, src_h), &preset)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!((out.width(), out.height()), (box_w, box_h));
    }

    // Stretch maps the full source onto the full box
    #[test]
    fn stretch_covers_the_full_box(
        (src_w, src_h) in (2u32..=128, 2u32..=128),
        (box_w, box_h) in (2u32..=64, 2u32..=64),
    ) {
        let preset = Preset::builder()
            .size(box_w, box_h)
            .crop_mode(CropMode::Stretch)
            .transparent_background(true)
            .maintain_aspect_ratio(false)
            .build();
        let out = render(&test_raster(src_w, src_h), &preset)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!((out.width(), out.height()), (box_w, box_h));
        // No transparent pixel anywhere: the source covers everything
        prop_assert!(out.pixels().all(|p| p.0[3] == 255));
    }

    // The anchor offset positions the crop window monotonically
    #[test]
    fn fill_anchor_is_monotonic_in_offset(
        offsets in proptest::collection::vec(0i64..=100, 2..6),
    ) {
        let mut sorted = offsets.clone();
        sorted.sort_unstable();

        let window_x = |offset: i64| {
            let preset = Preset::builder()
                .size(50, 50)
                .crop_mode(CropMode::Fill)
                .offsets(offset, 50)
                .maintain_aspect_ratio(false)
                .build();
            prepare_rects(400, 100, 50, 50, &preset).0.x
        };

        let mut previous = f64::NEG_INFINITY;
        for offset in sorted {
            let x = window_x(offset);
            prop_assert!(x >= previous);
            previous = x;
        }
        // Anchor extremes and midpoint
        prop_assert_eq!(window_x(0), 0.0);
        prop_assert_eq!(window_x(100), 300.0);
        prop_assert!((window_x(50) - 150.0).abs() <= 0.5);
    }

    // Numeric template tokens zero-pad to the requested width
    #[test]
    fn filename_zero_padding_matches_width(
        width in 1u32..=9999,
        height in 1u32..=9999,
        pad in 1usize..=6,
    ) {
        let source = SourceImage::from_decoded("cat.png", test_raster(4, 4))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let preset = Preset::builder().build();
        let context = FilenameContext::new(&source, &preset, width, height);

        let pattern = format!("{{width:{pad}}}x{{height:{pad}}}");
        let name = format_filename(&pattern, &context);
        let expected = format!("{:0>pad$}x{:0>pad$}", width, height, pad = pad);
        prop_assert_eq!(name, expected);
    }
}
