//! Integration tests for imageops crates.
//!
//! Cross-module properties: range invariants for every operator, identity
//! laws, the masked composite law, and rasterizer geometry.

/// Deterministic pseudo-random frames for property checks.
pub mod fixtures {
    use imageops_core::{ImageBatch, MaskTensor};

    /// Hash-based value in `[0, 1)` for an index and seed.
    pub fn noise(i: usize, seed: u32) -> f32 {
        let mut x = (i as u32).wrapping_mul(0x9E37_79B1) ^ seed.wrapping_mul(0x85EB_CA6B);
        x ^= x >> 15;
        x = x.wrapping_mul(0x2C1B_3C6D);
        x ^= x >> 12;
        (x >> 8) as f32 / (1u32 << 24) as f32
    }

    /// `batch` noisy frames with values in `[0, 1]`.
    pub fn noisy_image(batch: usize, height: usize, width: usize, channels: usize, seed: u32) -> ImageBatch {
        let data = (0..batch * height * width * channels).map(|i| noise(i, seed)).collect();
        ImageBatch::from_data(batch, height, width, channels, data).unwrap_or_else(|e| panic!("fixture: {e}"))
    }

    /// Noisy (H, W) mask tensor.
    pub fn noisy_mask(height: usize, width: usize, seed: u32) -> MaskTensor {
        MaskTensor::from_2d(height, width, (0..height * width).map(|i| noise(i, seed)).collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    use imageops::{
        Blur, Clamp, ColorAdjust, ColorCorrect, CropReformat, DilateErode, EdgeDetect, Filter, Glow, HueSat,
        ImageBatch, ImageOp, Invert, Levels, LumaKey, MaskBatch, MaskTensor, Merge, MergeMode, MorphOp,
        Operator, OpsConfig, OpsError, ReformatMode, RotoMask, Sharpen, Transform,
    };
    use imageops_core::clamp01;

    use crate::fixtures::{noisy_image, noisy_mask};

    fn cfg() -> OpsConfig {
        OpsConfig::default()
    }

    fn all_operators() -> Vec<Operator> {
        vec![
            Operator::ColorCorrect(ColorCorrect { brightness: 0.2, contrast: 1.4, gamma: 0.7, saturation: 1.8 }),
            Operator::ColorAdjust(ColorAdjust { hue_deg: 40.0, hs_value: 1.3, ..Default::default() }),
            Operator::Levels(Levels { in_min: 0.1, in_max: 0.8, gamma: 2.0, out_min: 0.05, out_max: 0.9 }),
            Operator::HueSat(HueSat { hue_deg: -120.0, saturation: 2.0, value: 1.5 }),
            Operator::Invert(Invert { bypass: false, invert_alpha: true }),
            Operator::Clamp(Clamp { min: 0.2, max: 0.6 }),
            Operator::Blur(Blur { radius: 4, sigma: 2.0 }),
            Operator::Sharpen(Sharpen { amount: 2.0, radius: 2, sigma: 1.0, threshold: 0.05 }),
            Operator::EdgeDetect(EdgeDetect { strength: 3.0 }),
            Operator::Glow(Glow { threshold: 0.3, radius: 3, sigma: 2.0, intensity: 2.0 }),
            Operator::CropReformat(CropReformat {
                x: -3,
                y: 2,
                crop_w: 10,
                crop_h: 7,
                padding: 2,
                out_w: 9,
                out_h: 9,
                ..Default::default()
            }),
            Operator::Transform(Transform { translate_x: 2, rotate_deg: 30.0, scale: 1.3, ..Default::default() }),
            Operator::Transform(Transform { scale: 2.0, filter: Filter::Bicubic, ..Default::default() }),
            Operator::Transform(Transform {
                rotate_deg: 10.0,
                scale: 0.6,
                filter: Filter::Bicubic,
                expand: true,
                ..Default::default()
            }),
        ]
    }

    fn in_unit_range(data: &[f32]) -> bool {
        data.iter().all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn every_operator_stays_in_range() {
        for channels in [3, 4] {
            let img = noisy_image(2, 12, 14, channels, 7);
            for op in all_operators() {
                let out = op.apply(Some(&img), None, None, &cfg()).unwrap();
                assert_eq!(out.channels(), channels, "{}", op.name());
                assert!(in_unit_range(out.data()), "{} left [0, 1]", op.name());
            }
        }
    }

    #[test]
    fn mask_producers_stay_in_range() {
        let img = noisy_image(2, 16, 16, 3, 11);
        let key = LumaKey { low: 0.3, high: 0.6, softness: 0.1 }.apply(Some(&img), None, &cfg()).unwrap();
        assert!(in_unit_range(key.data()));

        let morph = DilateErode { op: MorphOp::Erode, radius: 2 }.apply(&key);
        assert!(in_unit_range(morph.data()));

        let merged = Merge { mode: MergeMode::Screen, mix: 0.7 }
            .apply(&img, &noisy_image(1, 16, 16, 4, 3), None, &cfg())
            .unwrap();
        assert!(in_unit_range(merged.data()));
    }

    #[test]
    fn identity_laws() {
        let img = noisy_image(2, 9, 11, 4, 5);

        let blurred = Blur { radius: 0, sigma: 3.0 }.apply(Some(&img), None, None, &cfg()).unwrap();
        assert_eq!(blurred, img);

        let clamped = Clamp { min: 0.0, max: 1.0 }.apply(Some(&img), None, None, &cfg()).unwrap();
        assert_eq!(clamped, img.clamped());

        let moved = Transform::default().apply(Some(&img), None, None, &cfg()).unwrap();
        assert_eq!(moved, img);

        let merged = Merge { mode: MergeMode::Multiply, mix: 0.0 }
            .apply(&img, &noisy_image(2, 9, 11, 4, 6), None, &cfg())
            .unwrap();
        assert_eq!(merged, img);

        let mask = MaskBatch::from_data(1, 3, 3, (0..9).map(|i| i as f32 / 8.0).collect()).unwrap();
        for op in [MorphOp::Dilate, MorphOp::Erode] {
            assert_eq!(DilateErode { op, radius: 0 }.apply(&mask), mask);
        }
    }

    #[test]
    fn levels_and_hue_sat_neutral() {
        let img = noisy_image(1, 8, 8, 4, 9);
        let lv = Levels::default().apply(Some(&img), None, None, &cfg()).unwrap();
        for (a, b) in lv.data().iter().zip(img.data()) {
            assert_abs_diff_eq!(*a, clamp01(*b), epsilon = 1e-5);
        }

        let hs = HueSat::default().apply(Some(&img), None, None, &cfg()).unwrap();
        for (a, b) in hs.data().chunks_exact(4).zip(img.data().chunks_exact(4)) {
            for c in 0..3 {
                assert_abs_diff_eq!(a[c], b[c], epsilon = 1e-4);
            }
            assert_eq!(a[3], b[3]);
        }
    }

    #[test]
    fn invert_twice_restores_rgb() {
        let img = noisy_image(2, 6, 6, 3, 13);
        let inv = Invert::default();
        let once = inv.apply(Some(&img), None, None, &cfg()).unwrap();
        let twice = inv.apply(Some(&once), None, None, &cfg()).unwrap();
        for (a, b) in twice.data().iter().zip(img.data()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn masked_composite_law() {
        let img = noisy_image(2, 10, 10, 4, 17);
        let op = Operator::HueSat(HueSat { hue_deg: 90.0, saturation: 0.5, value: 0.8 });
        let processed = op.apply(Some(&img), None, None, &cfg()).unwrap();

        let zeros = MaskTensor::from_2d(10, 10, vec![0.0; 100]);
        assert_eq!(op.apply(Some(&img), None, Some(&zeros), &cfg()).unwrap(), img);

        let ones = MaskTensor::from_2d(10, 10, vec![1.0; 100]);
        assert_eq!(op.apply(Some(&img), None, Some(&ones), &cfg()).unwrap(), processed);

        let mask = noisy_mask(10, 10, 23);
        let blended = op.apply(Some(&img), None, Some(&mask), &cfg()).unwrap();
        for f in 0..2 {
            for y in 0..10 {
                for x in 0..10 {
                    let m = mask.data()[y * 10 + x];
                    let (o, p, b) = (img.pixel(f, y, x), processed.pixel(f, y, x), blended.pixel(f, y, x));
                    for c in 0..4 {
                        assert_abs_diff_eq!(b[c], o[c] * (1.0 - m) + p[c] * m, epsilon = 1e-6);
                    }
                }
            }
        }
    }

    #[test]
    fn low_res_mask_is_resampled_and_broadcast() {
        let img = noisy_image(3, 16, 16, 3, 29);
        let mask = MaskTensor::new(vec![1, 1, 4, 4], vec![1.0; 16]);
        let out = Blur { radius: 2, sigma: 1.0 }.apply(Some(&img), None, Some(&mask), &cfg()).unwrap();
        let full = Blur { radius: 2, sigma: 1.0 }.apply(Some(&img), None, None, &cfg()).unwrap();
        assert_eq!(out, full);
    }

    #[test]
    fn reformat_fit_and_stretch_sizes() {
        let img = noisy_image(1, 20, 40, 3, 31);
        let fit = CropReformat { x: 0, y: 0, crop_w: 40, crop_h: 20, out_w: 30, out_h: 30, ..Default::default() };
        let out = fit.apply(Some(&img), None, None, &cfg()).unwrap();
        assert_eq!((out.width(), out.height()), (30, 30));
        // letterbox rows are zero-filled
        assert!(out.frame(0)[..30 * 3].iter().all(|v| *v == 0.0));
        assert!(out.frame(0)[29 * 30 * 3..].iter().all(|v| *v == 0.0));

        let stretch = CropReformat { mode: ReformatMode::Stretch, ..fit };
        let out = stretch.apply(Some(&img), None, None, &cfg()).unwrap();
        assert_eq!((out.width(), out.height()), (30, 30));
        assert!(out.data().iter().any(|v| *v > 0.0));
        assert!(out.frame(0)[..30 * 3].iter().any(|v| *v > 0.0));
    }

    #[test]
    fn reformat_guard_fires_before_allocation() {
        let img = noisy_image(1, 4, 4, 3, 1);
        let big = CropReformat { crop_w: 4, crop_h: 4, out_w: 100_000, out_h: 10, ..Default::default() };
        assert!(matches!(
            big.apply(Some(&img), None, None, &cfg()),
            Err(OpsError::SizeLimitExceeded { .. })
        ));
    }

    #[test]
    fn bezier_triangle_covers_triangle_area() {
        let img = noisy_image(1, 100, 100, 3, 37);
        let roto = RotoMask {
            payload: json!({
                "version": 1,
                "mode": "bezier",
                "points": [{"x": 0.1, "y": 0.1}, {"x": 0.9, "y": 0.1}, {"x": 0.5, "y": 0.9}]
            }),
            ..Default::default()
        };
        let mask = roto.render(Some(&img), None, &cfg()).unwrap();
        let filled = mask.data().iter().filter(|v| **v > 0.5).count() as f32;
        let triangle = 0.5 * 80.0 * 80.0;
        assert!(filled >= triangle * 0.98, "filled {}", filled);
        assert!(filled <= triangle * 2.0, "filled {}", filled);
    }

    #[test]
    fn luma_key_hard_band() {
        let img = ImageBatch::filled(1, 4, 4, &[0.5, 0.5, 0.5]).unwrap();
        let mask = LumaKey { low: 0.4, high: 0.6, softness: 0.0 }.apply(Some(&img), None, &cfg()).unwrap();
        for v in mask.data() {
            assert_abs_diff_eq!(*v, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn key_then_dilate_then_composite() {
        // keyed highlights, grown, used as the mask for a blur
        let img = noisy_image(2, 12, 12, 3, 41);
        let key = LumaKey { low: 0.7, high: 1.0, softness: 0.05 }.apply(Some(&img), None, &cfg()).unwrap();
        let grown = DilateErode { op: MorphOp::Dilate, radius: 1 }.apply(&key);
        let mask = MaskTensor::from(&grown);
        let out = Blur::default().apply(Some(&img), None, Some(&mask), &cfg()).unwrap();
        assert_eq!(out.shape(), img.shape());
        assert!(in_unit_range(out.data()));
    }

    #[test]
    fn operators_from_json_pipeline() {
        let ops: Vec<Operator> = serde_json::from_value(json!([
            {"op": "color_correct", "contrast": 1.2},
            {"op": "blur", "radius": 1},
            {"op": "transform", "rotate_deg": 90, "expand": true, "filter": "nearest"},
            {"op": "crop_reformat", "crop_w": 8, "crop_h": 8, "out_w": 4, "out_h": 4, "mode": "zoom"}
        ]))
        .unwrap();
        assert_eq!(ops.len(), 4);

        let mut img = noisy_image(1, 8, 12, 4, 43);
        for op in &ops {
            img = op.apply(Some(&img), None, None, &cfg()).unwrap();
        }
        assert_eq!((img.width(), img.height()), (4, 4));
        assert!(in_unit_range(img.data()));
    }

    #[test]
    fn config_file_drives_operators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.yaml");
        std::fs::write(&path, "max_scale_dimension: 20\nepsilon: 0.000001\n").unwrap();
        let cfg = OpsConfig::load(&path).unwrap();

        let img = noisy_image(1, 8, 8, 3, 47);
        let t = Transform { scale: 3.0, ..Default::default() };
        assert!(matches!(
            t.apply(Some(&img), None, None, &cfg),
            Err(OpsError::SizeLimitExceeded { limit: 20, .. })
        ));
        assert!(Transform { scale: 2.0, ..t }.apply(Some(&img), None, None, &cfg).is_ok());
    }
}
