//! Integration tests for the lumen crates.
//!
//! End-to-end checks that run buffers through the engines, the resolution
//! adapter and configuration together. Logging from the libraries can be
//! inspected with `RUST_LOG=lumen_enhance=debug cargo test -p lumen-tests`.

use std::sync::Once;

use lumen_core::PixelBuffer;
use tracing_subscriber::EnvFilter;

pub mod determinism;

static TRACING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Underexposed RGB scene: a lit window on the left, dim noisy room on the
/// right.
pub fn night_scene(width: u32, height: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let lit = x < width / 4 && y < height / 2;
            let base = if lit {
                200
            } else {
                8 + (x * 7 + y * 13) % 36
            };
            data.extend_from_slice(&[base as u8, (base * 7 / 8) as u8, (base * 3 / 4) as u8]);
        }
    }
    PixelBuffer::from_u8(width, height, 3, data).expect("scene length matches its shape")
}

/// Dark single-channel ramp occupying levels `0..levels`.
pub fn dark_ramp(width: u32, height: u32, levels: u32) -> PixelBuffer {
    let data = (0..width * height).map(|i| (i % levels.max(1)) as u8).collect();
    PixelBuffer::from_u8(width, height, 1, data).expect("ramp length matches its shape")
}

/// Mean of the normalized samples.
pub fn mean_level(buffer: &PixelBuffer) -> f32 {
    let samples = buffer.to_f32_samples();
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::SampleType;
    use lumen_enhance::{
        agcwd, bimef, bimef_with_ratio, enhance_batch, Agcwd, AgcwdParams, Bimef, EnhanceConfig,
        Engine, EngineKind, Enhancer, ResolutionAdapter, ToneMode,
    };
    use tempfile::tempdir;

    const A: f32 = -0.3293;
    const B: f32 = 1.1258;

    /// AGCWD through the adapter: smaller working copy, original size back.
    #[test]
    fn test_agcwd_pipeline_large_image() {
        init_tracing();
        let buf = dark_ramp(300, 120, 70);
        let engine = Agcwd::default();
        let adapter = ResolutionAdapter::new(100).unwrap();

        assert_eq!(adapter.working_dimensions(300, 120), (100, 40));
        let out = adapter.run(&buf, &engine).unwrap();
        assert_eq!(out.dimensions(), (300, 120));
        assert_eq!(out.sample_type(), SampleType::U8);
        assert!(mean_level(&out) > mean_level(&buf));
    }

    #[test]
    fn test_bimef_pipeline_large_image() {
        init_tracing();
        let buf = night_scene(160, 90);
        let engine = Bimef::default();
        let adapter = ResolutionAdapter::new(64).unwrap();
        let out = adapter.run(&buf, &engine).unwrap();
        assert_eq!(out.dimensions(), (160, 90));
        assert_eq!(out.channels(), 3);
        assert!(mean_level(&out) > mean_level(&buf));
    }

    #[test]
    fn test_lit_region_kept() {
        // BIMEF weights by illumination: the lit window barely moves
        let buf = night_scene(64, 32);
        let out = bimef(&buf, 0.5, A, B).unwrap();
        let at = |b: &PixelBuffer, x: usize, y: usize| b.as_u8().unwrap()[(y * 64 + x) * 3] as i32;
        assert!((at(&out, 4, 4) - at(&buf, 4, 4)).abs() <= 20);
        assert!(at(&out, 48, 24) > at(&buf, 48, 24));
    }

    #[test]
    fn test_flat_and_extreme_images() {
        let flat = PixelBuffer::from_u8(4, 4, 1, vec![128; 16]).unwrap();
        assert_eq!(agcwd(&flat, 0.5).unwrap(), flat);

        let extremes = PixelBuffer::from_u8(2, 2, 1, vec![0, 0, 255, 255]).unwrap();
        assert_eq!(agcwd(&extremes, 0.5).unwrap().as_u8().unwrap(), &[0, 0, 255, 255]);
    }

    #[test]
    fn test_bimef_unit_ratio_identity() {
        let buf = night_scene(40, 24);
        assert_eq!(bimef_with_ratio(&buf, 1.0, 0.5, A, B).unwrap(), buf);
    }

    #[test]
    fn test_rgba_alpha_survives_pipeline() {
        let mut data = Vec::new();
        for i in 0..(50 * 30u32) {
            data.extend_from_slice(&[(i % 40) as u8, (i % 33) as u8, (i % 27) as u8, 128]);
        }
        let buf = PixelBuffer::from_u8(50, 30, 4, data).unwrap();
        let adapter = ResolutionAdapter::new(20).unwrap();
        for engine in [Engine::from(Agcwd::default()), Engine::from(Bimef::default())] {
            let out = adapter.run(&buf, &engine).unwrap();
            assert!(out.as_u8().unwrap().chunks(4).all(|px| px[3] == 128), "{}", engine.name());
        }
    }

    #[test]
    fn test_float_buffers() {
        let data: Vec<f32> = (0..32 * 16 * 3).map(|i| (i % 25) as f32 / 200.0).collect();
        let buf = PixelBuffer::from_f32(32, 16, 3, data).unwrap();
        for engine in [Engine::from(Agcwd::default()), Engine::from(Bimef::default())] {
            let out = engine.enhance(&buf).unwrap();
            assert_eq!(out.sample_type(), SampleType::F32);
            assert!(out.as_f32().unwrap().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_tone_modes_differ() {
        let buf = night_scene(32, 32);
        let run = |mode| Agcwd::new(AgcwdParams { alpha: 0.5, mode }).enhance(&buf).unwrap();
        let luma = run(ToneMode::Luma);
        let per_channel = run(ToneMode::PerChannel);
        assert_ne!(luma, per_channel);
        assert_eq!(luma.dimensions(), per_channel.dimensions());
    }

    #[test]
    fn test_adapter_round_trip_many_sizes() {
        for bound in [1u32, 5, 64, 512] {
            let adapter = ResolutionAdapter::new(bound).unwrap();
            for (w, h) in [(1u32, 1u32), (3, 700), (700, 3), (513, 512), (1000, 999)] {
                let (ww, wh) = adapter.working_dimensions(w, h);
                assert!(ww.max(wh) <= bound);
                let buf = PixelBuffer::filled_u8(ww, wh, &[40]).unwrap();
                let back = adapter.upscale(&buf, (w, h)).unwrap();
                assert_eq!(back.dimensions(), (w, h));
            }
        }
    }

    #[test]
    fn test_batch_equals_sequential() {
        let frames: Vec<PixelBuffer> = (0..5).map(|i| night_scene(48 + i * 4, 20 + i)).collect();
        let engine = Engine::from(Bimef::default());
        let adapter = ResolutionAdapter::new(32).unwrap();
        let batch = enhance_batch(&frames, &engine, Some(&adapter));
        for (frame, out) in frames.iter().zip(batch) {
            assert_eq!(out.unwrap(), adapter.run(frame, &engine).unwrap());
        }
    }

    #[test]
    fn test_config_file_drives_pipeline() {
        init_tracing();
        let dir = tempdir().unwrap();
        let path = dir.path().join("night.yaml");
        let yaml = concat!(
            "engine: bimef\n",
            "bimef:\n",
            "  fusion:\n",
            "    type: multi_scale\n",
            "    levels: 3\n",
            "adapter:\n",
            "  bimef_max_dimension: 48\n",
        );
        std::fs::write(&path, yaml).unwrap();

        let config = EnhanceConfig::from_file(&path).unwrap();
        assert_eq!(config.engine, EngineKind::Bimef);

        let buf = night_scene(120, 60);
        let out = config.process(&buf).unwrap();
        assert_eq!(out.dimensions(), (120, 60));

        let adapter = config.build_adapter().unwrap().unwrap();
        assert_eq!(out, adapter.run(&buf, &config.build_engine()).unwrap());
    }

    #[test]
    fn test_errors_surface() {
        let empty = PixelBuffer::from_u8(0, 10, 3, Vec::new()).unwrap();
        let adapter = ResolutionAdapter::new(16).unwrap();
        assert!(adapter.run(&empty, &Bimef::default()).unwrap_err().is_invalid_input());

        let black = PixelBuffer::filled_u8(40, 40, &[0, 0, 0]).unwrap();
        assert!(adapter.run(&black, &Bimef::default()).unwrap_err().is_numeric_degenerate());

        assert!(PixelBuffer::from_u8(2, 2, 2, vec![0; 8]).unwrap_err().is_unsupported_format());
    }
}
