//! Noise stays within half the configured level on either side.

mod common;

use common::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use voice_anonymizer::noise::validate_noise_level;
use voice_anonymizer::{inject_noise, run, AnonymizeError, RateMode, SampleBuffer, Settings};

fn assert_bounded(before: &[f32], after: &[f32], level: f32) {
    assert_eq!(before.len(), after.len());
    let half = level / 2.0;
    for (i, (&b, &a)) in before.iter().zip(after).enumerate() {
        let d = a - b;
        assert!(
            d >= -half - 1e-6 && d < half + 1e-6,
            "sample {}: {} -> {} (delta {})",
            i,
            b,
            a,
            d
        );
    }
}

#[test]
fn test_injected_noise_bounded_on_signal() {
    let before = gen_voice_like(44100, 20000);
    let mut buffer = SampleBuffer::new(before.clone(), 2, 44100).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    inject_noise(&mut buffer, 0.1, &mut rng);
    assert_bounded(&before, buffer.samples(), 0.1);
    assert_ne!(buffer.samples(), &before[..]);
}

#[test]
fn test_noise_roughly_centered_and_spread() {
    let mut buffer = SampleBuffer::new(vec![0.0; 100_000], 1, 44100).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    inject_noise(&mut buffer, 0.02, &mut rng);

    let samples = buffer.samples();
    let mean: f64 = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
    assert!(mean.abs() < 2e-4, "mean {}", mean);

    let max = samples.iter().cloned().fold(f32::MIN, f32::max);
    let min = samples.iter().cloned().fold(f32::MAX, f32::min);
    assert!(max > 0.009 && max < 0.01);
    assert!(min < -0.009 && min >= -0.01);
}

#[test]
fn test_file_level_noise_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        input: dir.path().join("in.wav"),
        output: dir.path().join("out.wav"),
        pitch_semitones: 0.0,
        tempo_percent: 0.0,
        noise_level: 0.05,
        seed: Some(3),
        rate_mode: RateMode::Input,
    };
    let before = gen_stereo(200.0, 250.0, 44100, 8000, 0.6);
    write_float_wav(&settings.input, &before, 2, 44100);

    run(&settings).unwrap();
    assert_bounded(&before, &read_float_samples(&settings.output), 0.05);
}

#[test]
fn test_invalid_levels_rejected() {
    for level in [-0.01, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            validate_noise_level(level),
            Err(AnonymizeError::InvalidParams(_))
        ));
    }
    assert!(validate_noise_level(0.0).is_ok());
    assert!(validate_noise_level(1.5).is_ok());
}
