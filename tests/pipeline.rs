//! End-to-end pipeline tests: WAV in, anonymized WAV out.

mod common;

use common::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use voice_anonymizer::{anonymize_wav_file, run, RateMode, Settings};

fn settings_for(dir: &tempfile::TempDir, pitch: f64, tempo: f64, noise: f32) -> Settings {
    Settings {
        input: dir.path().join("input.wav"),
        output: dir.path().join("output_anonymized.wav"),
        pitch_semitones: pitch,
        tempo_percent: tempo,
        noise_level: noise,
        seed: Some(1234),
        rate_mode: RateMode::Input,
    }
}

#[test]
fn test_stereo_silence_identity_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 0.0, 0.0, 0.0);
    write_float_wav(&settings.input, &vec![0.0; 2000], 2, 44100);

    let report = run(&settings).unwrap();
    assert_eq!(report.input_frames, 1000);
    assert_eq!(report.output_frames, 1000);

    let spec = read_spec(&settings.output);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);

    let out = read_float_samples(&settings.output);
    assert_eq!(out.len(), 2000);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn test_empty_input_gives_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 5.0, 10.0, 0.02);
    write_float_wav(&settings.input, &[], 2, 44100);

    let report = run(&settings).unwrap();
    assert_eq!(report.output_frames, 0);

    let reader = hound::WavReader::open(&settings.output).unwrap();
    assert_eq!(reader.len(), 0);
    assert_eq!(reader.spec().channels, 2);
}

#[test]
fn test_default_transform_shortens_by_tempo() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 5.0, 10.0, 0.02);
    let frames = 44100;
    write_float_wav(&settings.input, &gen_voice_like(44100, frames), 1, 44100);

    let report = run(&settings).unwrap();
    assert_eq!(report.output_frames, 40091);

    let out = read_float_samples(&settings.output);
    assert_eq!(out.len(), 40091);
    assert!(out.iter().all(|s| s.is_finite()));
    assert!(rms(&out) > 0.05, "output unexpectedly quiet: {}", rms(&out));
}

#[test]
fn test_pcm16_input_gives_pcm16_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 3.0, -10.0, 0.01);
    write_pcm16_wav(&settings.input, &gen_stereo(220.0, 330.0, 22050, 11025, 0.5), 2, 22050);

    run(&settings).unwrap();

    let spec = read_spec(&settings.output);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 22050);

    let reader = hound::WavReader::open(&settings.output).unwrap();
    // 11025 / 0.9 frames, two samples each
    assert_eq!(reader.len() as usize, 12250 * 2);
}

#[test]
fn test_same_seed_reproducible_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, -4.0, 15.0, 0.05);
    write_float_wav(&settings.input, &gen_voice_like(44100, 20000), 1, 44100);

    run(&settings).unwrap();
    let first = read_float_samples(&settings.output);
    run(&settings).unwrap();
    let second = read_float_samples(&settings.output);
    assert_eq!(first, second);

    let reseeded = Settings {
        seed: Some(99),
        ..settings.clone()
    };
    run(&reseeded).unwrap();
    let third = read_float_samples(&settings.output);
    assert_ne!(first, third);
}

#[test]
fn test_explicit_rng_matches_seeded_run() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 2.0, 5.0, 0.03);
    write_float_wav(&settings.input, &gen_voice_like(44100, 10000), 1, 44100);

    run(&settings).unwrap();
    let via_run = read_float_samples(&settings.output);

    let mut rng = StdRng::seed_from_u64(1234);
    anonymize_wav_file(&settings, &mut rng).unwrap();
    let via_rng = read_float_samples(&settings.output);
    assert_eq!(via_run, via_rng);
}

#[test]
fn test_rate_mode_changes_processing_rate_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_for(&dir, 0.0, 20.0, 0.0);
    write_float_wav(&settings.input, &gen_sine(440.0, 48000, 48000, 0.5), 1, 48000);

    let from_input = run(&settings).unwrap();
    assert_eq!(from_input.processing_rate, 48000);
    assert_eq!(from_input.sample_rate, 48000);

    settings.rate_mode = RateMode::Fixed;
    let fixed = run(&settings).unwrap();
    assert_eq!(fixed.processing_rate, 44100);
    assert_eq!(fixed.sample_rate, 48000);
    assert_eq!(read_spec(&settings.output).sample_rate, 48000);

    // Length depends only on tempo, not on the processing rate
    assert_eq!(from_input.output_frames, 40000);
    assert_eq!(fixed.output_frames, 40000);
}

#[test]
fn test_multichannel_layout_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 7.0, 25.0, 0.02);
    let frames = 9000;
    let mut data = Vec::with_capacity(frames * 3);
    for i in 0..frames {
        let t = i as f32 / 44100.0;
        data.push(0.4 * (2.0 * std::f32::consts::PI * 200.0 * t).sin());
        data.push(0.4 * (2.0 * std::f32::consts::PI * 300.0 * t).sin());
        data.push(0.0);
    }
    write_float_wav(&settings.input, &data, 3, 44100);

    let report = run(&settings).unwrap();
    assert_eq!(report.channels, 3);
    assert_eq!(report.output_frames, 7200);

    let out = read_float_samples(&settings.output);
    assert_eq!(out.len() % 3, 0);
    assert_eq!(out.len(), 7200 * 3);

    // Silent channel only carries the injected noise
    let third = channel(&out, 3, 2);
    assert!(third.iter().all(|s| s.abs() <= 0.01));
}

#[test]
fn test_existing_output_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&dir, 0.0, 0.0, 0.0);
    write_float_wav(&settings.input, &[0.25; 100], 1, 44100);
    std::fs::write(&settings.output, b"stale contents").unwrap();

    run(&settings).unwrap();
    let out = read_float_samples(&settings.output);
    assert_eq!(out, vec![0.25; 100]);
}
