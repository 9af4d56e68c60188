#![allow(dead_code)]

use std::f32::consts::PI;
use std::path::Path;

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

/// Interleaved stereo: `freq_l` on the left, `freq_r` on the right.
pub fn gen_stereo(freq_l: f32, freq_r: f32, sr: u32, frames: usize, amp: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / sr as f32;
        data.push(amp * (2.0 * PI * freq_l * t).sin());
        data.push(amp * (2.0 * PI * freq_r * t).sin());
    }
    data
}

/// Vowel-like test signal: 150 Hz fundamental with decaying harmonics and a
/// slow amplitude wobble.
pub fn gen_voice_like(sr: u32, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            let env = 0.6 + 0.4 * (2.0 * PI * 3.0 * t).sin();
            let tone: f32 = (1..=6)
                .map(|h| (2.0 * PI * 150.0 * h as f32 * t).sin() / h as f32)
                .sum();
            0.25 * env * tone
        })
        .collect()
}

pub fn write_float_wav(path: &Path, samples: &[f32], channels: u16, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create float wav");
    for &s in samples {
        writer.write_sample(s).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

pub fn write_pcm16_wav(path: &Path, samples: &[f32], channels: u16, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create pcm16 wav");
    for &s in samples {
        let raw = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        writer.write_sample(raw).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

pub fn read_spec(path: &Path) -> hound::WavSpec {
    hound::WavReader::open(path).expect("open wav").spec()
}

pub fn read_float_samples(path: &Path) -> Vec<f32> {
    let mut reader = hound::WavReader::open(path).expect("open wav");
    reader
        .samples::<f32>()
        .map(|s| s.expect("read sample"))
        .collect()
}

pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

pub fn count_positive_zero_crossings(signal: &[f32]) -> usize {
    signal
        .windows(2)
        .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
        .count()
}

/// Dominant frequency estimated from rising zero crossings.
pub fn estimate_freq_zero_crossings(signal: &[f32], sr: u32) -> f64 {
    if signal.len() < 2 {
        return 0.0;
    }
    let crossings = count_positive_zero_crossings(signal) as f64;
    crossings / (signal.len() as f64 / sr as f64)
}

/// Every `channels`-th sample starting at `channel`.
pub fn channel(samples: &[f32], channels: usize, channel: usize) -> Vec<f32> {
    samples.iter().skip(channel).step_by(channels).copied().collect()
}
