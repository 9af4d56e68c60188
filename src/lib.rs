#![forbid(unsafe_code)]
//! Voice obfuscation for WAV recordings.
//!
//! `voice_anonymizer` loads a WAV file, shifts its pitch and tempo with a
//! WSOLA time stretcher plus cubic resampling, adds uniform noise, and writes
//! the result in the same container format as the input.
//!
//! The transform is an obfuscation heuristic. It makes a voice harder to
//! recognise by ear; it does not guarantee anonymity.
//!
//! # Quick Start
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use voice_anonymizer::{anonymize_buffer, SampleBuffer, ShiftParams};
//!
//! // 1 second of 220 Hz sine, mono, 44.1 kHz
//! let data: Vec<f32> = (0..44100)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! let buffer = SampleBuffer::new(data, 1, 44100).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let out = anonymize_buffer(buffer, &ShiftParams::new(5.0, 10.0), 0.02, 44100, &mut rng).unwrap();
//! assert_eq!(out.num_frames(), 40091); // 10% faster
//! ```
//!
//! # Engine
//!
//! For finer control, drive [`ShiftEngine`] directly:
//!
//! ```
//! use voice_anonymizer::ShiftEngine;
//!
//! let mut engine = ShiftEngine::new(44100, 2).unwrap();
//! engine.set_pitch_semitones(-3.0).unwrap();
//! engine.set_tempo_change(-20.0).unwrap();
//! engine.put_samples(&vec![0.0; 2 * 8820]).unwrap();
//! engine.flush().unwrap();
//! assert_eq!(engine.num_samples(), 11025);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod noise;
pub mod pipeline;
pub mod stretch;

pub use config::{RateMode, Settings};
pub use crate::core::types::{SampleBuffer, SampleEncoding, ShiftParams, WavFormat};
pub use error::AnonymizeError;
pub use noise::inject_noise;
pub use pipeline::{anonymize_buffer, anonymize_wav_file, run, RunReport};
pub use stretch::{transform, transform_at_rate, ShiftEngine};

/// Deinterleaves multi-channel audio into separate per-channel vectors.
#[inline]
pub(crate) fn deinterleave(input: &[f32], num_channels: usize) -> Vec<Vec<f32>> {
    (0..num_channels)
        .map(|ch| {
            input
                .iter()
                .skip(ch)
                .step_by(num_channels)
                .copied()
                .collect()
        })
        .collect()
}

/// Interleaves per-channel vectors into a single buffer, truncating to the shortest channel.
#[inline]
pub(crate) fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let min_len = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    (0..min_len)
        .flat_map(|i| channels.iter().map(move |ch| ch[i]))
        .collect()
}
