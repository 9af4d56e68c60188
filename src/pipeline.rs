//! The load → transform → noise → write pipeline.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Settings;
use crate::core::types::{SampleBuffer, ShiftParams, REFERENCE_SAMPLE_RATE};
use crate::error::AnonymizeError;
use crate::io::wav::{read_wav_file, write_wav_file};
use crate::noise::{inject_noise, validate_noise_level};
use crate::stretch::transform_at_rate;

/// Summary of one completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub channels: u16,
    /// Rate declared by the input file (and written to the output).
    pub sample_rate: u32,
    /// Rate the shifting engine ran at.
    pub processing_rate: u32,
    pub input_frames: usize,
    pub output_frames: usize,
}

/// Transforms a buffer and adds noise, without touching the filesystem.
pub fn anonymize_buffer<R: Rng + ?Sized>(
    buffer: SampleBuffer,
    shift: &ShiftParams,
    noise_level: f32,
    processing_rate: u32,
    rng: &mut R,
) -> Result<SampleBuffer, AnonymizeError> {
    validate_noise_level(noise_level)?;
    let mut shifted = transform_at_rate(buffer, shift, processing_rate)?;
    inject_noise(&mut shifted, noise_level, rng);
    Ok(shifted)
}

/// Runs the whole pipeline from `settings.input` to `settings.output`.
///
/// Parameters are validated before any file is opened. The output is written
/// in the input's container format.
pub fn anonymize_wav_file<R: Rng + ?Sized>(
    settings: &Settings,
    rng: &mut R,
) -> Result<RunReport, AnonymizeError> {
    settings.validate()?;

    let (buffer, format) = read_wav_file(&settings.input)?;
    let input_frames = buffer.num_frames();
    info!(
        "Loaded {}: {} frames, {} ch, {} Hz ({:.2}s)",
        settings.input.display(),
        input_frames,
        buffer.channels(),
        buffer.sample_rate(),
        buffer.duration_secs()
    );

    let processing_rate = settings.rate_mode.processing_rate(format.sample_rate);
    if format.sample_rate != REFERENCE_SAMPLE_RATE {
        warn!(
            "{} declares {} Hz, not the {} Hz reference rate; processing at {} Hz",
            settings.input.display(),
            format.sample_rate,
            REFERENCE_SAMPLE_RATE,
            processing_rate
        );
    }

    let output = anonymize_buffer(
        buffer,
        &settings.shift_params(),
        settings.noise_level,
        processing_rate,
        rng,
    )?;
    info!(
        "Added noise at level {}; writing {} frames",
        settings.noise_level,
        output.num_frames()
    );

    write_wav_file(&settings.output, &output, &format)?;
    info!("Wrote {}", settings.output.display());

    Ok(RunReport {
        channels: format.channels,
        sample_rate: format.sample_rate,
        processing_rate,
        input_frames,
        output_frames: output.num_frames(),
    })
}

/// Runs the pipeline with a generator seeded from `settings.seed`, or from OS
/// entropy when no seed is set.
pub fn run(settings: &Settings) -> Result<RunReport, AnonymizeError> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    anonymize_wav_file(settings, &mut rng)
}
