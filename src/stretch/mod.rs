//! Pitch/tempo transformation stage.

pub mod engine;
pub mod wsola;

pub use engine::ShiftEngine;
pub use wsola::Wsola;

use log::info;

use crate::core::types::{try_alloc_samples, SampleBuffer, ShiftParams};
use crate::error::AnonymizeError;

/// Shifts pitch and tempo of a whole buffer, processing at the buffer's own rate.
///
/// The input buffer is consumed; the returned buffer has the same channel
/// layout and sample rate and a frame count decided by the engine.
pub fn transform(buffer: SampleBuffer, params: &ShiftParams) -> Result<SampleBuffer, AnonymizeError> {
    let rate = buffer.sample_rate();
    transform_at_rate(buffer, params, rate)
}

/// Like [`transform`], but runs the engine at `processing_rate` regardless of
/// the rate stored in the buffer. The output keeps the buffer's rate.
pub fn transform_at_rate(
    buffer: SampleBuffer,
    params: &ShiftParams,
    processing_rate: u32,
) -> Result<SampleBuffer, AnonymizeError> {
    let channels = buffer.channels();
    let sample_rate = buffer.sample_rate();
    let input_frames = buffer.num_frames();

    let mut engine = ShiftEngine::new(processing_rate, channels)?;
    engine.set_params(*params)?;
    engine.put_samples(buffer.samples())?;
    drop(buffer);
    engine.flush()?;

    let mut data = try_alloc_samples(engine.num_samples() * channels as usize)?;
    data.extend(engine.receive_all());
    let output = SampleBuffer::new(data, channels, sample_rate)?;

    info!(
        "Transformed {} -> {} frames ({})",
        input_frames,
        output.num_frames(),
        params
    );
    Ok(output)
}
