//! Uniform noise injection.

use log::debug;
use rand::Rng;

use crate::core::types::SampleBuffer;
use crate::error::AnonymizeError;

/// Checks that a noise level is finite and non-negative.
pub fn validate_noise_level(level: f32) -> Result<(), AnonymizeError> {
    if !level.is_finite() || level < 0.0 {
        return Err(AnonymizeError::InvalidParams(format!(
            "noise level must be a non-negative number, got {}",
            level
        )));
    }
    Ok(())
}

/// Adds `level * (u - 0.5)`, `u` uniform in `[0, 1)`, to every sample in place.
///
/// Each perturbation lies in `[-level/2, +level/2)`. A level of zero leaves
/// the buffer untouched and draws nothing from `rng`.
pub fn inject_noise<R: Rng + ?Sized>(buffer: &mut SampleBuffer, level: f32, rng: &mut R) {
    if level == 0.0 || buffer.is_empty() {
        return;
    }
    for sample in buffer.samples_mut() {
        let u: f32 = rng.gen();
        *sample += level * (u - 0.5);
    }
    debug!(
        "Injected noise at level {} into {} samples",
        level,
        buffer.num_samples()
    );
}
