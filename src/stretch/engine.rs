//! Pitch and tempo shifting engine with a put/receive sample interface.

use log::debug;

use crate::core::resample::resample_cubic;
use crate::core::types::{try_alloc_samples, ShiftParams};
use crate::error::AnonymizeError;
use crate::stretch::wsola::Wsola;
use crate::{deinterleave, interleave};

/// Combined pitch shifter and tempo changer for interleaved audio.
///
/// Samples are submitted with [`put_samples`](Self::put_samples) and become
/// available from [`receive_samples`](Self::receive_samples) once
/// [`flush`](Self::flush) has processed them. The number of frames produced
/// is `round(frames / tempo_factor)` and is reported by
/// [`num_samples`](Self::num_samples); callers should drain what is reported
/// rather than assume a length.
///
/// Pitch is changed by time-stretching with WSOLA by `pitch / tempo` and then
/// resampling every channel to the tempo-adjusted length.
#[derive(Debug)]
pub struct ShiftEngine {
    sample_rate: u32,
    channels: u16,
    params: ShiftParams,
    pending: Vec<f32>,
    output: Vec<f32>,
}

impl ShiftEngine {
    /// Creates an engine with identity settings.
    ///
    /// # Errors
    /// Returns [`AnonymizeError::InvalidFormat`] if either argument is zero.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, AnonymizeError> {
        if sample_rate == 0 || channels == 0 {
            return Err(AnonymizeError::InvalidFormat(format!(
                "engine needs a positive rate and channel count, got {} Hz / {} ch",
                sample_rate, channels
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            params: ShiftParams::identity(),
            pending: Vec::new(),
            output: Vec::new(),
        })
    }

    /// Sets the pitch shift in semitones.
    pub fn set_pitch_semitones(&mut self, semitones: f64) -> Result<(), AnonymizeError> {
        let params = ShiftParams::new(semitones, self.params.tempo_percent);
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Sets the tempo change in percent.
    pub fn set_tempo_change(&mut self, percent: f64) -> Result<(), AnonymizeError> {
        let params = ShiftParams::new(self.params.pitch_semitones, percent);
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Applies both settings at once.
    pub fn set_params(&mut self, params: ShiftParams) -> Result<(), AnonymizeError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    #[inline]
    pub fn params(&self) -> ShiftParams {
        self.params
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Queues interleaved samples for processing.
    ///
    /// # Errors
    /// Returns [`AnonymizeError::InvalidFormat`] if `samples` is not a whole
    /// number of frames, or [`AnonymizeError::Allocation`] if the queue cannot grow.
    pub fn put_samples(&mut self, samples: &[f32]) -> Result<(), AnonymizeError> {
        if samples.len() % self.channels as usize != 0 {
            return Err(AnonymizeError::InvalidFormat(format!(
                "{} samples is not a multiple of {} channels",
                samples.len(),
                self.channels
            )));
        }
        self.pending
            .try_reserve(samples.len())
            .map_err(|_| AnonymizeError::Allocation {
                requested: self.pending.len() + samples.len(),
            })?;
        self.pending.extend_from_slice(samples);
        Ok(())
    }

    /// Frames queued but not yet processed.
    #[inline]
    pub fn unprocessed_frames(&self) -> usize {
        self.pending.len() / self.channels as usize
    }

    /// Processes everything queued so far, making it available for receiving.
    pub fn flush(&mut self) -> Result<(), AnonymizeError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let input = std::mem::take(&mut self.pending);
        let produced = self.process_block(&input)?;
        self.output
            .try_reserve(produced.len())
            .map_err(|_| AnonymizeError::Allocation {
                requested: self.output.len() + produced.len(),
            })?;
        self.output.extend_from_slice(&produced);
        Ok(())
    }

    /// Frames ready to be received.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.output.len() / self.channels as usize
    }

    /// Removes up to `max_frames` processed frames and returns them interleaved.
    pub fn receive_samples(&mut self, max_frames: usize) -> Vec<f32> {
        let frames = max_frames.min(self.num_samples());
        self.output
            .drain(..frames * self.channels as usize)
            .collect()
    }

    /// Removes and returns every processed frame.
    pub fn receive_all(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.output)
    }

    /// Discards queued and processed samples. Settings are kept.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.output.clear();
    }

    /// Runs pitch and tempo processing over one interleaved block.
    fn process_block(&mut self, input: &[f32]) -> Result<Vec<f32>, AnonymizeError> {
        let num_channels = self.channels as usize;
        let frames = input.len() / num_channels;

        if self.params.is_identity() {
            let mut out = try_alloc_samples(input.len())?;
            out.extend_from_slice(input);
            return Ok(out);
        }

        let target_frames = self.params.output_frames(frames);
        let ratio = self.params.stretch_ratio();
        debug!(
            "Shifting {} frames x {} ch at {} Hz: {} (stretch ratio {:.4}, {} frames out)",
            frames, num_channels, self.sample_rate, self.params, ratio, target_frames
        );

        let channels = deinterleave(input, num_channels);
        let mut wsola = Wsola::for_sample_rate(self.sample_rate, ratio);

        let stretched = if frames >= wsola.segment_size() {
            let stretched_frames = (frames as f64 * ratio).round() as usize;
            // Zero tail lets the last segments reach the full stretched length.
            let pad = wsola.segment_size() * 2;
            let padded: Vec<Vec<f32>> = channels
                .iter()
                .map(|ch| {
                    let mut p = Vec::with_capacity(ch.len() + pad);
                    p.extend_from_slice(ch);
                    p.resize(ch.len() + pad, 0.0);
                    p
                })
                .collect();
            let mut outputs = wsola.process_channels(&padded)?;
            for out in outputs.iter_mut() {
                out.resize(stretched_frames, 0.0);
            }
            outputs
        } else {
            debug!(
                "Input shorter than one {}-frame segment, resampling only",
                wsola.segment_size()
            );
            channels
        };

        let shaped: Vec<Vec<f32>> = stretched
            .into_iter()
            .map(|ch| {
                if ch.len() == target_frames {
                    ch
                } else {
                    resample_cubic(&ch, target_frames)
                }
            })
            .collect();

        let out = interleave(&shaped);
        debug_assert_eq!(out.len(), target_frames * num_channels);
        Ok(out)
    }
}
