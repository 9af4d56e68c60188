use crate::error::AnonymizeError;

/// A single audio sample (32-bit float, nominal range -1.0 to 1.0).
pub type Sample = f32;

/// Processing rate the legacy pipeline assumed for every input.
pub const REFERENCE_SAMPLE_RATE: u32 = 44100;

/// Default pitch shift in semitones.
pub const DEFAULT_PITCH_SEMITONES: f64 = 5.0;
/// Default tempo change in percent.
pub const DEFAULT_TEMPO_PERCENT: f64 = 10.0;
/// Default noise amplitude as a fraction of full scale.
pub const DEFAULT_NOISE_LEVEL: f32 = 0.02;

/// Accepted pitch shift range in semitones (two octaves either way).
pub const PITCH_SEMITONES_MIN: f64 = -24.0;
pub const PITCH_SEMITONES_MAX: f64 = 24.0;
/// Accepted tempo change range in percent.
pub const TEMPO_PERCENT_MIN: f64 = -50.0;
pub const TEMPO_PERCENT_MAX: f64 = 100.0;

/// Reserves a vector of exactly `len` samples, reporting failure instead of aborting.
pub fn try_alloc_samples(len: usize) -> Result<Vec<Sample>, AnonymizeError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| AnonymizeError::Allocation { requested: len })?;
    Ok(data)
}

/// Interleaved audio held in memory between pipeline stages.
///
/// For mono audio, samples are stored sequentially: `[s0, s1, s2, ...]`
/// For stereo audio, samples are interleaved: `[L0, R0, L1, R1, ...]`
///
/// The sample count is always a whole number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    data: Vec<Sample>,
    channels: u16,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Creates a buffer from interleaved samples.
    ///
    /// # Errors
    /// Returns [`AnonymizeError::InvalidFormat`] if `channels` or `sample_rate`
    /// is zero, or if `data` is not a whole number of frames.
    pub fn new(data: Vec<Sample>, channels: u16, sample_rate: u32) -> Result<Self, AnonymizeError> {
        if channels == 0 {
            return Err(AnonymizeError::InvalidFormat(
                "channel count must be at least 1".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(AnonymizeError::InvalidFormat(
                "sample rate must be positive".to_string(),
            ));
        }
        if data.len() % channels as usize != 0 {
            return Err(AnonymizeError::InvalidFormat(format!(
                "{} samples is not a multiple of {} channels",
                data.len(),
                channels
            )));
        }
        Ok(Self {
            data,
            channels,
            sample_rate,
        })
    }

    /// Creates an empty buffer with the given layout.
    pub fn empty(channels: u16, sample_rate: u32) -> Result<Self, AnonymizeError> {
        Self::new(Vec::new(), channels, sample_rate)
    }

    /// Builds a buffer from separate, equal-length channel vectors.
    pub fn from_channels(
        channels_data: &[Vec<Sample>],
        sample_rate: u32,
    ) -> Result<Self, AnonymizeError> {
        if channels_data.is_empty() || channels_data.len() > u16::MAX as usize {
            return Err(AnonymizeError::InvalidFormat(format!(
                "unsupported channel count: {}",
                channels_data.len()
            )));
        }
        let num_frames = channels_data[0].len();
        if channels_data.iter().any(|ch| ch.len() != num_frames) {
            return Err(AnonymizeError::InvalidFormat(
                "all channels must have the same number of frames".to_string(),
            ));
        }
        let mut data = try_alloc_samples(num_frames * channels_data.len())?;
        for i in 0..num_frames {
            data.extend(channels_data.iter().map(|ch| ch[i]));
        }
        Self::new(data, channels_data.len() as u16, sample_rate)
    }

    /// Interleaved sample data.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.data
    }

    /// Mutable access to the samples. The length cannot change through this slice.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [Sample] {
        &mut self.data
    }

    /// Consumes the buffer and returns the raw interleaved samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.data
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of samples across all channels.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.data.len()
    }

    /// Number of frames in the buffer (total samples / channels).
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Returns true if the buffer contains no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a single channel's data as a new vector.
    pub fn channel_data(&self, channel: u16) -> Vec<Sample> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.data
            .iter()
            .skip(channel as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Splits the buffer into one vector per channel.
    pub fn to_channels(&self) -> Vec<Vec<Sample>> {
        (0..self.channels).map(|ch| self.channel_data(ch)).collect()
    }
}

/// Sample encoding of a WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Signed (or 8-bit unsigned) integer PCM.
    Int,
    /// IEEE float.
    Float,
}

/// Container metadata carried unchanged from the loader to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub encoding: SampleEncoding,
}

impl WavFormat {
    /// 32-bit float format with the given layout.
    pub fn float32(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 32,
            encoding: SampleEncoding::Float,
        }
    }

    /// 16-bit integer PCM format with the given layout.
    pub fn pcm16(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: 16,
            encoding: SampleEncoding::Int,
        }
    }

    pub fn to_spec(self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: match self.encoding {
                SampleEncoding::Int => hound::SampleFormat::Int,
                SampleEncoding::Float => hound::SampleFormat::Float,
            },
        }
    }
}

impl From<hound::WavSpec> for WavFormat {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            encoding: match spec.sample_format {
                hound::SampleFormat::Int => SampleEncoding::Int,
                hound::SampleFormat::Float => SampleEncoding::Float,
            },
        }
    }
}

/// Pitch and tempo settings for the shifting engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftParams {
    /// Pitch shift in semitones (positive raises pitch).
    pub pitch_semitones: f64,
    /// Tempo change in percent (positive shortens the audio).
    pub tempo_percent: f64,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            pitch_semitones: DEFAULT_PITCH_SEMITONES,
            tempo_percent: DEFAULT_TEMPO_PERCENT,
        }
    }
}

impl ShiftParams {
    pub fn new(pitch_semitones: f64, tempo_percent: f64) -> Self {
        Self {
            pitch_semitones,
            tempo_percent,
        }
    }

    /// Parameters that leave the audio untouched.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Frequency multiplier: `2^(semitones / 12)`.
    #[inline]
    pub fn pitch_factor(&self) -> f64 {
        (self.pitch_semitones / 12.0).exp2()
    }

    /// Playback speed multiplier: `1 + percent / 100`.
    #[inline]
    pub fn tempo_factor(&self) -> f64 {
        1.0 + self.tempo_percent / 100.0
    }

    /// Time-stretch ratio applied before resampling (>1.0 = longer).
    #[inline]
    pub fn stretch_ratio(&self) -> f64 {
        self.pitch_factor() / self.tempo_factor()
    }

    /// Returns true if neither pitch nor tempo is changed.
    pub fn is_identity(&self) -> bool {
        self.pitch_semitones == 0.0 && self.tempo_percent == 0.0
    }

    /// Output frame count for `input_frames` frames of input.
    pub fn output_frames(&self, input_frames: usize) -> usize {
        if self.is_identity() {
            return input_frames;
        }
        (input_frames as f64 / self.tempo_factor()).round() as usize
    }

    /// Checks that both settings are finite and inside the supported range.
    pub fn validate(&self) -> Result<(), AnonymizeError> {
        if !self.pitch_semitones.is_finite()
            || !(PITCH_SEMITONES_MIN..=PITCH_SEMITONES_MAX).contains(&self.pitch_semitones)
        {
            return Err(AnonymizeError::InvalidParams(format!(
                "pitch shift must be between {} and {} semitones, got {}",
                PITCH_SEMITONES_MIN, PITCH_SEMITONES_MAX, self.pitch_semitones
            )));
        }
        if !self.tempo_percent.is_finite()
            || !(TEMPO_PERCENT_MIN..=TEMPO_PERCENT_MAX).contains(&self.tempo_percent)
        {
            return Err(AnonymizeError::InvalidParams(format!(
                "tempo change must be between {}% and {}%, got {}%",
                TEMPO_PERCENT_MIN, TEMPO_PERCENT_MAX, self.tempo_percent
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ShiftParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pitch {:+.2} st (x{:.4}), tempo {:+.1}% (x{:.4})",
            self.pitch_semitones,
            self.pitch_factor(),
            self.tempo_percent,
            self.tempo_factor()
        )
    }
}
