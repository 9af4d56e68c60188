//! WSOLA (Waveform Similarity Overlap-Add) time stretching.

use crate::error::AnonymizeError;
use rustfft::{num_complex::Complex, FftPlanner};

const ENERGY_EPSILON: f64 = 1e-12;
/// Candidate count above which the search switches to FFT correlation.
const FFT_CANDIDATE_THRESHOLD: usize = 64;
/// Shortest overlap worth correlating through the FFT.
const FFT_OVERLAP_THRESHOLD: usize = 32;
/// Segment length in seconds (~20ms).
const SEGMENT_SECS: f64 = 0.020;
/// Similarity search radius in seconds (~10ms).
const SEARCH_SECS: f64 = 0.010;
/// Smallest usable segment, for very low sample rates.
const MIN_SEGMENT_SIZE: usize = 16;

/// WSOLA (Waveform Similarity Overlap-Add) time stretching.
///
/// Segments are laid down at a fixed output hop of half a segment. For each
/// one, the input is read around `output_pos / stretch_ratio`, and the exact
/// read position is chosen by cross-correlating candidates against the
/// already-written overlap region.
///
/// Multi-channel input is searched on a mono mix so every channel is cut at
/// the same positions and inter-channel phase is preserved.
pub struct Wsola {
    segment_size: usize,
    overlap_size: usize,
    search_range: usize,
    stretch_ratio: f64,
    correlator: Correlator,
}

impl Wsola {
    pub fn new(segment_size: usize, search_range: usize, stretch_ratio: f64) -> Self {
        Self {
            segment_size,
            overlap_size: segment_size / 2,
            search_range,
            stretch_ratio,
            correlator: Correlator::new(),
        }
    }

    /// Creates a processor with segment and search sizes scaled to `sample_rate`.
    pub fn for_sample_rate(sample_rate: u32, stretch_ratio: f64) -> Self {
        let segment_size = ((SEGMENT_SECS * sample_rate as f64) as usize).max(MIN_SEGMENT_SIZE);
        let search_range = ((SEARCH_SECS * sample_rate as f64) as usize).max(1);
        Self::new(segment_size, search_range, stretch_ratio)
    }

    #[inline]
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    #[inline]
    pub fn search_range(&self) -> usize {
        self.search_range
    }

    #[inline]
    pub fn stretch_ratio(&self) -> f64 {
        self.stretch_ratio
    }

    /// Stretches a single channel.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, AnonymizeError> {
        let mut outputs = self.process_channels(&[input])?;
        Ok(outputs.pop().unwrap_or_default())
    }

    /// Stretches several equal-length channels with shared segment positions.
    ///
    /// Output channels are `round(len * stretch_ratio)` samples long at most;
    /// they come up short only when the input runs out before the last
    /// segment fits.
    pub fn process_channels<C: AsRef<[f32]>>(
        &mut self,
        channels: &[C],
    ) -> Result<Vec<Vec<f32>>, AnonymizeError> {
        let len = channels.first().map(|c| c.as_ref().len()).unwrap_or(0);
        if channels.iter().any(|c| c.as_ref().len() != len) {
            return Err(AnonymizeError::InvalidFormat(
                "all channels must have the same length".to_string(),
            ));
        }
        if len < self.segment_size {
            return Err(AnonymizeError::InputTooShort {
                provided: len,
                minimum: self.segment_size,
            });
        }
        if !self.stretch_ratio.is_finite() || self.stretch_ratio <= 0.0 {
            return Err(AnonymizeError::InvalidParams(format!(
                "stretch ratio must be positive, got {}",
                self.stretch_ratio
            )));
        }

        let guide = mix_down(channels);
        let hop = self.segment_size - self.overlap_size;
        let read_step = hop as f64 / self.stretch_ratio;
        let target_len = (len as f64 * self.stretch_ratio).round() as usize;

        // Every channel starts with the untouched first segment.
        let capacity = target_len + self.segment_size * 2;
        let seeded = |signal: &[f32]| {
            let mut out = vec![0.0f32; capacity];
            out[..self.segment_size].copy_from_slice(&signal[..self.segment_size]);
            out
        };
        let mut guide_out = seeded(guide.as_slice());
        let mut outputs: Vec<Vec<f32>> = channels.iter().map(|ch| seeded(ch.as_ref())).collect();

        let mut read_pos = read_step;
        let mut write_pos = hop;
        let mut written = self.segment_size;

        while written < target_len && read_pos as usize + self.segment_size <= len {
            let needed = write_pos + self.segment_size;
            if needed > guide_out.len() {
                guide_out.resize(needed, 0.0);
                outputs.iter_mut().for_each(|out| out.resize(needed, 0.0));
            }

            let best = self.find_best_position(&guide, &guide_out, read_pos as usize, write_pos);
            self.splice(&guide, &mut guide_out, best, write_pos);
            for (ch, out) in channels.iter().zip(outputs.iter_mut()) {
                self.splice(ch.as_ref(), out, best, write_pos);
            }

            written = written.max(needed);
            read_pos += read_step;
            write_pos += hop;
        }

        let final_len = written.min(target_len);
        outputs.iter_mut().for_each(|out| out.truncate(final_len));
        Ok(outputs)
    }

    /// Picks the read position near `nominal` whose opening samples best
    /// continue what is already written at `write_pos`.
    fn find_best_position(
        &mut self,
        guide: &[f32],
        written: &[f32],
        nominal: usize,
        write_pos: usize,
    ) -> usize {
        let last_start = guide.len().saturating_sub(self.segment_size);
        let nominal = nominal.min(last_start);
        let lo = nominal.saturating_sub(self.search_range);
        let hi = (nominal + self.search_range).min(last_start);
        let overlap = self
            .overlap_size
            .min(written.len().saturating_sub(write_pos));
        if lo >= hi || overlap == 0 {
            return nominal;
        }

        let reference = &written[write_pos..write_pos + overlap];
        let reference_energy = energy(reference);
        if reference_energy < ENERGY_EPSILON {
            // Nothing to match against; stay on the nominal grid.
            return nominal;
        }

        let region = &guide[lo..hi + overlap];
        let lags = hi - lo + 1;
        let dots = if lags > FFT_CANDIDATE_THRESHOLD && overlap >= FFT_OVERLAP_THRESHOLD {
            self.correlator.correlate(reference, region, lags)
        } else {
            direct_dots(reference, region, lags)
        };
        lo + best_lag(&dots, region, overlap, reference_energy)
    }

    /// Copies one segment from `source[read..]` to `dest[write..]`,
    /// cross-fading linearly over the overlap.
    fn splice(&self, source: &[f32], dest: &mut [f32], read: usize, write: usize) {
        let n = self
            .segment_size
            .min(source.len().saturating_sub(read))
            .min(dest.len().saturating_sub(write));
        let fade = self.overlap_size.min(n);
        let src = &source[read..read + n];
        let dst = &mut dest[write..write + n];

        for (i, (d, &s)) in dst.iter_mut().zip(src).enumerate() {
            if i < fade {
                let w = i as f32 / self.overlap_size as f32;
                *d += (s - *d) * w;
            } else {
                *d = s;
            }
        }
    }
}

/// FFT cross-correlation with buffers kept between segments.
struct Correlator {
    planner: FftPlanner<f32>,
    reference: Vec<Complex<f32>>,
    region: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl Correlator {
    fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            reference: Vec::new(),
            region: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Dot product of `reference` with `region[lag..]` for each lag in `0..lags`.
    fn correlate(&mut self, reference: &[f32], region: &[f32], lags: usize) -> Vec<f64> {
        let size = (region.len() + reference.len() - 1).next_power_of_two();
        let forward = self.planner.plan_fft_forward(size);
        let inverse = self.planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        self.scratch.resize(scratch_len, Complex::default());

        load(&mut self.reference, reference, size);
        load(&mut self.region, region, size);
        forward.process_with_scratch(&mut self.reference, &mut self.scratch);
        forward.process_with_scratch(&mut self.region, &mut self.scratch);
        for (s, r) in self.region.iter_mut().zip(&self.reference) {
            *s *= r.conj();
        }
        inverse.process_with_scratch(&mut self.region, &mut self.scratch);

        let norm = 1.0 / size as f64;
        self.region[..lags]
            .iter()
            .map(|c| c.re as f64 * norm)
            .collect()
    }
}

fn load(buf: &mut Vec<Complex<f32>>, signal: &[f32], size: usize) {
    buf.clear();
    buf.extend(signal.iter().map(|&s| Complex::new(s, 0.0)));
    buf.resize(size, Complex::default());
}

fn direct_dots(reference: &[f32], region: &[f32], lags: usize) -> Vec<f64> {
    (0..lags)
        .map(|lag| {
            reference
                .iter()
                .zip(&region[lag..])
                .map(|(&a, &b)| a as f64 * b as f64)
                .sum()
        })
        .collect()
}

/// Index of the highest energy-normalized score. Window energies are
/// tracked with a running sum as the window slides over `region`.
fn best_lag(dots: &[f64], region: &[f32], overlap: usize, reference_energy: f64) -> usize {
    let mut window = energy(&region[..overlap]);
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;

    for (lag, &dot) in dots.iter().enumerate() {
        if lag > 0 {
            let leaving = region[lag - 1] as f64;
            let entering = region[lag + overlap - 1] as f64;
            window = (window - leaving * leaving + entering * entering).max(0.0);
        }
        let denom = (reference_energy * window).sqrt();
        let score = if denom > ENERGY_EPSILON { dot / denom } else { 0.0 };
        if score > best_score {
            best_score = score;
            best = lag;
        }
    }
    best
}

#[inline]
fn energy(signal: &[f32]) -> f64 {
    signal.iter().map(|&s| s as f64 * s as f64).sum()
}

/// Averages equal-length channels into one guide signal.
fn mix_down<C: AsRef<[f32]>>(channels: &[C]) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [only] => only.as_ref().to_vec(),
        _ => {
            let len = channels[0].as_ref().len();
            let scale = 1.0 / channels.len() as f32;
            (0..len)
                .map(|i| channels.iter().map(|ch| ch.as_ref()[i]).sum::<f32>() * scale)
                .collect()
        }
    }
}
