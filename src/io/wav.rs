use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::core::types::{try_alloc_samples, SampleBuffer, SampleEncoding, WavFormat};
use crate::error::AnonymizeError;

/// Label used in errors for in-memory WAV data.
const MEMORY_LABEL: &str = "<memory>";

/// Reads a whole WAV file into an interleaved float buffer.
///
/// Integer PCM is scaled to `[-1.0, 1.0)`; float data is passed through.
/// The returned [`WavFormat`] describes the container so the writer can
/// reproduce it.
///
/// # Errors
///
/// [`AnonymizeError::Io`] if the file cannot be opened,
/// [`AnonymizeError::Wav`] if it is not a decodable WAV file, and
/// [`AnonymizeError::Allocation`] if the sample buffer cannot be sized.
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<(SampleBuffer, WavFormat), AnonymizeError> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path).map_err(|e| AnonymizeError::wav(path, e))?;
    let decoded = decode(reader, path)?;
    debug!(
        "Read {}: {} frames, {} ch, {} Hz, {}-bit {:?}",
        path.display(),
        decoded.0.num_frames(),
        decoded.1.channels,
        decoded.1.sample_rate,
        decoded.1.bits_per_sample,
        decoded.1.encoding
    );
    Ok(decoded)
}

/// Decodes WAV data held in memory.
pub fn read_wav(data: &[u8]) -> Result<(SampleBuffer, WavFormat), AnonymizeError> {
    let reader =
        hound::WavReader::new(Cursor::new(data)).map_err(|e| AnonymizeError::wav(MEMORY_LABEL, e))?;
    decode(reader, Path::new(MEMORY_LABEL))
}

fn decode<R: Read>(
    reader: hound::WavReader<R>,
    path: &Path,
) -> Result<(SampleBuffer, WavFormat), AnonymizeError> {
    let format = WavFormat::from(reader.spec());
    let total = reader.len() as usize;
    let mut data = try_alloc_samples(total)?;

    match format.encoding {
        SampleEncoding::Float => {
            for sample in reader.into_samples::<f32>() {
                data.push(sample.map_err(|e| AnonymizeError::wav(path, e))?);
            }
        }
        SampleEncoding::Int => {
            let scale = int_full_scale(format.bits_per_sample);
            for sample in reader.into_samples::<i32>() {
                let raw = sample.map_err(|e| AnonymizeError::wav(path, e))?;
                data.push((raw as f64 / scale) as f32);
            }
        }
    }

    let buffer = SampleBuffer::new(data, format.channels, format.sample_rate)?;
    Ok((buffer, format))
}

/// Writes a buffer to `path` in the given container format.
///
/// The data is written to a hidden sibling file first and renamed over
/// `path` only after the WAV header has been finalized, so a failed write
/// never leaves a truncated file at `path`.
///
/// # Errors
///
/// [`AnonymizeError::InvalidFormat`] if the buffer layout disagrees with
/// `format`, [`AnonymizeError::Io`] / [`AnonymizeError::Wav`] if the file
/// cannot be created, written or moved into place.
pub fn write_wav_file(
    path: impl AsRef<Path>,
    buffer: &SampleBuffer,
    format: &WavFormat,
) -> Result<(), AnonymizeError> {
    let path = path.as_ref();
    check_layout(buffer, format)?;

    let tmp_path = temp_path_for(path);
    let result = hound::WavWriter::create(&tmp_path, format.to_spec())
        .map_err(|e| AnonymizeError::wav(path, e))
        .and_then(|writer| encode(writer, buffer, format, path))
        .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| AnonymizeError::io(path, e)));

    if result.is_err() {
        // Nothing useful to report if the partial file is already gone.
        let _ = fs::remove_file(&tmp_path);
    }
    result?;

    debug!(
        "Wrote {}: {} frames, {}-bit {:?}",
        path.display(),
        buffer.num_frames(),
        format.bits_per_sample,
        format.encoding
    );
    Ok(())
}

/// Encodes a buffer as WAV bytes in the given container format.
pub fn write_wav(buffer: &SampleBuffer, format: &WavFormat) -> Result<Vec<u8>, AnonymizeError> {
    check_layout(buffer, format)?;
    let label = Path::new(MEMORY_LABEL);
    let mut cursor = Cursor::new(Vec::new());
    let writer = hound::WavWriter::new(&mut cursor, format.to_spec())
        .map_err(|e| AnonymizeError::wav(label, e))?;
    encode(writer, buffer, format, label)?;
    Ok(cursor.into_inner())
}

fn encode<W: Write + Seek>(
    mut writer: hound::WavWriter<W>,
    buffer: &SampleBuffer,
    format: &WavFormat,
    path: &Path,
) -> Result<(), AnonymizeError> {
    match format.encoding {
        SampleEncoding::Float => {
            for &s in buffer.samples() {
                writer
                    .write_sample(s)
                    .map_err(|e| AnonymizeError::wav(path, e))?;
            }
        }
        SampleEncoding::Int => {
            let scale = int_full_scale(format.bits_per_sample);
            let max = scale - 1.0;
            let mut clipped = 0usize;
            for &s in buffer.samples() {
                if !(-1.0..=1.0).contains(&s) {
                    clipped += 1;
                }
                let raw = (s as f64 * scale).round().clamp(-scale, max) as i32;
                writer
                    .write_sample(raw)
                    .map_err(|e| AnonymizeError::wav(path, e))?;
            }
            if clipped > 0 {
                warn!(
                    "{} of {} samples clipped while writing {}",
                    clipped,
                    buffer.num_samples(),
                    path.display()
                );
            }
        }
    }
    writer.finalize().map_err(|e| AnonymizeError::wav(path, e))
}

/// Full-scale magnitude of a signed integer sample with `bits` bits.
#[inline]
fn int_full_scale(bits: u16) -> f64 {
    (1u64 << (bits.clamp(1, 32) - 1)) as f64
}

fn check_layout(buffer: &SampleBuffer, format: &WavFormat) -> Result<(), AnonymizeError> {
    if buffer.channels() != format.channels {
        return Err(AnonymizeError::InvalidFormat(format!(
            "buffer has {} channels but the output format has {}",
            buffer.channels(),
            format.channels
        )));
    }
    Ok(())
}

/// Hidden sibling path used while an output file is being written.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.wav".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
