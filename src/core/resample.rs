//! Length-targeted resampling via linear and cubic interpolation.
//!
//! Pitch shifting stretches the audio by the pitch factor and then squeezes
//! it back to the tempo-adjusted length with these routines. Endpoints map
//! onto endpoints, so the first and last samples are preserved exactly.

/// Linear interpolation resampling to exactly `output_len` samples.
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    resample_with(input, output_len, |x, idx, t| {
        let next = x[(idx + 1).min(x.len() - 1)];
        x[idx] + (next - x[idx]) * t
    })
}

/// Cubic (4-point Hermite) resampling to exactly `output_len` samples.
///
/// Falls back to linear interpolation when fewer than four input samples exist.
pub fn resample_cubic(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.len() < 4 {
        return resample_linear(input, output_len);
    }
    resample_with(input, output_len, |x, idx, t| {
        let last = x.len() - 1;
        hermite(
            [
                x[idx.saturating_sub(1)],
                x[idx],
                x[(idx + 1).min(last)],
                x[(idx + 2).min(last)],
            ],
            t,
        )
    })
}

/// Maps every output index onto a fractional input position and evaluates
/// `kernel(input, whole, fraction)` there.
fn resample_with<K>(input: &[f32], output_len: usize, kernel: K) -> Vec<f32>
where
    K: Fn(&[f32], usize, f32) -> f32,
{
    match (input.len(), output_len) {
        (0, _) | (_, 0) => Vec::new(),
        (1, n) => vec![input[0]; n],
        (len, n) => {
            let last = len - 1;
            let step = last as f64 / (n.max(2) - 1) as f64;
            (0..n)
                .map(|i| {
                    let pos = i as f64 * step;
                    let idx = (pos as usize).min(last);
                    if idx == last {
                        input[last]
                    } else {
                        kernel(input, idx, (pos - idx as f64) as f32)
                    }
                })
                .collect()
        }
    }
}

/// Catmull-Rom style Hermite curve through `p[1]`..`p[2]` at `t` in `[0, 1)`.
#[inline]
fn hermite(p: [f32; 4], t: f32) -> f32 {
    let [a, b, c, d] = p;
    let slope_b = 0.5 * (c - a);
    let slope_c = 0.5 * (d - b);
    let delta = c - b;
    let t2 = t * t;
    let t3 = t2 * t;
    b + slope_b * t + (3.0 * delta - 2.0 * slope_b - slope_c) * t2
        + (slope_b + slope_c - 2.0 * delta) * t3
}
