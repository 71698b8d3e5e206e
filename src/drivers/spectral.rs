use rustfft::{num_complex::Complex64, FftPlanner};
use std::f64::consts::PI;
use crate::types::Band;
/// Segment length used when no Welch window duration is configured.
pub const DEFAULT_SEGMENT_LENGTH: usize = 1024;
/// One-sided power spectral density.
#[derive(Clone, Debug, Default)]
pub struct Psd {
    pub frequencies_hz: Vec<f64>,
    pub density: Vec<f64>,
}
impl Psd {
    /// Trapezoidal integral of the density over the bins inside `band` (inclusive).
    ///
    /// Fewer than two bins in range integrate to zero.
    pub fn integrate(&self, band: Band) -> f64 {
        let points: Vec<(f64, f64)> = self
            .frequencies_hz
            .iter()
            .copied()
            .zip(self.density.iter().copied())
            .filter(|(f, _)| band.contains(*f))
            .collect();
        points
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0) * (pair[0].1 + pair[1].1) * 0.5)
            .sum()
    }
}
/// Segment length Welch will actually use for an epoch of `len` samples.
///
/// The requested length shrinks to the epoch when the epoch is shorter. Returns 0
/// when there is nothing to estimate.
pub fn segment_length(len: usize, sampling_rate_hz: f64, window_seconds: Option<f64>) -> usize {
    if len < 2 {
        return 0;
    }
    let requested = match window_seconds {
        Some(seconds) => (seconds * sampling_rate_hz) as usize,
        None => DEFAULT_SEGMENT_LENGTH,
    };
    requested.clamp(2, len)
}
/// Welch PSD: periodic Hann, 50% overlap, mean detrend per segment, density scaling.
pub fn welch_psd(samples: &[f64], sampling_rate_hz: f64, segment_len: usize) -> Psd {
    if !(sampling_rate_hz > 0.0) || segment_len < 2 || samples.len() < segment_len {
        return Psd::default();
    }
    let window = periodic_hann(segment_len);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sampling_rate_hz * window_power);
    let step = segment_len - segment_len / 2;
    let n_bins = segment_len / 2 + 1;
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(segment_len);
    let mut accumulated = vec![0.0f64; n_bins];
    let mut segments = 0usize;
    let mut start = 0;
    while start + segment_len <= samples.len() {
        let segment = &samples[start..start + segment_len];
        let mean = segment.iter().sum::<f64>() / segment_len as f64;
        let mut buffer: Vec<Complex64> = segment
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex64::new((s - mean) * w, 0.0))
            .collect();
        fft.process(&mut buffer);
        for (acc, bin) in accumulated.iter_mut().zip(&buffer[..n_bins]) {
            *acc += bin.norm_sqr();
        }
        segments += 1;
        start += step;
    }
    // DC and (for even lengths) Nyquist have no mirror image in the negative half
    let unpaired_top = if segment_len % 2 == 0 { n_bins - 1 } else { n_bins };
    let density = accumulated
        .iter()
        .enumerate()
        .map(|(k, acc)| {
            let mut value = acc / segments as f64 * scale;
            if k > 0 && k < unpaired_top {
                value *= 2.0;
            }
            value
        })
        .collect();
    let resolution = sampling_rate_hz / segment_len as f64;
    let frequencies_hz = (0..n_bins).map(|k| k as f64 * resolution).collect();
    Psd {
        frequencies_hz,
        density,
    }
}
/// Power of `epoch` inside `band`, from a Welch PSD integrated with the trapezoid rule.
///
/// Never fails: a band without usable bins, an empty epoch or a bad rate give 0.0.
pub fn band_power(
    epoch: &[f64],
    sampling_rate_hz: f64,
    band: Band,
    window_seconds: Option<f64>,
) -> f64 {
    let segment_len = segment_length(epoch.len(), sampling_rate_hz, window_seconds);
    welch_psd(epoch, sampling_rate_hz, segment_len).integrate(band)
}
/// Number of PSD bins that fall inside `band` for an epoch of `epoch_len` samples.
pub fn band_bin_count(
    epoch_len: usize,
    sampling_rate_hz: f64,
    band: Band,
    window_seconds: Option<f64>,
) -> usize {
    let segment_len = segment_length(epoch_len, sampling_rate_hz, window_seconds);
    if segment_len < 2 || !(sampling_rate_hz > 0.0) {
        return 0;
    }
    let resolution = sampling_rate_hz / segment_len as f64;
    (0..=segment_len / 2)
        .filter(|&k| band.contains(k as f64 * resolution))
        .count()
}
fn periodic_hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}
