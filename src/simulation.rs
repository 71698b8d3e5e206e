// src/simulation.rs
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;
use std::thread;
use std::time::{Duration, Instant};

use crate::drivers::{SampleSource, SourceError};

/// Fake EEG: a 10 Hz alpha tone, a 20 Hz beta tone and uniform noise.
pub struct SyntheticSource {
    sampling_rate_hz: f64,
    alpha_amplitude: f64,
    beta_amplitude: f64,
    noise_amplitude: f64,
    rng: StdRng,
    index: u64,
    // 实时节拍: None 表示尽快产出 (测试用)
    pacing: Option<(Instant, Duration)>,
}

impl SyntheticSource {
    pub fn new(
        sampling_rate_hz: f64,
        alpha_amplitude: f64,
        beta_amplitude: f64,
        noise_amplitude: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            sampling_rate_hz,
            alpha_amplitude,
            beta_amplitude,
            noise_amplitude: noise_amplitude.abs(),
            rng,
            index: 0,
            pacing: None,
        }
    }

    /// Emit samples at the nominal rate instead of as fast as they are pulled.
    pub fn paced(mut self) -> Self {
        let period = Duration::from_secs_f64(1.0 / self.sampling_rate_hz);
        self.pacing = Some((Instant::now(), period));
        self
    }

    fn sample_at(&mut self, t: f64) -> f64 {
        let alpha = self.alpha_amplitude * (2.0 * PI * 10.0 * t).sin();
        let beta = self.beta_amplitude * (2.0 * PI * 20.0 * t).sin();
        let noise = if self.noise_amplitude > 0.0 {
            self.rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
        } else {
            0.0
        };
        alpha + beta + noise
    }
}

impl SampleSource for SyntheticSource {
    fn read_next(&mut self) -> Result<f64, SourceError> {
        if let Some((started, period)) = self.pacing {
            // sleep until this sample's slot so the stream does not drift
            let due = started + period.mul_f64(self.index as f64);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
        }
        let t = self.index as f64 / self.sampling_rate_hz;
        self.index += 1;
        Ok(self.sample_at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::spectral::band_power;
    use crate::types::Band;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = SyntheticSource::new(256.0, 50.0, 30.0, 5.0, Some(4));
        let mut b = SyntheticSource::new(256.0, 50.0, 30.0, 5.0, Some(4));
        for _ in 0..100 {
            assert_eq!(a.read_next().unwrap(), b.read_next().unwrap());
        }
    }

    #[test]
    fn noise_stays_within_amplitude() {
        let mut source = SyntheticSource::new(256.0, 0.0, 0.0, 5.0, Some(1));
        for _ in 0..1000 {
            assert!(source.read_next().unwrap().abs() <= 5.0);
        }
    }

    #[test]
    fn default_mix_clears_the_stock_threshold() {
        let mut source = SyntheticSource::new(256.0, 50.0, 30.0, 5.0, Some(2));
        let epoch: Vec<f64> = (0..512).map(|_| source.read_next().unwrap()).collect();
        let alpha = band_power(&epoch, 256.0, Band::new(8.0, 12.0), None);
        let beta = band_power(&epoch, 256.0, Band::new(13.0, 30.0), None);
        assert!(alpha > 1000.0, "alpha = {alpha}");
        assert!(beta > 300.0, "beta = {beta}");
    }

    #[test]
    fn pacing_follows_the_sampling_rate() {
        let mut source = SyntheticSource::new(1000.0, 1.0, 0.0, 0.0, Some(0)).paced();
        let start = Instant::now();
        for _ in 0..51 {
            source.read_next().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
