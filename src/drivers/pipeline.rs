use log::{debug, info, warn};
use crate::config::PipelineConfig;
use crate::drivers::controller::{ActuationController, Actuator};
use crate::drivers::history::PowerHistory;
use crate::drivers::plot::FrameSink;
use crate::drivers::spectral::{band_bin_count, band_power};
use crate::drivers::SharedBuffer;
use crate::types::{Band, BandPowerReading, Transition, VisualFrame};
/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Fewer than one epoch of samples so far; nothing was evaluated.
    NotReady,
    Evaluated {
        reading: BandPowerReading,
        transition: Option<Transition>,
    },
}
/// Per-tick compute-and-evaluate cycle.
///
/// Owns the power history and the controller; the buffer is borrowed per tick.
pub struct SignalPipeline<A: Actuator, V: FrameSink> {
    epoch_length: usize,
    sampling_rate_hz: f64,
    alpha_band: Band,
    beta_band: Band,
    window_seconds: Option<f64>,
    history: PowerHistory,
    controller: ActuationController,
    actuator: A,
    sink: V,
}
impl<A: Actuator, V: FrameSink> SignalPipeline<A, V> {
    pub fn new(config: &PipelineConfig, actuator: A, sink: V) -> Self {
        let epoch_length = config.epoch_length();
        for (name, band) in [("alpha", config.alpha_band), ("beta", config.beta_band)] {
            let bins = band_bin_count(
                epoch_length,
                config.sampling_rate_hz,
                band,
                config.welch_window_seconds,
            );
            if bins < 2 {
                warn!(
                    "{name} band {:.1}-{:.1} Hz has {bins} usable frequency bin(s) at {} Hz; its power will read 0",
                    band.low_hz, band.high_hz, config.sampling_rate_hz
                );
            }
        }
        Self {
            epoch_length,
            sampling_rate_hz: config.sampling_rate_hz,
            alpha_band: config.alpha_band,
            beta_band: config.beta_band,
            window_seconds: config.welch_window_seconds,
            history: PowerHistory::new(config.max_plot_points),
            controller: ActuationController::new(config.threshold),
            actuator,
            sink,
        }
    }
    #[cfg(test)]
    pub fn state(&self) -> crate::types::ActuatorState {
        self.controller.state()
    }
    #[cfg(test)]
    pub fn history(&self) -> &PowerHistory {
        &self.history
    }
    #[cfg(test)]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
    pub fn tick(&mut self, buffer: &SharedBuffer) -> TickOutcome {
        let Some(epoch) = buffer.latest_window(self.epoch_length) else {
            let raw = buffer.tail(self.epoch_length);
            self.present(VisualFrame {
                raw,
                state: self.controller.state(),
                ..VisualFrame::default()
            });
            return TickOutcome::NotReady;
        };
        let reading = BandPowerReading {
            alpha: band_power(&epoch, self.sampling_rate_hz, self.alpha_band, self.window_seconds),
            beta: band_power(&epoch, self.sampling_rate_hz, self.beta_band, self.window_seconds),
        };
        self.history.record(reading);
        let transition = self
            .controller
            .evaluate(self.history.latest(), &mut self.actuator);
        debug!("alpha {:.2} beta {:.2}", reading.alpha, reading.beta);
        match transition {
            Some(Transition::Engaged) => info!(
                "walking activated (alpha {:.1}, beta {:.1} > {:.1})",
                reading.alpha,
                reading.beta,
                self.controller.threshold()
            ),
            Some(Transition::Released) => info!("walking stopped"),
            None => {}
        }
        let (alpha, beta) = self.history.snapshot();
        let frame = VisualFrame {
            raw: epoch,
            alpha: alpha.to_vec(),
            beta: beta.to_vec(),
            state: self.controller.state(),
        };
        self.present(frame);
        TickOutcome::Evaluated {
            reading,
            transition,
        }
    }
    /// Releases the actuator if it is still engaged.
    pub fn shutdown(&mut self) {
        if self.controller.shutdown(&mut self.actuator).is_some() {
            info!("walking stopped (shutdown)");
        }
    }
    fn present(&mut self, frame: VisualFrame) {
        if let Err(e) = self.sink.present(&frame) {
            warn!("visualization failed: {e}");
        }
    }
}
