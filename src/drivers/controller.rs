use crate::types::{ActuatorState, BandPowerReading, Transition};
/// Something that can be switched on and off by the controller.
///
/// Implementations own their failure handling; the controller only decides
/// when an edge happened.
pub trait Actuator {
    fn engage(&mut self);
    fn release(&mut self);
}
impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn engage(&mut self) {
        (**self).engage();
    }
    fn release(&mut self) {
        (**self).release();
    }
}
/// Two-state threshold machine that calls the actuator only on edges.
///
/// There is no hysteresis band: a reading hovering around the threshold
/// toggles the state on every tick.
#[derive(Debug)]
pub struct ActuationController {
    threshold: f64,
    state: ActuatorState,
}
impl ActuationController {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            state: ActuatorState::Idle,
        }
    }
    pub fn state(&self) -> ActuatorState {
        self.state
    }
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
    pub fn evaluate<A: Actuator + ?Sized>(
        &mut self,
        reading: Option<BandPowerReading>,
        actuator: &mut A,
    ) -> Option<Transition> {
        let active = reading?.exceeds(self.threshold);
        match (self.state, active) {
            (ActuatorState::Idle, true) => {
                self.state = ActuatorState::Engaged;
                actuator.engage();
                Some(Transition::Engaged)
            }
            (ActuatorState::Engaged, false) => {
                self.state = ActuatorState::Idle;
                actuator.release();
                Some(Transition::Released)
            }
            _ => None,
        }
    }
    /// Lets go of the actuator if it is still held, e.g. before exiting.
    pub fn shutdown<A: Actuator + ?Sized>(&mut self, actuator: &mut A) -> Option<Transition> {
        if self.state == ActuatorState::Engaged {
            self.state = ActuatorState::Idle;
            actuator.release();
            return Some(Transition::Released);
        }
        None
    }
}
/// Actuator double that records every call, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub calls: Vec<Transition>,
}
#[cfg(test)]
impl RecordingActuator {
    pub fn engages(&self) -> usize {
        self.calls.iter().filter(|c| **c == Transition::Engaged).count()
    }
    pub fn releases(&self) -> usize {
        self.calls.iter().filter(|c| **c == Transition::Released).count()
    }
}
#[cfg(test)]
impl Actuator for RecordingActuator {
    fn engage(&mut self) {
        self.calls.push(Transition::Engaged);
    }
    fn release(&mut self) {
        self.calls.push(Transition::Released);
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    const BELOW: BandPowerReading = BandPowerReading { alpha: 10.0, beta: 20.0 };
    const ABOVE: BandPowerReading = BandPowerReading { alpha: 10.0, beta: 200.0 };
    #[test]
    fn edges_trigger_exactly_one_call_each() {
        let mut controller = ActuationController::new(150.0);
        let mut actuator = RecordingActuator::default();
        let script = [BELOW, BELOW, ABOVE, ABOVE, ABOVE, BELOW];
        let transitions: Vec<_> = script
            .iter()
            .map(|r| controller.evaluate(Some(*r), &mut actuator))
            .collect();
        assert_eq!(actuator.calls, vec![Transition::Engaged, Transition::Released]);
        assert_eq!(
            transitions,
            vec![None, None, Some(Transition::Engaged), None, None, Some(Transition::Released)]
        );
        assert_eq!(controller.state(), ActuatorState::Idle);
    }
    #[test]
    fn no_reading_means_no_call() {
        let mut controller = ActuationController::new(0.0);
        let mut actuator = RecordingActuator::default();
        for _ in 0..20 {
            assert_eq!(controller.evaluate(None, &mut actuator), None);
        }
        assert!(actuator.calls.is_empty());
        assert_eq!(controller.state(), ActuatorState::Idle);
    }
    #[test]
    fn threshold_comparison_is_strict_on_either_band() {
        let mut controller = ActuationController::new(150.0);
        let mut actuator = RecordingActuator::default();
        let at = BandPowerReading { alpha: 150.0, beta: 150.0 };
        assert_eq!(controller.evaluate(Some(at), &mut actuator), None);
        let alpha_only = BandPowerReading { alpha: 150.5, beta: 0.0 };
        assert_eq!(controller.evaluate(Some(alpha_only), &mut actuator), Some(Transition::Engaged));
        assert_eq!(controller.state(), ActuatorState::Engaged);
    }
    #[test]
    fn boundary_noise_flaps_every_tick() {
        let mut controller = ActuationController::new(150.0);
        let mut actuator = RecordingActuator::default();
        let high = BandPowerReading { alpha: 151.0, beta: 0.0 };
        let low = BandPowerReading { alpha: 149.0, beta: 0.0 };
        for _ in 0..3 {
            controller.evaluate(Some(high), &mut actuator);
            controller.evaluate(Some(low), &mut actuator);
        }
        assert_eq!(actuator.engages(), 3);
        assert_eq!(actuator.releases(), 3);
    }
    #[test]
    fn shutdown_releases_only_when_engaged() {
        let mut controller = ActuationController::new(150.0);
        let mut actuator = RecordingActuator::default();
        assert_eq!(controller.shutdown(&mut actuator), None);
        controller.evaluate(Some(ABOVE), &mut actuator);
        assert_eq!(controller.shutdown(&mut actuator), Some(Transition::Released));
        assert_eq!(controller.shutdown(&mut actuator), None);
        assert_eq!(actuator.calls, vec![Transition::Engaged, Transition::Released]);
    }
}
