use std::collections::VecDeque;
use crate::types::BandPowerReading;
/// Bounded alpha/beta history, one pair per evaluated tick.
///
/// Both series are always the same length and index-aligned.
#[derive(Debug)]
pub struct PowerHistory {
    alpha: VecDeque<f64>,
    beta: VecDeque<f64>,
    capacity: usize,
}
impl PowerHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            alpha: VecDeque::with_capacity(capacity),
            beta: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.alpha.len()
    }
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }
    pub fn record(&mut self, reading: BandPowerReading) {
        self.alpha.push_back(reading.alpha);
        self.beta.push_back(reading.beta);
        let excess = self.alpha.len().saturating_sub(self.capacity);
        self.alpha.drain(..excess);
        self.beta.drain(..excess);
    }
    pub fn latest(&self) -> Option<BandPowerReading> {
        Some(BandPowerReading {
            alpha: *self.alpha.back()?,
            beta: *self.beta.back()?,
        })
    }
    /// Read-only views of both series, oldest first.
    pub fn snapshot(&mut self) -> (&[f64], &[f64]) {
        (&*self.alpha.make_contiguous(), &*self.beta.make_contiguous())
    }
}
