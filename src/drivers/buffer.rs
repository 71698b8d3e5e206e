use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::drivers::PipelineError;
// grows past this on demand
const PREALLOCATE_LIMIT: usize = 1 << 16;
/// Rolling buffer holding the most recent raw samples.
#[derive(Debug)]
pub struct IngestionBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}
impl IngestionBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }
    /// Sizes the buffer to keep `retention_epochs` whole epochs of history.
    pub fn with_retention(
        epoch_length: usize,
        retention_epochs: usize,
    ) -> Result<Self, PipelineError> {
        let capacity = epoch_length
            .checked_mul(retention_epochs)
            .filter(|&capacity| capacity > 0)
            .ok_or_else(|| {
                PipelineError::InvalidConfig(format!(
                    "buffer needs a non-empty epoch and retention, got {epoch_length} x {retention_epochs}"
                ))
            })?;
        Ok(Self::with_capacity(capacity))
    }
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn append(&mut self, sample: f64) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }
    /// Last `n` samples in arrival order, or `None` until `n` have been collected.
    pub fn latest_window(&self, n: usize) -> Option<Vec<f64>> {
        if self.samples.len() < n {
            return None;
        }
        Some(self.tail(n))
    }
    /// Up to `n` of the most recent samples, however many there are.
    pub fn tail(&self, n: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }
}
/// Buffer shared between the producer thread and the tick loop.
///
/// Every operation holds the lock for its whole duration, so a reader never
/// sees a half-applied append or truncation.
#[derive(Clone, Debug)]
pub struct SharedBuffer {
    inner: Arc<Mutex<IngestionBuffer>>,
}
impl SharedBuffer {
    pub fn new(buffer: IngestionBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }
    fn lock(&self) -> MutexGuard<'_, IngestionBuffer> {
        // append/truncate leave the deque consistent at every step, so a
        // poisoned lock is still safe to use
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
    pub fn append(&self, sample: f64) {
        self.lock().append(sample);
    }
    pub fn latest_window(&self, n: usize) -> Option<Vec<f64>> {
        self.lock().latest_window(n)
    }
    pub fn tail(&self, n: usize) -> Vec<f64> {
        self.lock().tail(n)
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
