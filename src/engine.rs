// src/engine.rs
use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::drivers::{
    Actuator, FrameSink, IngestionBuffer, PipelineError, SampleSource, SharedBuffer,
    SignalPipeline, SourceError, TickOutcome,
};
use crate::recorder::SampleLog;
use crate::types::Transition;

// How long shutdown waits for a producer stuck in a blocking read.
const JOIN_GRACE: Duration = Duration::from_secs(2);

/// Counters reported when the run ends normally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub evaluations: u64,
    pub engagements: u64,
    pub releases: u64,
    pub samples_logged: u64,
    pub samples_discarded: u64,
}

struct ProducerReport {
    logged: u64,
    discarded: u64,
}

/// Runs the pipeline until the source fails, `max_ticks` is reached, or the
/// producer thread dies. Source and log live on the producer thread and are
/// dropped (closed and flushed) there on every exit path.
pub fn run<S, A, V>(
    config: &PipelineConfig,
    source: S,
    actuator: A,
    sink: V,
    log: SampleLog,
) -> Result<RunSummary>
where
    S: SampleSource + Send + 'static,
    A: Actuator,
    V: FrameSink,
{
    config.validate()?;
    let buffer = SharedBuffer::new(IngestionBuffer::with_retention(
        config.epoch_length(),
        config.retention_epochs,
    )?);
    let stop = Arc::new(AtomicBool::new(false));
    let (tx_exit, rx_exit) = channel::<()>();
    let producer = spawn_producer(source, log, buffer.clone(), stop.clone(), tx_exit)?;
    info!(
        "⚙️ Pipeline ready: {} Hz, epoch {} samples, tick {} ms, threshold {}",
        config.sampling_rate_hz,
        config.epoch_length(),
        config.tick_period_ms,
        config.threshold
    );

    let mut pipeline = SignalPipeline::new(config, actuator, sink);
    let mut summary = RunSummary::default();
    let period = config.tick_period();
    let mut next_tick = Instant::now() + period;

    // ============================================================
    // 定时 tick 循环 (同一线程内顺序执行, 不会重入)
    // ============================================================
    loop {
        // waiting on the exit channel doubles as the tick timer
        let wait = next_tick.saturating_duration_since(Instant::now());
        match rx_exit.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        summary.ticks += 1;
        if let TickOutcome::Evaluated { reading, transition } = pipeline.tick(&buffer) {
            summary.evaluations += 1;
            trace!("tick {}: {reading:?}", summary.ticks);
            match transition {
                Some(Transition::Engaged) => summary.engagements += 1,
                Some(Transition::Released) => summary.releases += 1,
                None => {}
            }
        }
        if config.max_ticks.is_some_and(|max| summary.ticks >= max) {
            info!("Reached {} ticks, stopping.", summary.ticks);
            break;
        }

        next_tick += period;
        let now = Instant::now();
        if next_tick <= now {
            let behind = now.duration_since(next_tick);
            let skipped = (behind.as_nanos() / period.as_nanos()) as u32 + 1;
            debug!("tick overran by {behind:?}, skipping {skipped} tick(s)");
            next_tick += period * skipped;
        }
    }

    // ============================================================
    // 有序关闭: 先松开按键, 再回收采集线程
    // ============================================================
    stop.store(true, Ordering::Relaxed);
    pipeline.shutdown();

    let deadline = Instant::now() + JOIN_GRACE;
    while !producer.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    if !producer.is_finished() {
        warn!("Sample producer is still blocked on its source; leaving it behind.");
        return Ok(summary);
    }
    let report = match producer.join() {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => return Err(anyhow::Error::new(e).context("sample producer stopped")),
        Err(_) => return Err(anyhow!("sample producer panicked")),
    };
    summary.samples_logged = report.logged;
    summary.samples_discarded = report.discarded;
    Ok(summary)
}

fn spawn_producer<S>(
    mut source: S,
    mut log: SampleLog,
    buffer: SharedBuffer,
    stop: Arc<AtomicBool>,
    tx_exit: Sender<()>,
) -> Result<JoinHandle<Result<ProducerReport, PipelineError>>>
where
    S: SampleSource + Send + 'static,
{
    thread::Builder::new()
        .name("sample-producer".to_owned())
        .spawn(move || {
            let mut discarded = 0u64;
            let result = loop {
                if stop.load(Ordering::Relaxed) {
                    break Ok(());
                }
                match source.read_next() {
                    Ok(value) => {
                        buffer.append(value);
                        if let Err(e) = log.write_sample(value) {
                            break Err(e);
                        }
                    }
                    // back to the stop check; a quiet sensor is not a bad sample
                    Err(SourceError::TimedOut) => {}
                    Err(e) if e.is_transient() => {
                        discarded += 1;
                        trace!("discarding {e}");
                    }
                    Err(e) => break Err(PipelineError::from(e)),
                }
            };
            let report = ProducerReport {
                logged: log.written(),
                discarded,
            };
            // release the sensor and flush the log before telling the tick loop
            drop(source);
            drop(log);
            tx_exit.send(()).ok();
            result.map(|()| report)
        })
        .context("failed to spawn the sample producer thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{ManualSource, NullSink};
    use crate::serial::LineSource;
    use crate::simulation::SyntheticSource;
    use crate::types::SourceKind;
    use std::io::{BufReader, ErrorKind, Read};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedRecorder {
        calls: Arc<Mutex<Vec<Transition>>>,
    }

    impl Actuator for SharedRecorder {
        fn engage(&mut self) {
            self.calls.lock().unwrap().push(Transition::Engaged);
        }
        fn release(&mut self) {
            self.calls.lock().unwrap().push(Transition::Released);
        }
    }

    fn temp_log(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("alphawalk-engine-{}-{}.txt", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            sampling_rate_hz: 1000.0,
            epoch_seconds: 0.5,
            tick_period_ms: 50,
            threshold: 150.0,
            source: SourceKind::Synthetic {
                alpha_amplitude: 50.0,
                beta_amplitude: 30.0,
                noise_amplitude: 5.0,
                seed: Some(5),
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn synthetic_run_engages_once_and_releases_on_shutdown() {
        let config = PipelineConfig {
            max_ticks: Some(20),
            ..fast_config()
        };
        let path = temp_log("synthetic");
        let log = SampleLog::open(&path).unwrap();
        let source = SyntheticSource::new(1000.0, 50.0, 30.0, 5.0, Some(5)).paced();
        let actuator = SharedRecorder::default();
        let summary = run(&config, source, actuator.clone(), NullSink, log).unwrap();
        assert_eq!(summary.ticks, 20);
        assert!(summary.evaluations > 0);
        assert_eq!(summary.engagements, 1);
        assert_eq!(
            *actuator.calls.lock().unwrap(),
            vec![Transition::Engaged, Transition::Released]
        );
        let lines = std::fs::read_to_string(&path).unwrap().lines().count() as u64;
        assert_eq!(lines, summary.samples_logged);
        assert!(lines >= 500);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn disconnect_is_fatal_and_log_keeps_good_samples() {
        let config = PipelineConfig {
            tick_period_ms: 10,
            ..fast_config()
        };
        let path = temp_log("disconnect");
        let log = SampleLog::open(&path).unwrap();
        let source = ManualSource::scripted(vec![
            Ok(1.0),
            Err(SourceError::Malformed("garbage".into())),
            Ok(2.5),
            Err(SourceError::Malformed("".into())),
            Ok(-3.0),
        ]);
        let actuator = SharedRecorder::default();
        let err = run(&config, source, actuator.clone(), NullSink, log).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Source(SourceError::Disconnected))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n2.5\n-3\n");
        assert!(actuator.calls.lock().unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }

    /// Port that never delivers a byte, only read timeouts.
    struct SilentPort;

    impl Read for SilentPort {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            thread::sleep(Duration::from_millis(5));
            Err(ErrorKind::TimedOut.into())
        }
    }

    #[test]
    fn silent_sensor_still_stops_promptly() {
        let config = PipelineConfig {
            tick_period_ms: 10,
            max_ticks: Some(2),
            ..fast_config()
        };
        let path = temp_log("silent");
        let log = SampleLog::open(&path).unwrap();
        let source = LineSource::new(BufReader::new(SilentPort), "silent");
        let started = Instant::now();
        let summary = run(&config, source, SharedRecorder::default(), NullSink, log).unwrap();
        assert!(started.elapsed() < JOIN_GRACE, "took {:?}", started.elapsed());
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.evaluations, 0);
        assert_eq!(summary.samples_logged, 0);
        assert_eq!(summary.samples_discarded, 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_config_fails_before_starting() {
        let config = PipelineConfig {
            threshold: -5.0,
            ..fast_config()
        };
        let path = temp_log("invalid");
        let log = SampleLog::open(&path).unwrap();
        let result = run(&config, ManualSource::new(Vec::<f64>::new()), SharedRecorder::default(), NullSink, log);
        assert!(result.is_err());
        std::fs::remove_file(&path).ok();
    }
}
