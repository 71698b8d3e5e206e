// src/main.rs
mod config;
mod drivers;
mod engine;
mod keyboard;
mod recorder;
mod serial;
mod simulation;
mod types;

use anyhow::Context;
use std::path::PathBuf;

use config::PipelineConfig;
use drivers::{Actuator, FrameSink, NullSink, PngSink, SampleSource};
use keyboard::{KeyPressActuator, LogActuator};
use recorder::SampleLog;
use serial::SerialSource;
use simulation::SyntheticSource;
use types::{ActuatorKind, SourceKind};

// 入口函数: alphawalk [config.json]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            log::info!("No config file given, using defaults.");
            PipelineConfig::default()
        }
    };
    config.validate()?;

    let log = SampleLog::open(&config.log_path)
        .with_context(|| format!("failed to open sample log {}", config.log_path.display()))?;
    log::debug!("raw samples -> {}", log.path().display());

    // 1. 执行器: 按键注入失败时退回到日志模式
    let actuator: Box<dyn Actuator> = match &config.actuator {
        ActuatorKind::Key { key } => match KeyPressActuator::new(key) {
            Ok(actuator) => Box::new(actuator),
            Err(e) => {
                log::warn!("⚠️ Key actuator unavailable ({e}); falling back to dry run.");
                Box::new(LogActuator::default())
            }
        },
        ActuatorKind::Log => Box::new(LogActuator::default()),
    };

    // 2. 可视化输出
    let sink: Box<dyn FrameSink> = match &config.plot_path {
        Some(path) => Box::new(PngSink::new(path.clone())),
        None => Box::new(NullSink),
    };

    // 3. 数据源
    let source: Box<dyn SampleSource + Send> = match &config.source {
        SourceKind::Serial { port, baud_rate } => Box::new(
            SerialSource::open(port, *baud_rate)
                .with_context(|| format!("failed to open serial port {port}"))?,
        ),
        SourceKind::Synthetic {
            alpha_amplitude,
            beta_amplitude,
            noise_amplitude,
            seed,
        } => {
            log::info!("🧪 Using synthetic EEG source.");
            Box::new(
                SyntheticSource::new(
                    config.sampling_rate_hz,
                    *alpha_amplitude,
                    *beta_amplitude,
                    *noise_amplitude,
                    *seed,
                )
                .paced(),
            )
        }
    };

    let summary = engine::run(&config, source, actuator, sink, log)?;
    log::info!(
        "Done: {} ticks, {} evaluations, {} engagements, {} releases, {} samples logged, {} discarded.",
        summary.ticks,
        summary.evaluations,
        summary.engagements,
        summary.releases,
        summary.samples_logged,
        summary.samples_discarded
    );
    Ok(())
}
