// src/types.rs
use serde::Deserialize;

// 频段 (Hz, 闭区间)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct Band {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Band {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

impl From<[f64; 2]> for Band {
    fn from([low_hz, high_hz]: [f64; 2]) -> Self {
        Self { low_hz, high_hz }
    }
}

// 每个 tick 的 alpha/beta 功率
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandPowerReading {
    pub alpha: f64,
    pub beta: f64,
}

impl BandPowerReading {
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.alpha > threshold || self.beta > threshold
    }
}

// 执行器状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActuatorState {
    #[default]
    Idle,
    Engaged,
}

// 边沿触发的状态切换
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Engaged,
    Released,
}

// 交给可视化的一帧数据
#[derive(Clone, Debug, Default)]
pub struct VisualFrame {
    pub raw: Vec<f64>,
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
    pub state: ActuatorState,
}

// 数据源选择
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    Serial {
        #[serde(default = "default_port")]
        port: String,
        #[serde(default = "default_baud")]
        baud_rate: u32,
    },
    Synthetic {
        #[serde(default = "default_alpha_amplitude")]
        alpha_amplitude: f64,
        #[serde(default = "default_beta_amplitude")]
        beta_amplitude: f64,
        #[serde(default = "default_noise_amplitude")]
        noise_amplitude: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for SourceKind {
    fn default() -> Self {
        SourceKind::Serial {
            port: default_port(),
            baud_rate: default_baud(),
        }
    }
}

fn default_port() -> String {
    "COM13".to_owned()
}
fn default_baud() -> u32 {
    9600
}
fn default_alpha_amplitude() -> f64 {
    50.0
}
fn default_beta_amplitude() -> f64 {
    30.0
}
fn default_noise_amplitude() -> f64 {
    5.0
}

// 执行器选择
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorKind {
    Key {
        #[serde(default = "default_key")]
        key: String,
    },
    Log,
}

impl Default for ActuatorKind {
    fn default() -> Self {
        ActuatorKind::Key { key: default_key() }
    }
}

fn default_key() -> String {
    "space".to_owned()
}
