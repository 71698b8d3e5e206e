// src/drivers/mod.rs
// 声明同级目录下的子模块文件
pub mod buffer;
pub mod controller;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod plot;
pub mod source;
pub mod spectral;
// 公开导出这些模块里的结构体，方便外部调用
pub use buffer::{IngestionBuffer, SharedBuffer};
pub use controller::Actuator;
pub use error::{PipelineError, SourceError};
pub use pipeline::{SignalPipeline, TickOutcome};
pub use plot::{FrameSink, NullSink, PngSink};
#[cfg(test)]
pub use source::ManualSource;
pub use source::{parse_sample_line, SampleSource};
