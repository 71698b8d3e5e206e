use thiserror::Error;
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("sample source failed: {0}")]
    Source(#[from] SourceError),
    #[error("sample log write failed: {0}")]
    Log(#[source] std::io::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PipelineError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PipelineError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for PipelineError {
    fn from(value: image::ImageError) -> Self {
        PipelineError::Plot(value.to_string())
    }
}
/// Errors raised while pulling the next sample off a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A single unit of input could not be decoded; the stream itself is fine.
    #[error("malformed sample: {0:?}")]
    Malformed(String),
    /// No data arrived within the read timeout; the caller may retry.
    #[error("sample source timed out")]
    TimedOut,
    #[error("sample source disconnected")]
    Disconnected,
    #[error("sample source i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}
impl SourceError {
    /// Transient errors are skipped by the producer; everything else ends the stream.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Malformed(_) | SourceError::TimedOut)
    }
}
