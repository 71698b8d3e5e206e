#[cfg(test)]
use std::collections::VecDeque;
use crate::drivers::SourceError;
/// Trait representing something that yields one scalar sample at a time.
///
/// `read_next` blocks until a sample (or an error) is available.
pub trait SampleSource {
    fn read_next(&mut self) -> Result<f64, SourceError>;
}
impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read_next(&mut self) -> Result<f64, SourceError> {
        (**self).read_next()
    }
}
/// Decodes one ASCII line from the sensor into a sample.
///
/// Anything that is not a finite decimal number is malformed.
pub fn parse_sample_line(raw: &[u8]) -> Result<f64, SourceError> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| SourceError::Malformed(String::from_utf8_lossy(raw).into_owned()))?;
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SourceError::Malformed(trimmed.to_owned())),
    }
}
/// In-memory source for tests; reports `Disconnected` once the script runs out.
#[cfg(test)]
pub struct ManualSource {
    queue: VecDeque<Result<f64, SourceError>>,
}
#[cfg(test)]
impl ManualSource {
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: samples.into_iter().map(Ok).collect(),
        }
    }
    pub fn scripted(items: impl IntoIterator<Item = Result<f64, SourceError>>) -> Self {
        Self {
            queue: items.into_iter().collect(),
        }
    }
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
#[cfg(test)]
impl SampleSource for ManualSource {
    fn read_next(&mut self) -> Result<f64, SourceError> {
        self.queue.pop_front().unwrap_or(Err(SourceError::Disconnected))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parses_trimmed_decimal_lines() {
        assert_eq!(parse_sample_line(b"12.5\r\n").unwrap(), 12.5);
        assert_eq!(parse_sample_line(b"  -3\n").unwrap(), -3.0);
        assert_eq!(parse_sample_line(b"1e2").unwrap(), 100.0);
    }
    #[test]
    fn garbage_lines_are_malformed() {
        let cases: [&[u8]; 7] = [b"", b"\n", b"abc\n", b"1.2.3", b"NaN", b"inf", &[0xff, 0xfe, b'\n']];
        for raw in cases {
            let err = parse_sample_line(raw).unwrap_err();
            assert!(err.is_transient(), "{raw:?} gave {err}");
        }
    }
    #[test]
    fn manual_source_plays_script_then_disconnects() {
        let mut source = ManualSource::scripted(vec![
            Ok(1.0),
            Err(SourceError::Malformed("x".into())),
            Ok(2.0),
        ]);
        assert_eq!(source.read_next().unwrap(), 1.0);
        assert!(source.read_next().unwrap_err().is_transient());
        assert_eq!(source.read_next().unwrap(), 2.0);
        assert_eq!(source.remaining(), 0);
        assert!(matches!(source.read_next(), Err(SourceError::Disconnected)));
    }
}
