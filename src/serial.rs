// src/serial.rs
use std::io::{BufRead, BufReader, ErrorKind};
use std::thread;
use std::time::Duration;

use serialport::SerialPort;

use crate::drivers::{parse_sample_line, SampleSource, SourceError};

// The board resets when the port opens; give it time before reading.
const SETTLE_DELAY: Duration = Duration::from_secs(2);
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Line-oriented sample reader: one ASCII decimal per line.
pub struct LineSource<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    label: String,
}

pub type SerialSource = LineSource<BufReader<Box<dyn SerialPort>>>;

impl SerialSource {
    /// Opens the sensor's serial port (e.g. `COM13` or `/dev/ttyACM0`).
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, SourceError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        log::info!("✅ Serial connected: {port_name} @ {baud_rate} baud");
        thread::sleep(SETTLE_DELAY);
        Ok(LineSource::new(BufReader::new(port), port_name))
    }
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, label: &str) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(32),
            label: label.to_owned(),
        }
    }
}

impl<R: BufRead> SampleSource for LineSource<R> {
    fn read_next(&mut self) -> Result<f64, SourceError> {
        match self.reader.read_until(b'\n', &mut self.line) {
            // partial data stays in `line` until the newline shows up
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(SourceError::TimedOut),
            Err(e) => Err(SourceError::Io(e)),
            Ok(0) if self.line.is_empty() => Err(SourceError::Disconnected),
            Ok(_) => {
                let parsed = parse_sample_line(&self.line);
                self.line.clear();
                parsed
            }
        }
    }
}

impl<R: BufRead> Drop for LineSource<R> {
    fn drop(&mut self) {
        log::info!("🔌 Sample source {} closed.", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn reads_lines_and_flags_garbage() {
        let mut source = LineSource::new(Cursor::new(b"1.0\r\n2.5\nnoise\n\n-4\n".to_vec()), "test");
        assert_eq!(source.read_next().unwrap(), 1.0);
        assert_eq!(source.read_next().unwrap(), 2.5);
        assert!(source.read_next().unwrap_err().is_transient());
        assert!(source.read_next().unwrap_err().is_transient());
        assert_eq!(source.read_next().unwrap(), -4.0);
        assert!(matches!(source.read_next(), Err(SourceError::Disconnected)));
    }

    #[test]
    fn last_line_without_newline_still_counts() {
        let mut source = LineSource::new(Cursor::new(b"7".to_vec()), "test");
        assert_eq!(source.read_next().unwrap(), 7.0);
        assert!(matches!(source.read_next(), Err(SourceError::Disconnected)));
    }

    /// Reader that times out once in the middle of a line, like a slow port.
    struct Stutter {
        chunks: Vec<std::io::Result<Vec<u8>>>,
    }

    impl Read for Stutter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let bytes = self.chunks.remove(0)?;
            buf[..bytes.len()].copy_from_slice(&bytes);
            Ok(bytes.len())
        }
    }

    #[test]
    fn timeouts_keep_partial_lines_and_broken_pipes_are_fatal() {
        let reader = Stutter {
            chunks: vec![
                Ok(b"12".to_vec()),
                Err(ErrorKind::TimedOut.into()),
                Ok(b".5\n".to_vec()),
                Err(ErrorKind::BrokenPipe.into()),
            ],
        };
        let mut source = LineSource::new(BufReader::new(reader), "stutter");
        assert!(matches!(source.read_next(), Err(SourceError::TimedOut)));
        assert_eq!(source.read_next().unwrap(), 12.5);
        let err = source.read_next().unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, SourceError::Io(_)));
    }
}
