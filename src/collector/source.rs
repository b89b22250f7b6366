//! Line sources for the collector: a serial device or a captured log

use crate::error::{HeatmapError, Result};
use log::{debug, info};
use serial2::SerialPort;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of asking a source for its next line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, without its terminator
    Line(String),
    /// Nothing arrived within the read timeout
    Idle,
    /// The source is exhausted
    Closed,
}

/// Anything the collector can pull log lines from
pub trait LineSource {
    /// Block for at most the source's read timeout and return what arrived.
    fn next_line(&mut self) -> Result<ReadOutcome>;
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Dropping invalid UTF-8 in log line: {}", e.utf8_error());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Reads lines from any buffered reader until EOF (a saved log, stdin).
#[derive(Debug)]
pub struct LogReader<R> {
    reader: R,
}

impl<R: BufRead> LogReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LogReader<io::BufReader<File>> {
    /// Open a captured log file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HeatmapError::missing("log file", path));
        }
        Ok(Self::new(io::BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LineSource for LogReader<R> {
    fn next_line(&mut self) -> Result<ReadOutcome> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(_) => Ok(ReadOutcome::Line(decode(buf).trim().to_string())),
            Err(e) if is_transient(&e) => {
                debug!("Log read interrupted: {}", e);
                Ok(ReadOutcome::Idle)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Longest run of bytes held while waiting for a newline
pub const MAX_LINE_BYTES: usize = 4096;

/// The open device: a real serial port, or a plain stream for paths that
/// are not terminals (a FIFO, a captured file)
enum Port {
    Serial(SerialPort),
    Stream(File),
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial(_) => f.write_str("Serial"),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A serial port exposed by ZMK USB logging.
///
/// The port is opened at the requested baud rate with a bounded read
/// timeout on every platform, so an idle keyboard yields
/// [`ReadOutcome::Idle`] instead of blocking forever. Paths that are not
/// terminals are read as-is and end at EOF.
#[derive(Debug)]
pub struct SerialDevice {
    path: PathBuf,
    port: Port,
    pending: Vec<u8>,
}

impl SerialDevice {
    /// Open and configure a serial device.
    pub fn open(path: &Path, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(HeatmapError::missing("device", path));
        }
        let device_error = |e: io::Error| HeatmapError::Device {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let port = match SerialPort::open(path, baud_rate) {
            Ok(mut port) => {
                port.set_read_timeout(read_timeout).map_err(device_error)?;
                info!("Connected to {} at {} baud", path.display(), baud_rate);
                Port::Serial(port)
            }
            Err(serial_err) => {
                let file = File::open(path).map_err(device_error)?;
                if file.is_terminal() {
                    return Err(device_error(serial_err));
                }
                debug!(
                    "{} is not a terminal ({}), reading it as a plain stream",
                    path.display(),
                    serial_err
                );
                Port::Stream(file)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            port,
            pending: Vec::with_capacity(512),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Split one line off the front of the pending buffer, if complete.
    /// Runs longer than [`MAX_LINE_BYTES`] without a newline are cut there.
    fn take_line(&mut self) -> Option<String> {
        let end = match self.pending.iter().position(|&b| b == b'\n') {
            Some(idx) => idx + 1,
            None if self.pending.len() >= MAX_LINE_BYTES => {
                debug!(
                    "No newline in {} bytes from {}, flushing",
                    MAX_LINE_BYTES,
                    self.path.display()
                );
                MAX_LINE_BYTES
            }
            None => return None,
        };
        let rest = self.pending.split_off(end);
        let line = std::mem::replace(&mut self.pending, rest);
        Some(decode(line).trim().to_string())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.port {
            Port::Serial(port) => port.read(buf),
            Port::Stream(file) => file.read(buf),
        }
    }
}

impl LineSource for SerialDevice {
    fn next_line(&mut self) -> Result<ReadOutcome> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(ReadOutcome::Line(line));
            }

            let mut chunk = [0u8; 256];
            let is_serial = matches!(self.port, Port::Serial(_));
            match self.read_chunk(&mut chunk) {
                Ok(0) if is_serial => return Ok(ReadOutcome::Idle),
                Ok(0) if self.pending.is_empty() => return Ok(ReadOutcome::Closed),
                Ok(0) => {
                    let tail = std::mem::take(&mut self.pending);
                    return Ok(ReadOutcome::Line(decode(tail).trim().to_string()));
                }
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if is_transient(&e) => {
                    debug!("Serial read on {} timed out: {}", self.path.display(), e);
                    return Ok(ReadOutcome::Idle);
                }
                Err(e) => {
                    return Err(HeatmapError::Device {
                        path: self.path.clone(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }
}
