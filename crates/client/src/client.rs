//! Blocking client for the clamd scanning daemon.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use clamber_core::{ClamError, Config, ScanResult};
use tracing::{debug, trace, warn};

use crate::protocol;
use crate::transport::Session;

/// Client for a clamd instance reachable over TCP.
///
/// Holds no connection state: every operation opens a fresh session and
/// closes it before returning, so one client can be shared freely across
/// threads. Keep a single client around rather than rebuilding it per call.
#[derive(Debug, Clone)]
pub struct ClamClient {
    config: Config,
}

impl ClamClient {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Send PING and check for the PONG reply.
    ///
    /// # Errors
    ///
    /// Returns `ClamError::Io` if the daemon is unreachable or the exchange
    /// fails.
    pub fn ping(&self) -> Result<bool, ClamError> {
        self.command_expect(protocol::CMD_PING, protocol::RSP_PONG)
    }

    /// Send a pre-encoded command and compare the reply byte-for-byte
    /// against `expected`.
    ///
    /// # Errors
    ///
    /// Returns `ClamError::Io` if the exchange fails.
    pub fn command_expect(&self, command: &[u8], expected: &[u8]) -> Result<bool, ClamError> {
        Ok(self.send_command(command)? == expected)
    }

    /// Send a pre-encoded command and return the raw reply bytes.
    ///
    /// The reply is everything the daemon writes before closing its side,
    /// still carrying the trailing NUL.
    ///
    /// # Errors
    ///
    /// Returns `ClamError::Io` if the daemon is unreachable or a read or
    /// write fails, including a read timing out.
    pub fn send_command(&self, command: &[u8]) -> Result<Vec<u8>, ClamError> {
        let mut session = self.connect()?;
        session.write_all(command)?;
        session.flush()?;
        let reply = protocol::read_response(&mut session, self.config.read_buffer_size)?;
        debug!(len = reply.len(), "command reply received");
        Ok(reply)
    }

    /// Scan a byte source and classify the daemon's verdict.
    ///
    /// # Errors
    ///
    /// See [`ClamClient::scan_raw`].
    pub fn scan<R: Read>(&self, source: R) -> Result<ScanResult, ClamError> {
        Ok(ScanResult::from_raw(&self.scan_raw(source)?))
    }

    /// Scan a file by path.
    ///
    /// # Errors
    ///
    /// Returns `ClamError::Io` if the file cannot be opened, plus everything
    /// [`ClamClient::scan_raw`] can fail with.
    pub fn scan_path(&self, path: impl AsRef<Path>) -> Result<ScanResult, ClamError> {
        Ok(ScanResult::from_raw(&self.scan_path_raw(path)?))
    }

    /// Scan a file by path, returning the raw reply bytes.
    ///
    /// # Errors
    ///
    /// See [`ClamClient::scan_path`].
    pub fn scan_path_raw(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, ClamError> {
        self.scan_raw(File::open(path)?)
    }

    /// Stream a byte source to the daemon in length-prefixed chunks and
    /// return the raw reply bytes.
    ///
    /// The source is read in `chunk_size` pieces. After every chunk the
    /// session is probed for an unprompted reply: the daemon answers before
    /// the terminator frame only when it has aborted the scan (typically a
    /// stream over its size limit), in which case the upload stops and the
    /// decoded message comes back as `ClamError::Aborted`. Without the probe
    /// the client would keep writing into a dead stream and misreport the
    /// rejection as a broken pipe.
    ///
    /// # Errors
    ///
    /// Returns `ClamError::Aborted` when the daemon cuts the scan short, and
    /// `ClamError::Io` for source, connect, read, or write failures.
    pub fn scan_raw<R: Read>(&self, mut source: R) -> Result<Vec<u8>, ClamError> {
        let mut session = self.connect()?;
        session.write_all(protocol::CMD_INSTREAM)?;
        session.flush()?;

        let mut buffer = vec![0u8; self.config.chunk_size];
        let mut sent: u64 = 0;
        loop {
            let n = fill_chunk(&mut source, &mut buffer)?;
            if n == 0 {
                break;
            }
            protocol::write_chunk(&mut session, &buffer[..n])?;
            sent += n as u64;
            trace!(bytes = n, total = sent, "chunk sent");

            if session.response_pending()? {
                let reply = protocol::read_response(&mut session, self.config.read_buffer_size)?;
                let message = protocol::decode_reply(&reply);
                warn!(%message, sent, "daemon aborted the scan mid-upload");
                return Err(ClamError::Aborted(message));
            }
        }

        protocol::write_end_of_stream(&mut session)?;
        let reply = protocol::read_response(&mut session, self.config.read_buffer_size)?;
        debug!(len = reply.len(), sent, "scan reply received");
        Ok(reply)
    }

    fn connect(&self) -> Result<Session, ClamError> {
        Ok(Session::connect(
            &self.config.host,
            self.config.port,
            self.config.read_timeout,
        )?)
    }
}

/// Read from `source` until `buffer` is full or the source is exhausted.
///
/// A plain `read` may return short; filling the buffer keeps chunk frames at
/// `chunk_size` until the final partial one, so a source of `N` bytes always
/// becomes `ceil(N / chunk_size)` frames.
fn fill_chunk<R: Read>(source: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields its data a few bytes per `read` call.
    struct Dribble<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Dribble<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(self.data.len()).min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn fill_chunk_coalesces_short_reads() {
        let mut source = Dribble {
            data: &[7u8; 20],
            step: 3,
        };
        let mut buffer = [0u8; 16];
        assert_eq!(fill_chunk(&mut source, &mut buffer).unwrap(), 16);
        assert_eq!(buffer, [7u8; 16]);
        // Remainder comes out on the next fill.
        assert_eq!(fill_chunk(&mut source, &mut buffer).unwrap(), 4);
    }

    #[test]
    fn fill_chunk_reports_exhaustion_as_zero() {
        let mut source = io::Cursor::new(Vec::new());
        let mut buffer = [0u8; 8];
        assert_eq!(fill_chunk(&mut source, &mut buffer).unwrap(), 0);
    }

    #[test]
    fn fill_chunk_propagates_source_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("source died"))
            }
        }
        let mut buffer = [0u8; 8];
        assert!(fill_chunk(&mut Broken, &mut buffer).is_err());
    }
}
