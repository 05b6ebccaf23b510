//! TCP session transport.
//!
//! One [`Session`] per command exchange or streaming scan; never pooled or
//! reused. Dropping the session closes the connection.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use tracing::trace;

/// One duplex connection to the daemon.
pub struct Session {
    inner: TcpStream,
}

impl Session {
    /// Connect to `host:port` and apply the per-read timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached or the timeout cannot
    /// be applied.
    pub fn connect(host: &str, port: u16, read_timeout: Duration) -> io::Result<Self> {
        trace!(host, port, "connecting to daemon");
        let inner = TcpStream::connect((host, port))?;
        inner.set_read_timeout(Some(read_timeout))?;
        Ok(Self { inner })
    }

    /// Non-blocking check for reply bytes the daemon sent unprompted.
    ///
    /// During an upload the daemon stays silent until the terminator frame;
    /// bytes arriving earlier mean it has already given its verdict and
    /// stopped caring about the rest of the stream.
    ///
    /// A clean EOF with nothing buffered reports `false`: the next write
    /// surfaces the closed connection as an ordinary transport error.
    ///
    /// # Errors
    ///
    /// Returns an error if toggling the socket mode or peeking fails.
    pub fn response_pending(&mut self) -> io::Result<bool> {
        self.inner.set_nonblocking(true)?;
        let mut probe = [0u8; 1];
        let peeked = self.inner.peek(&mut probe);
        self.inner.set_nonblocking(false)?;
        match peeked {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for Session {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn local_pair() -> (Session, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let session = Session::connect("127.0.0.1", port, Duration::from_millis(500)).unwrap();
        let (peer, _) = listener.accept().unwrap();
        (session, peer)
    }

    #[test]
    fn connect_fails_without_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = Session::connect("127.0.0.1", port, Duration::from_millis(100));
        assert!(result.is_err());
    }

    #[test]
    fn no_response_pending_on_silent_peer() {
        let (mut session, _peer) = local_pair();
        assert!(!session.response_pending().unwrap());
    }

    #[test]
    fn response_pending_after_peer_writes() {
        let (mut session, mut peer) = local_pair();
        peer.write_all(b"stream: OK\0").unwrap();
        peer.flush().unwrap();

        // Loopback delivery is quick but not instant.
        for _ in 0..100 {
            if session.response_pending().unwrap() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("peer bytes never became visible to the probe");
    }

    #[test]
    fn probe_leaves_reply_bytes_unconsumed() {
        let (mut session, mut peer) = local_pair();
        peer.write_all(b"PONG\0").unwrap();
        drop(peer);

        while !session.response_pending().unwrap() {
            std::thread::sleep(Duration::from_millis(5));
        }
        let mut out = Vec::new();
        session.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"PONG\0");
    }

    #[test]
    fn probe_reports_false_on_bare_eof() {
        let (mut session, peer) = local_pair();
        drop(peer);

        // Give the FIN time to arrive, then probe: closed-with-no-data must
        // not look like a pending response.
        std::thread::sleep(Duration::from_millis(50));
        assert!(!session.response_pending().unwrap());
    }
}
