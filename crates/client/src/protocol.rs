//! Wire protocol for clamd.
//!
//! Wire format:
//! - Command: `z` + NAME + `\0` outgoing; NAME + `\0` coming back.
//! - Chunk frame: `[4B length_be][payload...]`; a zero-length frame ends the
//!   upload stream.
//! - Response: ASCII text ending in a single `\0`.

use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};

/// Marker telling the daemon the command uses NUL-delimited framing.
const OUTGOING_PREFIX: u8 = b'z';
/// Terminator for outgoing commands and daemon replies alike.
const TERMINATOR: u8 = 0;

/// Liveness check command.
pub const CMD_PING: &[u8] = b"zPING\0";
/// Expected reply to [`CMD_PING`].
pub const RSP_PONG: &[u8] = b"PONG\0";
/// Begins a chunked upload scan.
pub const CMD_INSTREAM: &[u8] = b"zINSTREAM\0";
/// Reply the daemon gives to commands it does not recognize.
pub const RSP_UNKNOWN_COMMAND: &[u8] = b"UNKNOWN COMMAND\0";
/// Zero-length chunk frame closing an upload. Distinct from the NUL text
/// terminator: this is a chunk frame with length 0.
pub const END_OF_STREAM: [u8; 4] = [0, 0, 0, 0];

/// Encode a command name into its wire form.
///
/// Outgoing commands get the `z` framing prefix; expected replies do not.
/// Both end in a single NUL.
#[must_use]
pub fn encode_command(name: &str, outgoing: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(name.len() + 2);
    if outgoing {
        buf.push(OUTGOING_PREFIX);
    }
    buf.extend_from_slice(name.as_bytes());
    buf.push(TERMINATOR);
    buf
}

/// Write one length-prefixed chunk frame and flush.
///
/// # Errors
///
/// Returns an error if the payload length does not fit the 4-byte prefix or
/// the write fails.
pub fn write_chunk<W: Write>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "chunk exceeds u32 length"))?;
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(len);
    buf.put_slice(payload);
    w.write_all(&buf)?;
    w.flush()
}

/// Write the zero-length terminator frame and flush.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_end_of_stream<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(&END_OF_STREAM)?;
    w.flush()
}

/// Read everything from `r` until the peer closes its side.
///
/// # Errors
///
/// Returns an error if a read fails, including a read timing out.
pub fn read_response<R: Read>(r: &mut R, buffer_size: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; buffer_size];
    let mut out = Vec::new();
    loop {
        match r.read(&mut buf) {
            Ok(0) => return Ok(out),
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Decode reply bytes for human consumption, dropping the trailing NUL.
#[must_use]
pub fn decode_reply(raw: &[u8]) -> String {
    let body = raw.strip_suffix(&[TERMINATOR]).unwrap_or(raw);
    String::from_utf8_lossy(body).into_owned()
}
