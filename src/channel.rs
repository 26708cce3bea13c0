//! # Byte Channel I/O
//!
//! The guest exchanges exactly two documents with the host through its
//! standard descriptors: one request read from stdin and one response
//! written to stdout. Host call replies arrive on stdin as well, one
//! complete document per call.
//!
//! ## Framing
//!
//! There is no length prefix. A document ends where the stream ends:
//!
//! ```text
//! read(fd 0, buf[1024]) → n₁ > 0   append buf[..n₁]
//! read(fd 0, buf[1024]) → n₂ > 0   append buf[..n₂]
//! ...
//! read(fd 0, buf[1024]) → 0        end of document
//! ```
//!
//! The assembled buffer is independent of how the host splits the bytes
//! across reads.
//!
//! ## Ownership
//!
//! These are the only functions in the crate that touch the standard
//! descriptors. The growing input buffer is owned by [`read_all`] and is
//! handed to the caller only when complete.

use crate::constants::READ_CHUNK_SIZE;
use crate::envelope;
use crate::error::Result;
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};
use tracing::debug;

/// Reads `reader` to end-of-stream into one contiguous buffer.
///
/// Each read uses a fixed [`READ_CHUNK_SIZE`] buffer; chunks are appended
/// in arrival order. An immediately exhausted stream yields an empty
/// buffer. Interrupted reads are retried.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the descriptor fails.
pub fn read_all<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut input = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut reads = 0usize;

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                input.extend_from_slice(&chunk[..n]);
                reads += 1;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    debug!(bytes = input.len(), reads, "read input document");
    Ok(input)
}

/// Encodes `value` as JSON and writes every byte to `writer`.
///
/// A partial write is never reported as success: either the whole
/// document reaches the descriptor or an error is returned.
///
/// # Errors
///
/// - [`Error::Serialization`](crate::Error::Serialization) if `value`
///   cannot be encoded
/// - [`Error::Io`](crate::Error::Io) if the descriptor fails
pub fn write_all<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let bytes = envelope::encode(value)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    debug!(bytes = bytes.len(), "wrote output document");
    Ok(())
}

/// The process's standard descriptors.
///
/// Stateless; each call locks the descriptor for its duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdChannel;

impl StdChannel {
    /// Reads stdin to end-of-stream.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        read_all(&mut std::io::stdin().lock())
    }

    /// Writes one JSON document to stdout.
    pub fn write_all<T: Serialize>(&self, value: &T) -> Result<()> {
        write_all(&mut std::io::stdout().lock(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Reader that fails once with `Interrupted` before yielding data.
    struct InterruptedOnce {
        interrupted: bool,
        data: io::Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn read_all_retries_interrupted() {
        let mut reader = InterruptedOnce {
            interrupted: false,
            data: io::Cursor::new(b"{}".to_vec()),
        };
        assert_eq!(read_all(&mut reader).unwrap(), b"{}");
    }

    #[test]
    fn read_all_spans_multiple_chunks() {
        let payload = vec![b'x'; READ_CHUNK_SIZE * 3 + 17];
        let mut reader = io::Cursor::new(payload.clone());
        assert_eq!(read_all(&mut reader).unwrap(), payload);
    }

    #[test]
    fn write_all_emits_compact_json() {
        let mut out = Vec::new();
        write_all(&mut out, &serde_json::json!({"valid": true})).unwrap();
        assert_eq!(out, br#"{"valid":true}"#);
    }
}
