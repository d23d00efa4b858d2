//! Newline-delimited JSON framing
//!
//! One event per line. The codec owns a read buffer and yields complete
//! frames as they become available, so a read that splits an event across two
//! TCP segments is reassembled transparently.

use bytes::{Buf, Bytes, BytesMut};

use super::events::{ClientEvent, ServerEvent};
use crate::error::{Error, Result};

/// Frame delimiter
const DELIMITER: u8 = b'\n';

/// Default cap on one buffered line
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Incremental line-frame decoder over a growable buffer
///
/// The buffer is bounded: a peer that streams bytes without ever sending a
/// delimiter trips the frame-size limit instead of growing memory forever.
#[derive(Debug)]
pub struct LineCodec {
    buf: BytesMut,
    max_frame_size: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl LineCodec {
    /// Create a codec with the given initial buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a codec with an explicit per-frame size limit
    pub fn with_limits(capacity: usize, max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            max_frame_size,
        }
    }

    /// Buffer to read socket data into
    pub fn read_buf(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Pop the next complete frame, without the delimiter
    ///
    /// Returns `None` until a full line has been buffered. Empty lines are
    /// skipped (clients may send `\r\n`).
    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            let pos = self.buf.iter().position(|&b| b == DELIMITER)?;
            let mut frame = self.buf.split_to(pos + 1);
            frame.truncate(pos);
            if frame.last() == Some(&b'\r') {
                frame.truncate(pos - 1);
            }
            if !frame.is_empty() {
                return Some(frame.freeze());
            }
        }
    }

    /// Pop and parse the next complete client event
    ///
    /// Yields an error once the buffer exceeds the frame-size limit without
    /// containing a delimiter; the connection should close at that point.
    pub fn next_event(&mut self) -> Option<Result<ClientEvent>> {
        match self.next_frame() {
            Some(frame) => Some(serde_json::from_slice(&frame).map_err(Into::into)),
            None if self.buf.len() > self.max_frame_size => Some(Err(Error::FrameTooLarge {
                limit: self.max_frame_size,
            })),
            None => None,
        }
    }

    /// Number of buffered bytes not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.remaining()
    }
}

/// Encode a server event as one wire frame (JSON + delimiter)
pub fn encode_event(event: &ServerEvent) -> Result<Bytes> {
    let mut out = serde_json::to_vec(event)?;
    out.push(DELIMITER);
    Ok(Bytes::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn test_frame_split_across_reads() {
        let mut codec = LineCodec::default();

        codec.read_buf().put_slice(b"{\"event\":\"login\",\"user");
        assert!(codec.next_frame().is_none());

        codec.read_buf().put_slice(b"Id\":\"a@b.c\"}\n");
        let frame = codec.next_frame().unwrap();
        let event: ClientEvent = serde_json::from_slice(&frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::Login {
                user_id: "a@b.c".into()
            }
        );
        assert_eq!(codec.buffered(), 0);
    }

    #[test]
    fn test_multiple_frames_in_one_read() {
        let mut codec = LineCodec::default();
        codec.read_buf().put_slice(
            b"{\"event\":\"login\",\"userId\":\"a@b.c\"}\n{\"event\":\"logout\",\"userId\":\"a@b.c\"}\n",
        );

        assert!(matches!(
            codec.next_event(),
            Some(Ok(ClientEvent::Login { .. }))
        ));
        assert!(matches!(
            codec.next_event(),
            Some(Ok(ClientEvent::Logout { .. }))
        ));
        assert!(codec.next_event().is_none());
    }

    #[test]
    fn test_crlf_and_blank_lines_skipped() {
        let mut codec = LineCodec::default();
        codec
            .read_buf()
            .put_slice(b"\r\n{\"event\":\"login\",\"userId\":\"a@b.c\"}\r\n");

        assert!(matches!(
            codec.next_event(),
            Some(Ok(ClientEvent::Login { .. }))
        ));
    }

    #[test]
    fn test_malformed_frame_is_an_error_not_a_panic() {
        let mut codec = LineCodec::default();
        codec.read_buf().put_slice(b"{\"event\":\"nope\"}\n");

        assert!(matches!(codec.next_event(), Some(Err(_))));
    }

    #[test]
    fn test_undelimited_input_trips_frame_limit() {
        let mut codec = LineCodec::with_limits(64, 256);

        // Simulate a peer streaming bytes with no newline, one read at a time
        for _ in 0..8 {
            codec.read_buf().put_slice(&[b'x'; 64]);
            if codec.buffered() <= 256 {
                assert!(codec.next_event().is_none());
            }
        }

        assert!(matches!(
            codec.next_event(),
            Some(Err(crate::error::Error::FrameTooLarge { limit: 256 }))
        ));
    }

    #[test]
    fn test_frame_at_limit_still_parses() {
        let mut codec = LineCodec::with_limits(64, 256);
        codec
            .read_buf()
            .put_slice(b"{\"event\":\"login\",\"userId\":\"a@b.c\"}\n");

        assert!(matches!(
            codec.next_event(),
            Some(Ok(ClientEvent::Login { .. }))
        ));
        assert!(codec.next_event().is_none());
    }

    #[test]
    fn test_encode_appends_delimiter() {
        let frame = encode_event(&ServerEvent::CallTerminated).unwrap();
        assert_eq!(frame.last(), Some(&b'\n'));
        let text = std::str::from_utf8(&frame[..frame.len() - 1]).unwrap();
        assert_eq!(text, "{\"event\":\"callTerminated\"}");
    }
}
