//! Message framing inside a decompressed record.
//!
//! Each message is a 12-byte legacy frame prefix (ignored) followed by a
//! 16-byte message header and the message body. The header's first field is
//! the message size in 16-bit halfwords, header included; byte 3 is the
//! message type.
//!
//! A size outside `[16, max]` bytes, or one that runs past the end of the
//! record, marks a corrupt header. The scanner then moves forward one byte
//! and tries again instead of abandoning the record.

use tracing::trace;

use crate::config::DEFAULT_MAX_MESSAGE_BYTES;
use crate::reader::ByteReader;

/// Legacy frame prefix preceding every message header.
pub const FRAME_PREFIX_LEN: usize = 12;

/// Size of the message header.
pub const MESSAGE_HEADER_LEN: usize = 16;

const MESSAGE_TYPE_OFFSET: usize = 3;

/// A framed message borrowed from its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    /// Offset of the frame prefix within the record.
    pub offset: usize,
    pub message_type: u8,
    /// Bytes after the message header.
    pub body: &'a [u8],
}

/// Iterator over the messages of one record.
#[derive(Debug, Clone)]
pub struct MessageScanner<'a> {
    data: &'a [u8],
    offset: usize,
    max_message_bytes: usize,
    resync_bytes: usize,
}

impl<'a> MessageScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_message_bytes(data, DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn with_max_message_bytes(data: &'a [u8], max_message_bytes: usize) -> Self {
        Self {
            data,
            offset: 0,
            max_message_bytes,
            resync_bytes: 0,
        }
    }

    /// Number of single-byte steps taken past corrupt headers so far.
    pub fn resync_bytes(&self) -> usize {
        self.resync_bytes
    }
}

impl<'a> Iterator for MessageScanner<'a> {
    type Item = Message<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = ByteReader::new(self.data);

        while self.offset + FRAME_PREFIX_LEN + MESSAGE_HEADER_LEN <= self.data.len() {
            let header_start = self.offset + FRAME_PREFIX_LEN;
            let header = reader.slice_at(header_start, MESSAGE_HEADER_LEN).ok()?;

            let message_len = u16::from_be_bytes([header[0], header[1]]) as usize * 2;
            let message_type = header[MESSAGE_TYPE_OFFSET];

            let end = header_start + message_len;
            if message_len < MESSAGE_HEADER_LEN
                || message_len > self.max_message_bytes
                || end > self.data.len()
            {
                trace!(offset = self.offset, message_len, "Corrupt message header, resyncing");
                self.offset += 1;
                self.resync_bytes += 1;
                continue;
            }

            let message = Message {
                offset: self.offset,
                message_type,
                body: &self.data[header_start + MESSAGE_HEADER_LEN..end],
            };
            self.offset = end;
            return Some(message);
        }

        None
    }
}
