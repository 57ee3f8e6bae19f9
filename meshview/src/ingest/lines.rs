//! Line splitting for the text event stream.

use bytes::{Buf, BytesMut};

/// Prefix of a line that carries an event payload.
pub const DATA_PREFIX: &[u8] = b"data: ";

/// Largest partial line kept while waiting for its newline.
pub const MAX_PENDING_LINE: usize = 2 * 1024 * 1024;

/// Accumulates stream bytes and yields complete `data: ` payloads.
///
/// Lines end at `\n`; a trailing `\r` is stripped. Lines without the data
/// prefix (comments, `event:`, `id:`, blank separators) are skipped. A
/// partial line is carried over to the next chunk.
#[derive(Debug)]
pub struct SseLineBuffer {
    buffer: BytesMut,
    max_pending: usize,
    discarded: u64,
    /// Leading bytes of `buffer` already known to hold no newline.
    scanned: usize,
    /// Dropping the remainder of a discarded line.
    skipping: bool,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::with_max_pending(MAX_PENDING_LINE)
    }

    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            max_pending,
            discarded: 0,
            scanned: 0,
            skipping: false,
        }
    }

    /// Append a chunk and return the payloads of every line it completed.
    ///
    /// If the remaining partial line exceeds the pending limit it is
    /// discarded, and bytes up to the next newline are dropped with it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            self.scanned = 0;
            let line = self.buffer.split_to(end + 1);
            if self.skipping {
                self.skipping = false;
                continue;
            }
            let mut line = &line[..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
                payloads.push(String::from_utf8_lossy(payload).into_owned());
            }
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_pending {
            if !self.skipping {
                self.discarded += 1;
                self.skipping = true;
            }
            self.buffer.advance(self.buffer.len());
            self.scanned = 0;
        }

        payloads
    }

    /// Bytes of the current partial line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Number of oversized partial lines discarded so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Forget any partial line, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.skipping = false;
    }
}

impl Default for SseLineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
