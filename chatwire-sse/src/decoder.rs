//! Incremental decoder turning raw byte chunks into [`SseFrame`]s.
//!
//! The wire format is a relaxed form of Server-Sent Events:
//!
//! ```text
//! event: metadata
//! data: {"conversationId":"c1","messageId":"m1"}
//!
//! data: Hello
//!
//! event: end
//! data:
//! ```
//!
//! Records end at a blank line (`\n\n` or `\r\n\r\n`). Chunks may split a
//! record, a line, or a multi-byte character anywhere; the decoder keeps
//! whatever is incomplete until the next [`feed`](FrameDecoder::feed).

use chatwire_types::{DEFAULT_EVENT, END_EVENT, SseFrame};

/// Accumulates stream text across chunks and extracts complete records.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Decoded text not yet terminated by a blank line.
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Offset in `buffer` already searched for a record delimiter.
    scanned: usize,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.decode_into_buffer(chunk);

        let mut frames = Vec::new();
        while let Some((end, delimiter_len)) = find_record_end(&self.buffer, self.scanned) {
            let rest = self.buffer.split_off(end + delimiter_len);
            let mut record = std::mem::replace(&mut self.buffer, rest);
            record.truncate(end);
            self.scanned = 0;
            if let Some(frame) = parse_record(&record) {
                frames.push(frame);
            }
        }
        // A delimiter may straddle the next chunk, so the last two bytes are
        // searched again.
        self.scanned = self.buffer.len().saturating_sub(2);
        frames
    }

    /// Drain whatever is left at end of input.
    ///
    /// A stream that ends without a trailing blank line still yields its
    /// last record here.
    pub fn flush(&mut self) -> Option<SseFrame> {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        self.scanned = 0;
        let rest = std::mem::take(&mut self.buffer);
        parse_record(&rest)
    }

    /// Text buffered but not yet emitted as a frame.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.pending.is_empty()
    }

    fn decode_into_buffer(&mut self, chunk: &[u8]) {
        let joined;
        let mut input: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            let mut bytes = std::mem::take(&mut self.pending);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                    }
                }
            }
        }
    }
}

/// Locate the first blank line at or after byte `from`. Returns the record
/// length and the length of the delimiter that follows it.
fn find_record_end(buffer: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = buffer.as_bytes();
    for (i, byte) in bytes.iter().enumerate().skip(from) {
        if *byte != b'\n' {
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'\n') => return Some((i, 2)),
            Some(b'\r') if bytes.get(i + 2) == Some(&b'\n') => return Some((i, 3)),
            _ => {}
        }
    }
    None
}

/// Parse one record. Returns `None` when no payload can be determined.
///
/// The payload is the joined, trimmed `data:` value. A record with no field
/// lines at all is bare text and becomes its own payload. A record whose
/// `data:` value is empty, or that carries only an `event:` line, is dropped,
/// except for [`END_EVENT`], which never needs a payload.
fn parse_record(record: &str) -> Option<SseFrame> {
    let mut event: Option<String> = None;
    let mut data: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for raw in record.split('\n') {
        let line = raw.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        body.push(line);

        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            let value = value.trim();
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }

    let raw_record = body.join("\n");
    let raw_record = raw_record.trim();
    if raw_record.is_empty() {
        return None;
    }

    let payload = match (&event, data) {
        (_, Some(d)) if !d.trim().is_empty() => d,
        (Some(name), _) if name == END_EVENT => String::new(),
        // Upstream sometimes sends bare text without any field lines.
        (None, None) => raw_record.to_string(),
        _ => return None,
    };

    let event = event
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_EVENT.to_string());

    Some(SseFrame {
        event,
        data: payload,
    })
}
