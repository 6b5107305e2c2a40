//! Streaming utilities for the event-stream line protocol.
//!
//! The upstream speaks a line-oriented SSE dialect: only lines starting with
//! `data: ` carry payload, and `data: [DONE]` terminates the stream. The
//! outbound side uses the same framing with a blank line after each event.

/// Prefix marking a significant line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

// ============================================================================
// Line decoder
// ============================================================================

/// Splits a byte stream into lines.
///
/// Partial lines are buffered across chunks, so a line (or a multi-byte UTF-8
/// sequence) split by the network is reassembled before it is returned. A
/// trailing `\r` is stripped from every line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Flush the final line of a body that did not end with a newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

// ============================================================================
// Data lines
// ============================================================================

/// A significant upstream line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLine {
    /// Raw JSON text of one content fragment
    Payload(String),
    /// The `[DONE]` sentinel
    Done,
}

/// Classify one line of the upstream body.
///
/// Returns `None` for every line without the exact `data: ` prefix, including
/// blank keep-alive lines, comments and `event:` fields.
pub fn parse_data_line(line: &str) -> Option<DataLine> {
    let data = line.strip_prefix(DATA_PREFIX)?;
    if data == DONE_SENTINEL {
        Some(DataLine::Done)
    } else {
        Some(DataLine::Payload(data.to_string()))
    }
}

// ============================================================================
// SSE serializer
// ============================================================================

/// Format a data-only SSE event.
pub fn format_sse_data(data: &str) -> String {
    format!("{}{}\n\n", DATA_PREFIX, data)
}

/// Format the SSE done marker.
pub fn format_sse_done() -> String {
    format_sse_data(DONE_SENTINEL)
}
