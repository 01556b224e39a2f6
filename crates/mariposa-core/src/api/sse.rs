//! Minimal incremental parser for `text/event-stream` bodies.
//!
//! The service only ever sends `data: {json}` frames separated by a blank
//! line, but chunk boundaries from the transport can land anywhere, so the
//! parser buffers until a complete frame is available. Comment lines
//! (leading `:`) and field lines other than `data` are skipped.

/// Incremental SSE frame parser. Feed raw transport chunks, get back the
/// `data` payload of each completed frame.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk, returning the data payloads of all frames
    /// completed by it (zero or more).
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut out = Vec::new();
        while let Some((frame, rest_at)) = next_frame(&self.buf) {
            if let Some(data) = frame_data(&frame) {
                out.push(data);
            }
            self.buf.drain(..rest_at);
        }
        out
    }
}

/// Find the earliest frame delimiter (blank line, LF or CRLF flavored).
/// Returns the frame text and the buffer offset just past the delimiter.
fn next_frame(buf: &str) -> Option<(String, usize)> {
    let lf = buf.find("\n\n").map(|i| (i, 2));
    let crlf = buf.find("\r\n\r\n").map(|i| (i, 4));
    let (at, len) = match (lf, crlf) {
        (Some(a), Some(b)) => {
            if a.0 < b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((buf[..at].to_string(), at + len))
}

/// Concatenate the `data` field lines of one frame, if any.
fn frame_data(frame: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            match data {
                Some(ref mut d) => {
                    d.push('\n');
                    d.push_str(rest);
                }
                None => data = Some(rest.to_string()),
            }
        }
    }
    data
}
