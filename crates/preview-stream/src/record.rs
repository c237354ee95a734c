//! Per-vendor record parsing.
//!
//! A record is one complete line of the upstream body. Parsers return the
//! text delta a record carries, or `None` for lines that are not token
//! deltas or fail to decode. A `None` never aborts the session.

use tracing::trace;

/// Extracts the token delta carried by one record line.
pub trait RecordParser: Send + Sync {
    /// Returns the decoded delta for `line` (without its newline).
    fn parse(&self, line: &str) -> Option<String>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Line-prefixed data stream: `<marker>:<JSON string>`.
///
/// Only the token-delta marker is consumed; records of other kinds share the
/// stream and are skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataStreamParser {
    prefix: String,
}

impl DataStreamParser {
    /// Marker used for text deltas by the default upstream.
    pub const TEXT_DELTA_MARKER: &'static str = "0";

    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            prefix: format!("{}:", marker.into()),
        }
    }
}

impl Default for DataStreamParser {
    fn default() -> Self {
        Self::new(Self::TEXT_DELTA_MARKER)
    }
}

impl RecordParser for DataStreamParser {
    fn parse(&self, line: &str) -> Option<String> {
        let payload = line.strip_prefix(&self.prefix)?;
        match serde_json::from_str::<String>(payload) {
            Ok(text) => Some(text),
            Err(e) => {
                trace!(error = %e, "skipping record with undecodable payload");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "data-stream"
    }
}

/// OpenAI-compatible chat completion SSE lines: `data: {json}`.
///
/// Returns `choices[0].delta.content`. `data: [DONE]`, `event:` lines and
/// comments are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatCompletionSseParser;

impl RecordParser for ChatCompletionSseParser {
    fn parse(&self, line: &str) -> Option<String> {
        let data = line.strip_prefix("data:")?.trim_start();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }
        let value: serde_json::Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(e) => {
                trace!(error = %e, "skipping SSE frame with invalid JSON");
                return None;
            }
        };
        value
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|choice| choice.get("delta"))
            .and_then(|delta| delta.get("content"))
            .and_then(|v| v.as_str())
            .filter(|text| !text.is_empty())
            .map(ToOwned::to_owned)
    }

    fn name(&self) -> &'static str {
        "chat-completion-sse"
    }
}
