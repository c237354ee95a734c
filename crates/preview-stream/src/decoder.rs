use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::content::SessionOutput;
use crate::event::Event;
use crate::fence::display_text;
use crate::record::RecordParser;
use crate::sink::EventSink;

/// Reassembles newline-delimited records from arbitrarily split chunks.
///
/// Bytes are buffered undecoded: a newline byte never occurs inside a
/// multi-byte UTF-8 sequence, so a character split across chunks is whole
/// again by the time its line is complete. After every `push_chunk` the
/// buffer holds at most one unterminated line.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Appends `chunk` and returns every line it completed, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let Some(last) = self.buf.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.buf.drain(..=last).collect();
        complete[..last]
            .split(|b| *b == b'\n')
            .map(|line| trim_cr(line).to_vec())
            .collect()
    }

    /// Takes the trailing unterminated line, if any.
    pub fn take_remainder(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(trim_cr(&rest).to_vec())
    }

    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Stateful transform from raw body chunks to `Event`s for one session.
///
/// Single-file: every decoded delta is appended to the file named at
/// construction. Once a terminal event (`Complete` or `Error`) has been
/// emitted, further input is ignored.
pub struct StreamDecoder {
    file_name: String,
    parser: Arc<dyn RecordParser>,
    lines: LineBuffer,
    accumulated: BTreeMap<String, String>,
    skipped: u64,
    terminal: bool,
}

impl StreamDecoder {
    pub fn new(file_name: impl Into<String>, parser: Arc<dyn RecordParser>) -> Self {
        Self {
            file_name: file_name.into(),
            parser,
            lines: LineBuffer::default(),
            accumulated: BTreeMap::new(),
            skipped: 0,
            terminal: false,
        }
    }

    /// Name of the file deltas are appended to.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Accumulated text for the active file, before fence stripping.
    pub fn accumulated(&self) -> &str {
        self.accumulated
            .get(&self.file_name)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Display text for the active file.
    pub fn display(&self) -> String {
        display_text(self.accumulated())
    }

    /// Number of complete lines skipped as malformed or foreign records.
    pub fn skipped_records(&self) -> u64 {
        self.skipped
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Feeds one chunk of the response body.
    pub fn push_chunk(&mut self, chunk: &[u8], sink: &mut dyn EventSink) {
        if self.terminal {
            return;
        }
        for line in self.lines.push_chunk(chunk) {
            self.process_line(&line, sink);
        }
        trace!(bytes = chunk.len(), pending = self.lines.pending_len(), "chunk consumed");
    }

    /// Handles end of stream: `Complete`, then a final `File` snapshot.
    ///
    /// An unterminated trailing line is treated as a last record first.
    pub fn finish(&mut self, sink: &mut dyn EventSink) -> SessionOutput {
        if !self.terminal {
            if let Some(rest) = self.lines.take_remainder() {
                self.process_line(&rest, sink);
            }
            self.terminal = true;
            debug!(file = %self.file_name, chars = self.accumulated().len(), skipped = self.skipped, "stream complete");
            sink.on_event(Event::Complete);
            sink.on_event(Event::file(self.file_name.clone(), self.display()));
        }
        self.output()
    }

    /// Emits the session's single `Error` event. Returns false if the
    /// session had already ended.
    pub fn fail(&mut self, message: impl Into<String>, sink: &mut dyn EventSink) -> bool {
        if self.terminal {
            return false;
        }
        self.terminal = true;
        sink.on_event(Event::error(message));
        true
    }

    /// Display text of every file touched so far.
    pub fn output(&self) -> SessionOutput {
        let mut files: BTreeMap<String, String> = self
            .accumulated
            .iter()
            .map(|(name, text)| (name.clone(), display_text(text)))
            .collect();
        files.entry(self.file_name.clone()).or_default();
        SessionOutput { files }
    }

    fn process_line(&mut self, line: &[u8], sink: &mut dyn EventSink) {
        if line.is_empty() {
            return;
        }
        let Ok(text) = std::str::from_utf8(line) else {
            self.skipped += 1;
            debug!(bytes = line.len(), "skipping record with invalid UTF-8");
            return;
        };
        let Some(delta) = self.parser.parse(text) else {
            self.skipped += 1;
            trace!(parser = self.parser.name(), "skipping record");
            return;
        };
        if delta.is_empty() {
            return;
        }
        let accumulated = self.accumulated.entry(self.file_name.clone()).or_default();
        accumulated.push_str(&delta);
        let content = display_text(accumulated);
        sink.on_event(Event::file(self.file_name.clone(), content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DataStreamParser;
    use crate::sink::EventLog;

    fn decoder() -> StreamDecoder {
        StreamDecoder::new("index.html", Arc::new(DataStreamParser::default()))
    }

    fn feed(chunks: &[&[u8]]) -> (StreamDecoder, EventLog) {
        let mut decoder = decoder();
        let mut log = EventLog::new();
        for chunk in chunks {
            decoder.push_chunk(chunk, &mut log);
        }
        (decoder, log)
    }

    #[test]
    fn line_buffer_holds_back_partial_line() {
        let mut buf = LineBuffer::default();
        assert!(buf.push_chunk(b"0:\"Hel").is_empty());
        assert_eq!(buf.pending_len(), 6);
        let lines = buf.push_chunk(b"lo\"\n0:\"x");
        assert_eq!(lines, vec![b"0:\"Hello\"".to_vec()]);
        assert_eq!(buf.take_remainder(), Some(b"0:\"x".to_vec()));
        assert_eq!(buf.take_remainder(), None);
    }

    #[test]
    fn line_buffer_splits_many_lines_and_strips_cr() {
        let mut buf = LineBuffer::default();
        let lines = buf.push_chunk(b"a\r\nb\n\nc\n");
        assert_eq!(lines, vec![b"a".to_vec(), b"b".to_vec(), Vec::new(), b"c".to_vec()]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn record_split_across_chunks_matches_single_chunk() {
        let (split, _) = feed(&[b"0:\"Hel", b"lo\"\n"]);
        let (whole, _) = feed(&[b"0:\"Hello\"\n"]);
        assert_eq!(split.accumulated(), "Hello");
        assert_eq!(split.accumulated(), whole.accumulated());
    }

    #[test]
    fn every_byte_split_yields_same_accumulated_text() {
        let stream = "0:\"<h1>\"\n0:\"caf\u{e9} \u{1F600}\"\ne:{\"x\":1}\n0:\"</h1>\"\n".as_bytes();
        let (reference, _) = feed(&[stream]);
        for step in 1..=stream.len() {
            let chunks: Vec<&[u8]> = stream.chunks(step).collect();
            let (decoder, _) = feed(&chunks);
            assert_eq!(decoder.accumulated(), reference.accumulated(), "step {step}");
        }
        assert_eq!(reference.accumulated(), "<h1>caf\u{e9} \u{1F600}</h1>");
    }

    #[test]
    fn multibyte_character_split_between_chunks() {
        let bytes = "0:\"\u{e9}\"\n".as_bytes();
        // split inside the two-byte encoding of é
        let (decoder, log) = feed(&[&bytes[..4], &bytes[4..]]);
        assert_eq!(decoder.accumulated(), "\u{e9}");
        assert_eq!(log.events(), &[Event::file("index.html", "\u{e9}")]);
    }

    #[test]
    fn malformed_lines_are_skipped_without_error() {
        let (with_bad, log) = feed(&[b"0:\"a\"\n0:\"b\\q\"\n0:\"c\"\n"]);
        let (clean, _) = feed(&[b"0:\"a\"\n0:\"c\"\n"]);
        assert_eq!(with_bad.accumulated(), clean.accumulated());
        assert_eq!(with_bad.skipped_records(), 1);
        assert_eq!(log.error_message(), None);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let (decoder, log) = feed(&[b"0:\"a\"\n0:\"\xff\"\n0:\"b\"\n"]);
        assert_eq!(decoder.accumulated(), "ab");
        assert_eq!(decoder.skipped_records(), 1);
        assert!(log.events().iter().all(|e| !e.is_terminal()));
    }

    #[test]
    fn file_events_carry_full_display_snapshots() {
        let (_, log) = feed(&[b"0:\"```html\\n\"\n0:\"<div>x</div>\"\n0:\"```\"\n"]);
        assert_eq!(
            log.events(),
            &[
                Event::file("index.html", ""),
                Event::file("index.html", "<div>x</div>"),
                Event::file("index.html", "<div>x</div>"),
            ]
        );
    }

    #[test]
    fn fence_split_across_records_is_stripped_once_complete() {
        let (decoder, log) = feed(&[b"0:\"``\"\n", b"0:\"`html\\n<b>\"\n"]);
        assert_eq!(decoder.display(), "<b>");
        assert_eq!(log.latest_files().get("index.html").map(String::as_str), Some("<b>"));
    }

    #[test]
    fn finish_emits_complete_then_final_file() {
        let (mut decoder, mut log) = feed(&[b"0:\"<p>Hi</p>\"\n"]);
        let output = decoder.finish(&mut log);
        assert_eq!(
            log.events(),
            &[
                Event::file("index.html", "<p>Hi</p>"),
                Event::Complete,
                Event::file("index.html", "<p>Hi</p>"),
            ]
        );
        assert_eq!(output.get("index.html"), Some("<p>Hi</p>"));
    }

    #[test]
    fn finish_processes_unterminated_trailing_record() {
        let (mut decoder, mut log) = feed(&[b"0:\"a\"\n0:\"b\""]);
        decoder.finish(&mut log);
        assert_eq!(decoder.accumulated(), "ab");
        let tail: Vec<&Event> = log.events().iter().rev().take(2).collect();
        assert_eq!(tail, vec![&Event::file("index.html", "ab"), &Event::Complete]);
    }

    #[test]
    fn finish_on_empty_stream_emits_empty_file() {
        let mut decoder = decoder();
        let mut log = EventLog::new();
        let output = decoder.finish(&mut log);
        assert_eq!(log.events(), &[Event::Complete, Event::file("index.html", "")]);
        assert_eq!(output.get("index.html"), Some(""));
    }

    #[test]
    fn terminal_decoder_ignores_further_input() {
        let (mut decoder, mut log) = feed(&[b"0:\"a\"\n"]);
        assert!(decoder.fail("connection reset", &mut log));
        assert!(!decoder.fail("again", &mut log));
        decoder.push_chunk(b"0:\"b\"\n", &mut log);
        decoder.finish(&mut log);
        assert_eq!(
            log.events(),
            &[Event::file("index.html", "a"), Event::error("connection reset")]
        );
    }
}
