use futures::StreamExt as _;
use tracing::{debug, warn};

use crate::content::SessionOutput;
use crate::decoder::StreamDecoder;
use crate::errors::{ProviderError, StreamFailure};
use crate::event::Event;
use crate::request::GenerateRequest;
use crate::sink::EventSink;
use crate::transport::Transport;

/// First status message of every session.
pub const BEGIN_MESSAGE: &str = "Beginning generation...";
/// Error message for a rejected upstream request; the status stays in logs.
pub const REQUEST_FAILED_MESSAGE: &str = "Generation request failed";

/// Drives one session: status, request, chunk loop, terminal events.
///
/// Each read of the body is the only suspension point. Any failure emits
/// exactly one `Event::Error` through the decoder and ends the session; there
/// are no retries.
pub async fn run_session(
    transport: &dyn Transport,
    request: &GenerateRequest,
    decoder: &mut StreamDecoder,
    sink: &mut dyn EventSink,
) -> Result<SessionOutput, StreamFailure> {
    sink.on_event(Event::status(BEGIN_MESSAGE));

    let mut chunks = match transport.open(request).await {
        Ok(chunks) => chunks,
        Err(err) => {
            let message = match &err {
                ProviderError::Status { .. } => REQUEST_FAILED_MESSAGE.to_string(),
                ProviderError::Transport { message } => message.clone(),
            };
            warn!(error = %err, "generation request did not start");
            decoder.fail(message, sink);
            return Err(StreamFailure::from(&err));
        }
    };

    let mut total_bytes = 0_usize;
    while let Some(next) = chunks.next().await {
        match next {
            Ok(chunk) => {
                total_bytes += chunk.len();
                decoder.push_chunk(&chunk, sink);
            }
            Err(err) => {
                warn!(error = %err, bytes = total_bytes, "generation stream read failed");
                decoder.fail(err.message(), sink);
                return Err(StreamFailure::from(&err));
            }
        }
    }

    debug!(bytes = total_bytes, "generation stream ended");
    Ok(decoder.finish(sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DataStreamParser;
    use crate::sink::EventLog;
    use crate::transport::ChunkStream;
    use bytes::Bytes;
    use std::sync::Arc;

    enum FakeTransport {
        Status(u16),
        Refused(&'static str),
        Chunks(Vec<Result<&'static str, &'static str>>),
    }

    #[async_trait::async_trait]
    impl Transport for FakeTransport {
        async fn open(&self, _request: &GenerateRequest) -> Result<ChunkStream, ProviderError> {
            match self {
                Self::Status(status) => Err(ProviderError::status(*status, "rejected")),
                Self::Refused(message) => Err(ProviderError::transport(*message)),
                Self::Chunks(chunks) => {
                    let items: Vec<Result<Bytes, ProviderError>> = chunks
                        .iter()
                        .map(|item| match item {
                            Ok(text) => Ok(Bytes::from(text.to_string())),
                            Err(message) => Err(ProviderError::transport(*message)),
                        })
                        .collect();
                    Ok(Box::pin(futures::stream::iter(items)))
                }
            }
        }
    }

    async fn run(transport: FakeTransport) -> (Result<SessionOutput, StreamFailure>, Vec<Event>) {
        let mut decoder = StreamDecoder::new("index.html", Arc::new(DataStreamParser::default()));
        let mut log = EventLog::new();
        let request = GenerateRequest::new("p1", "a greeting");
        let result = run_session(&transport, &request, &mut decoder, &mut log).await;
        (result, log.into_events())
    }

    fn count(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[tokio::test]
    async fn single_record_scenario() {
        let (result, events) = run(FakeTransport::Chunks(vec![Ok("0:\"<p>Hi</p>\"\n")])).await;
        assert_eq!(
            events,
            vec![
                Event::status(BEGIN_MESSAGE),
                Event::file("index.html", "<p>Hi</p>"),
                Event::Complete,
                Event::file("index.html", "<p>Hi</p>"),
            ]
        );
        assert_eq!(result.expect("ok").get("index.html"), Some("<p>Hi</p>"));
    }

    #[tokio::test]
    async fn fenced_records_scenario_strips_all_markers() {
        let (result, events) = run(FakeTransport::Chunks(vec![
            Ok("0:\"```html\\n\"\n0:\"<di"),
            Ok("v>x</div>\"\n0:\"``"),
            Ok("`\"\n"),
        ]))
        .await;
        assert_eq!(events.last(), Some(&Event::file("index.html", "<div>x</div>")));
        assert_eq!(result.expect("ok").get("index.html"), Some("<div>x</div>"));
    }

    #[tokio::test]
    async fn server_error_scenario_emits_only_error() {
        let (result, events) = run(FakeTransport::Status(500)).await;
        assert_eq!(
            events,
            vec![
                Event::status(BEGIN_MESSAGE),
                Event::error(REQUEST_FAILED_MESSAGE)
            ]
        );
        assert_eq!(result, Err(StreamFailure::Provider { status: 500 }));
    }

    #[tokio::test]
    async fn connection_refused_reports_failure_message() {
        let (result, events) = run(FakeTransport::Refused("connection refused")).await;
        assert_eq!(events.last(), Some(&Event::error("connection refused")));
        assert!(matches!(result, Err(StreamFailure::Transport { .. })));
    }

    #[tokio::test]
    async fn read_error_mid_stream_is_single_terminal_error() {
        let (result, events) = run(FakeTransport::Chunks(vec![
            Ok("0:\"<p>\"\n"),
            Err("connection reset"),
            Ok("0:\"never\"\n"),
        ]))
        .await;
        assert_eq!(count(&events, |e| matches!(e, Event::Error { .. })), 1);
        assert_eq!(count(&events, |e| matches!(e, Event::Complete)), 0);
        assert_eq!(events.last(), Some(&Event::error("connection reset")));
        assert_eq!(
            result,
            Err(StreamFailure::Transport {
                message: "connection reset".into()
            })
        );
    }

    #[tokio::test]
    async fn malformed_record_between_valid_ones_is_ignored() {
        let (with_bad, events) = run(FakeTransport::Chunks(vec![Ok(
            "0:\"a\"\n0:\"broken\n0:\"b\"\n",
        )]))
        .await;
        let (clean, _) = run(FakeTransport::Chunks(vec![Ok("0:\"a\"\n0:\"b\"\n")])).await;
        assert_eq!(with_bad.expect("ok"), clean.expect("ok"));
        assert_eq!(count(&events, |e| matches!(e, Event::Error { .. })), 0);
    }

    #[tokio::test]
    async fn complete_is_followed_by_exactly_one_file() {
        let (_, events) = run(FakeTransport::Chunks(vec![
            Ok("0:\"a\"\n"),
            Ok("e:{\"finishReason\":\"stop\"}\n"),
            Ok("0:\"b\"\n"),
        ]))
        .await;
        assert_eq!(count(&events, |e| matches!(e, Event::Complete)), 1);
        let complete_at = events
            .iter()
            .position(|e| matches!(e, Event::Complete))
            .expect("complete");
        assert_eq!(&events[complete_at + 1..], &[Event::file("index.html", "ab")]);
    }
}
