use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument as _, info, info_span};

use crate::content::SessionOutput;
use crate::decoder::StreamDecoder;
use crate::errors::{PreviewError, StreamFailure};
use crate::record::{DataStreamParser, RecordParser};
use crate::request::{DEFAULT_MAX_PROMPT_CHARS, GenerateRequest};
use crate::session::run_session;
use crate::sink::EventSink;
use crate::transport::Transport;

/// File name every decoded delta is written to unless overridden.
pub const DEFAULT_FILE_NAME: &str = "index.html";

pub(crate) struct GeneratorInner {
    transport: Arc<dyn Transport>,
    parser: Arc<dyn RecordParser>,
    file_name: String,
    timeout: Option<Duration>,
    max_prompt_chars: usize,
}

/// Entry point for generation sessions.
///
/// Cheap to clone; every call to `generate` or `start_stream` starts a fresh
/// session with its own decoder state.
#[derive(Clone)]
pub struct Generator {
    pub(crate) inner: Arc<GeneratorInner>,
}

impl Generator {
    /// Starts a builder for configuring a `Generator`.
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    /// Name of the file sessions write to.
    pub fn file_name(&self) -> &str {
        &self.inner.file_name
    }

    /// Runs one session to completion, pushing events to `sink`.
    ///
    /// Validation failures return before any event is emitted. Every other
    /// failure has already been reported through exactly one `Event::Error`
    /// when this returns `Err`.
    pub async fn generate(
        &self,
        request: GenerateRequest,
        sink: &mut dyn EventSink,
    ) -> Result<SessionOutput, PreviewError> {
        request.validate(self.inner.max_prompt_chars)?;
        self.run_validated(request, sink).await
    }

    pub(crate) fn validate(&self, request: &GenerateRequest) -> Result<(), PreviewError> {
        request.validate(self.inner.max_prompt_chars)
    }

    pub(crate) async fn run_validated(
        &self,
        request: GenerateRequest,
        sink: &mut dyn EventSink,
    ) -> Result<SessionOutput, PreviewError> {
        let session_id = uuid::Uuid::new_v4();
        let span = info_span!("generation", %session_id, target_id = %request.target_id);
        self.run_with_timeout(request, sink)
            .instrument(span)
            .await
            .map_err(PreviewError::from)
    }

    async fn run_with_timeout(
        &self,
        request: GenerateRequest,
        sink: &mut dyn EventSink,
    ) -> Result<SessionOutput, StreamFailure> {
        let inner = &self.inner;
        let mut decoder = StreamDecoder::new(inner.file_name.clone(), inner.parser.clone());
        info!(parser = inner.parser.name(), file = %inner.file_name, "generation started");

        let Some(limit) = inner.timeout else {
            return run_session(inner.transport.as_ref(), &request, &mut decoder, sink).await;
        };
        let outcome = tokio::time::timeout(
            limit,
            run_session(inner.transport.as_ref(), &request, &mut decoder, sink),
        )
        .await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                decoder.fail(format!("generation timed out after {limit:?}"), sink);
                Err(StreamFailure::TimedOut { after: limit })
            }
        }
    }
}

/// Builder used to configure a `Generator`.
pub struct GeneratorBuilder {
    transport: Option<Arc<dyn Transport>>,
    parser: Arc<dyn RecordParser>,
    file_name: String,
    timeout: Option<Duration>,
    max_prompt_chars: usize,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            parser: Arc::new(DataStreamParser::default()),
            file_name: DEFAULT_FILE_NAME.to_string(),
            timeout: None,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

impl GeneratorBuilder {
    /// Sets the upstream transport. Required.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default `0:`-marker record parser.
    pub fn record_parser(mut self, parser: Arc<dyn RecordParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Sets the file name decoded text is written to.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Bounds the whole session, request included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the prompt length limit enforced before a session starts.
    pub fn max_prompt_chars(mut self, max: usize) -> Self {
        self.max_prompt_chars = max;
        self
    }

    /// Builds the generator and validates its configuration.
    pub fn build(self) -> Result<Generator, PreviewError> {
        let transport = self
            .transport
            .ok_or_else(|| PreviewError::Config("a transport is required".into()))?;
        if self.file_name.trim().is_empty() {
            return Err(PreviewError::Config("file name must not be empty".into()));
        }
        if self.max_prompt_chars == 0 {
            return Err(PreviewError::Config(
                "max_prompt_chars must be greater than 0".into(),
            ));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(PreviewError::Config("timeout must be greater than 0".into()));
        }
        Ok(Generator {
            inner: Arc::new(GeneratorInner {
                transport,
                parser: self.parser,
                file_name: self.file_name,
                timeout: self.timeout,
                max_prompt_chars: self.max_prompt_chars,
            }),
        })
    }
}
