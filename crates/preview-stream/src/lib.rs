//! Incremental decoding of streamed model output into live file previews.
//!
//! A `Generator` opens one upstream request per call, reassembles the chunked
//! response body into line records, decodes each record's text delta,
//! strips markdown code fences and pushes `Event`s to a caller-supplied sink.
//! Every `File` event carries the full current display text of the file.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use preview_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PreviewError> {
//! let generator = Generator::builder()
//!     .transport(Arc::new(HttpTransport::from_env()?))
//!     .build()?;
//!
//! let mut log = EventLog::new();
//! let output = generator
//!     .generate(GenerateRequest::new("project-1", "A landing page for a bakery"), &mut log)
//!     .await?;
//!
//! println!("{}", output.get("index.html").unwrap_or_default());
//! # Ok(())
//! # }
//! ```

/// Upstream client configuration.
pub mod config;
/// Final session output.
pub mod content;
/// Stateful chunk-to-event decoder.
pub mod decoder;
/// Public error types.
pub mod errors;
/// Event vocabulary pushed to sinks.
pub mod event;
/// Code-fence stripping for display text.
pub mod fence;
/// Generator entry point and builder.
pub mod generator;
/// HTTP transport over `reqwest`.
pub mod http;
/// Process-wide tracing setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Per-vendor record parsers.
pub mod record;
/// Inbound request and upstream body.
pub mod request;
/// Spawned-session streaming handle.
pub mod run;
/// Async session driver.
pub mod session;
/// Event sinks.
pub mod sink;
/// Transport seam and chunk stream type.
pub mod transport;

pub use config::ClientConfig;
pub use content::SessionOutput;
pub use decoder::StreamDecoder;
pub use errors::{PreviewError, ProviderError, StreamFailure};
pub use event::Event;
pub use fence::display_text;
pub use generator::{DEFAULT_FILE_NAME, Generator, GeneratorBuilder};
pub use http::HttpTransport;
pub use record::{ChatCompletionSseParser, DataStreamParser, RecordParser};
pub use request::GenerateRequest;
pub use run::GenerationStream;
pub use sink::{EventLog, EventSink};
pub use transport::{ChunkStream, Transport};
