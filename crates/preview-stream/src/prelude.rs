//! Common imports for typical usage.
pub use crate::{
    ClientConfig, Event, EventLog, EventSink, GenerateRequest, GenerationStream, Generator,
    GeneratorBuilder, HttpTransport, PreviewError, SessionOutput, StreamFailure,
};
