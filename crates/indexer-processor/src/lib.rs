mod handlers;
mod pipeline;
pub mod sinks;

pub use handlers::ApplyOutcome;
pub use pipeline::{EventProcessor, WindowSummary};
pub use sinks::{CompositeSink, EventSink, NotifierSink, SinkEvent};
