// Session module
// Capture sources, the async runtime around the interaction machine, and the decision trace

pub mod capture;
pub mod runtime;
pub mod trace;

pub use capture::{
    CaptureError, CaptureSource, CapturedImage, FileSequenceSource, ScanError, Scanner,
};
pub use runtime::{spawn_session, SessionError, SessionHandle};
pub use trace::{read_trace_file, TraceEntry, TraceError, TraceWriter};
