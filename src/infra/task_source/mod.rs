//! Task source backends.

pub mod http;
pub mod memory;
pub mod retry;

pub use http::{Endpoints, ReqwestTransport, TaskMasterClient, Transport, TransportError};
pub use memory::InMemoryTaskSource;
pub use retry::{Delay, RecordingDelay, RetryPolicy};
#[cfg(feature = "tokio-runtime")]
pub use retry::TokioDelay;
