//! Receiving side: buffers in, completed responses out.
//!
//! - **`buffer`**: Pooled receive buffers with single-use release
//! - **`consumer`**: The consumer loop feeding one parser per context
//! - **`context`**: One task per context, abandonment and late completions
//! - **`transport`**: Pumps an `AsyncRead` into a context

pub mod buffer;
pub mod consumer;
pub mod context;
pub mod transport;

pub use buffer::{BufferPool, ConsumerBuffer};
pub use consumer::{Framing, ResponseChannelConsumer, ResponseConsumer};
pub use context::{spawn_context, ContextEnd, ContextHandle, ContextId, ContextSummary, Contexts};
pub use transport::pump;
