//! Completion pipeline: transport port, retry policy, stream decoder,
//! offline mock provider and the dispatcher that ties them together.

pub mod dispatcher;
pub mod mock;
pub mod retry;
pub mod sink;
pub mod stream;
pub mod transport;

pub use dispatcher::{CompletionDispatcher, CompletionOptions};
pub use retry::RetryPolicy;
pub use sink::TokenSink;
pub use stream::{DecodedStream, StreamDecoder};
pub use transport::{ChatRequest, ChatTransport, ProviderTarget};
