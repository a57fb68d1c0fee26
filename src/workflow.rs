//! Long-running transaction workflows built on the transport core.

pub mod poll;
pub mod stream;

pub use poll::WaitOptions;
pub use stream::{EventStream, FrameDecoder, clamp_stream_timeout};
