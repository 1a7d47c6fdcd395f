pub mod cli;
pub mod config;
pub mod error;
pub mod proxy;
pub mod transcript;
pub mod youtube;

pub use error::{ErrorKind, FetchError};
pub use proxy::ProxyConfig;
pub use transcript::{fetch_transcript, TranscriptResult, TranscriptSegment};
