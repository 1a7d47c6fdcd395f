pub mod api;
pub mod captions;
pub mod client;
pub mod parser;

pub use api::{ApiFactory, FetchedTranscript, TranscriptApi};
pub use client::{YouTubeApi, YouTubeApiFactory};
