use crate::error::Result;
use crate::proxy::ProxyConfig;
use crate::transcript::TranscriptSegment;

/// A transcript as returned by a [`TranscriptApi`].
#[derive(Debug, Clone)]
pub struct FetchedTranscript {
    pub video_id: String,
    /// Human-readable track name, e.g. "English (auto-generated)".
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub snippets: Vec<TranscriptSegment>,
}

pub trait TranscriptApi: Send {
    fn name(&self) -> &str;
    fn fetch(&self, video_id: &str) -> Result<FetchedTranscript>;
}

/// Builds a [`TranscriptApi`] either for direct access or routed through a proxy.
pub trait ApiFactory {
    fn direct(&self) -> Result<Box<dyn TranscriptApi>>;
    fn with_proxy(&self, proxy: &ProxyConfig) -> Result<Box<dyn TranscriptApi>>;
}
