use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{FetchError, Result};
use crate::proxy::ProxyConfig;
use crate::youtube::api::ApiFactory;

/// One timed unit of transcript text. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Outcome of a single fetch. Serializes to the JSON record written to disk.
#[derive(Debug)]
pub enum TranscriptResult {
    Success {
        video_id: String,
        snippets: Vec<TranscriptSegment>,
        total_duration: f64,
    },
    Failure {
        video_id: String,
        error: FetchError,
    },
}

impl TranscriptResult {
    pub fn success(video_id: impl Into<String>, snippets: Vec<TranscriptSegment>) -> Self {
        let total_duration = total_duration(&snippets);
        Self::Success {
            video_id: video_id.into(),
            snippets,
            total_duration,
        }
    }

    pub fn failure(video_id: impl Into<String>, error: FetchError) -> Self {
        Self::Failure {
            video_id: video_id.into(),
            error,
        }
    }

    pub fn video_id(&self) -> &str {
        match self {
            Self::Success { video_id, .. } | Self::Failure { video_id, .. } => video_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn snippets(&self) -> &[TranscriptSegment] {
        match self {
            Self::Success { snippets, .. } => snippets,
            Self::Failure { .. } => &[],
        }
    }

    pub fn snippet_count(&self) -> usize {
        self.snippets().len()
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl Serialize for TranscriptResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Success {
                video_id,
                snippets,
                total_duration,
            } => {
                let mut state = serializer.serialize_struct("TranscriptResult", 5)?;
                state.serialize_field("video_id", video_id)?;
                state.serialize_field("snippets", snippets)?;
                // An empty transcript reports a plain integer zero.
                if snippets.is_empty() {
                    state.serialize_field("total_duration", &0)?;
                } else {
                    state.serialize_field("total_duration", total_duration)?;
                }
                state.serialize_field("snippet_count", &snippets.len())?;
                state.serialize_field("success", &true)?;
                state.end()
            }
            Self::Failure { video_id, error } => {
                let mut state = serializer.serialize_struct("TranscriptResult", 3)?;
                state.serialize_field("video_id", video_id)?;
                state.serialize_field("error", &error.to_string())?;
                state.serialize_field("success", &false)?;
                state.end()
            }
        }
    }
}

/// End time of the last segment, or zero for an empty transcript.
pub fn total_duration(snippets: &[TranscriptSegment]) -> f64 {
    snippets
        .last()
        .map(|last| last.start + last.duration)
        .unwrap_or(0.0)
}

/// Fetch the transcript for `video_id`, routing through the proxy when
/// credentials are given.
///
/// Never fails: any error from building the client or fetching is captured in
/// [`TranscriptResult::Failure`].
pub fn fetch_transcript(
    factory: &dyn ApiFactory,
    video_id: &str,
    proxy: Option<&ProxyConfig>,
) -> TranscriptResult {
    match try_fetch(factory, video_id, proxy) {
        Ok(snippets) => {
            let result = TranscriptResult::success(video_id, snippets);
            tracing::info!(
                "Fetched {} snippets for {}",
                result.snippet_count(),
                video_id
            );
            result
        }
        Err(e) => {
            tracing::warn!(
                "Failed to fetch transcript for {} ({}): {}",
                video_id,
                e.kind(),
                e
            );
            TranscriptResult::failure(video_id, e)
        }
    }
}

fn try_fetch(
    factory: &dyn ApiFactory,
    video_id: &str,
    proxy: Option<&ProxyConfig>,
) -> Result<Vec<TranscriptSegment>> {
    let api = match proxy {
        Some(proxy) => {
            tracing::debug!("Using proxy for user {}", proxy.proxy_username);
            factory.with_proxy(proxy)?
        }
        None => factory.direct()?,
    };

    tracing::debug!("Fetching {} via {}", video_id, api.name());
    let fetched = api.fetch(video_id)?;
    tracing::debug!(
        "Selected transcript {} ({}), generated={}",
        fetched.language_code,
        fetched.language,
        fetched.is_generated
    );

    Ok(fetched.snippets)
}
