/// Coarse classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failures, blocked IPs, bad proxy setup.
    Network,
    /// The video or a matching transcript does not exist.
    NotFound,
    /// The video exists but transcripts cannot be served for it.
    Disabled,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::NotFound => write!(f, "not_found"),
            Self::Disabled => write!(f, "disabled"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Everything that can go wrong while building a client or fetching a transcript.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("could not build HTTP client: {0}")]
    ClientBuild(String),

    #[error("invalid proxy configuration: {0}")]
    InvalidProxy(String),

    #[error("YouTube is blocking requests from this IP for video {video_id}")]
    IpBlocked { video_id: String },

    #[error("YouTube flagged the request as coming from a bot for video {video_id}")]
    RequestBlocked { video_id: String },

    #[error("the video is no longer available: {video_id}")]
    VideoUnavailable { video_id: String },

    #[error("invalid video id {video_id:?}: pass the video id, not the URL")]
    InvalidVideoId { video_id: String },

    #[error("video {video_id} is age restricted and requires authentication")]
    AgeRestricted { video_id: String },

    #[error("video {video_id} is unplayable: {reason}")]
    VideoUnplayable { video_id: String, reason: String },

    #[error("subtitles are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error(
        "no transcript found for video {video_id} in languages {requested:?} (available: {available})"
    )]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: String,
    },

    #[error("video {video_id} requires a PO token to fetch its transcript")]
    PoTokenRequired { video_id: String },

    #[error("failed to automatically give consent to save cookies for video {video_id}")]
    FailedToCreateConsentCookie { video_id: String },

    #[error("could not parse data returned by YouTube for video {video_id}: {detail}")]
    YouTubeDataUnparsable { video_id: String, detail: String },

    /// Raised by a [`TranscriptApi`](crate::youtube::api::TranscriptApi)
    /// implementation that has no more specific variant.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_)
            | Self::HttpStatus { .. }
            | Self::ClientBuild(_)
            | Self::InvalidProxy(_)
            | Self::IpBlocked { .. }
            | Self::RequestBlocked { .. } => ErrorKind::Network,
            Self::VideoUnavailable { .. }
            | Self::InvalidVideoId { .. }
            | Self::NoTranscriptFound { .. } => ErrorKind::NotFound,
            Self::TranscriptsDisabled { .. }
            | Self::AgeRestricted { .. }
            | Self::VideoUnplayable { .. }
            | Self::PoTokenRequired { .. } => ErrorKind::Disabled,
            Self::FailedToCreateConsentCookie { .. }
            | Self::YouTubeDataUnparsable { .. }
            | Self::Other(_) => ErrorKind::Unknown,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_video_unavailable() {
        let e = FetchError::VideoUnavailable {
            video_id: "abc123".into(),
        };
        assert_eq!(e.to_string(), "the video is no longer available: abc123");
    }

    #[test]
    fn test_error_display_no_transcript_found() {
        let e = FetchError::NoTranscriptFound {
            video_id: "abc123".into(),
            requested: vec!["de".into()],
            available: "en (English)".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("\"de\""));
        assert!(msg.contains("en (English)"));
    }

    #[test]
    fn test_error_kind_classification() {
        let id = || "abc123".to_string();
        assert_eq!(
            FetchError::IpBlocked { video_id: id() }.kind(),
            ErrorKind::Network
        );
        assert_eq!(
            FetchError::InvalidProxy("bad".into()).kind(),
            ErrorKind::Network
        );
        assert_eq!(
            FetchError::VideoUnavailable { video_id: id() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            FetchError::TranscriptsDisabled { video_id: id() }.kind(),
            ErrorKind::Disabled
        );
        assert_eq!(
            FetchError::YouTubeDataUnparsable {
                video_id: id(),
                detail: "x".into()
            }
            .kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_error_kind_display_is_snake_case() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::Disabled.to_string(), "disabled");
    }
}
