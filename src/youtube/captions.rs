use serde::Deserialize;

use crate::error::{FetchError, Result};

const BOT_REASON: &str = "Sign in to confirm you’re not a bot";
const AGE_RESTRICTED_REASON: &str = "This video may be inappropriate for some users.";
const UNAVAILABLE_REASON: &str = "This video is unavailable";

/// The parts of an Innertube `player` response we care about.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer", default)]
    pub tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracklist {
    #[serde(default)]
    pub caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    #[serde(default)]
    pub name: TrackName,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackName {
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub simple_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextRun {
    pub text: String,
}

impl TrackName {
    pub fn text(&self) -> String {
        match (&self.simple_text, self.runs.first()) {
            (Some(simple), _) => simple.clone(),
            (None, Some(run)) => run.text.clone(),
            (None, None) => String::new(),
        }
    }
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// URL of the timed-text XML. The `srv3` format flag is dropped so the
    /// plain `<text start dur>` format comes back.
    pub fn transcript_url(&self) -> String {
        self.base_url.replace("&fmt=srv3", "")
    }

    pub fn requires_po_token(&self) -> bool {
        self.base_url.contains("&exp=xpe")
    }
}

impl PlayerResponse {
    /// Map a non-OK playability status to the matching error.
    pub fn assert_playable(&self, video_id: &str) -> Result<()> {
        let Some(playability) = &self.playability_status else {
            return Ok(());
        };
        let status = match playability.status.as_deref() {
            None | Some("OK") => return Ok(()),
            Some(status) => status,
        };
        let reason = playability.reason.as_deref().unwrap_or_default();

        match (status, reason) {
            ("LOGIN_REQUIRED", BOT_REASON) => Err(FetchError::RequestBlocked {
                video_id: video_id.to_string(),
            }),
            ("LOGIN_REQUIRED", AGE_RESTRICTED_REASON) => Err(FetchError::AgeRestricted {
                video_id: video_id.to_string(),
            }),
            ("ERROR", UNAVAILABLE_REASON) => {
                if video_id.starts_with("http://") || video_id.starts_with("https://") {
                    Err(FetchError::InvalidVideoId {
                        video_id: video_id.to_string(),
                    })
                } else {
                    Err(FetchError::VideoUnavailable {
                        video_id: video_id.to_string(),
                    })
                }
            }
            _ => Err(FetchError::VideoUnplayable {
                video_id: video_id.to_string(),
                reason: if reason.is_empty() {
                    status.to_string()
                } else {
                    reason.to_string()
                },
            }),
        }
    }

    /// Caption tracks offered for the video. A missing track list means
    /// subtitles are turned off.
    pub fn caption_tracks(&self, video_id: &str) -> Result<&[CaptionTrack]> {
        self.captions
            .as_ref()
            .and_then(|c| c.tracklist.as_ref())
            .and_then(|t| t.caption_tracks.as_deref())
            .ok_or_else(|| FetchError::TranscriptsDisabled {
                video_id: video_id.to_string(),
            })
    }
}

/// Pick a track for the first requested language that has one, preferring
/// manually created tracks over generated ones.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
    video_id: &str,
) -> Result<&'a CaptionTrack> {
    for code in languages {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == code);
        let manual = candidates.clone().find(|t| !t.is_generated());
        if let Some(track) = manual.or_else(|| candidates.find(|t| t.is_generated())) {
            return Ok(track);
        }
    }

    Err(FetchError::NoTranscriptFound {
        video_id: video_id.to_string(),
        requested: languages.to_vec(),
        available: describe_tracks(tracks),
    })
}

fn describe_tracks(tracks: &[CaptionTrack]) -> String {
    if tracks.is_empty() {
        return "none".to_string();
    }
    tracks
        .iter()
        .map(|t| format!("{} ({})", t.language_code, t.name.text()))
        .collect::<Vec<_>>()
        .join(", ")
}
