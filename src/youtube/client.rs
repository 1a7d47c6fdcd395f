use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::StatusCode;
use url::Url;

use crate::config::{Config, WebshareConfig, YouTubeConfig};
use crate::error::{FetchError, Result};
use crate::proxy::ProxyConfig;
use crate::youtube::api::{ApiFactory, FetchedTranscript, TranscriptApi};
use crate::youtube::captions::{select_track, PlayerResponse};
use crate::youtube::parser::parse_transcript_xml;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player?key=";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";
const CONSENT_FORM_MARKER: &str = r#"action="https://consent.youtube.com/s""#;
const RECAPTCHA_MARKER: &str = r#"class="g-recaptcha""#;

fn api_key_regex() -> &'static Regex {
    static API_KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    API_KEY_REGEX.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("static regex")
    })
}

fn consent_value_regex() -> &'static Regex {
    static CONSENT_VALUE_REGEX: OnceLock<Regex> = OnceLock::new();
    CONSENT_VALUE_REGEX
        .get_or_init(|| Regex::new(r#"name="v" value="(.*?)""#).expect("static regex"))
}

/// Builds blocking YouTube clients, optionally routed through Webshare.
#[derive(Debug, Clone)]
pub struct YouTubeApiFactory {
    youtube: YouTubeConfig,
    proxy: WebshareConfig,
}

impl YouTubeApiFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            youtube: config.youtube.clone(),
            proxy: config.proxy.clone(),
        }
    }

    fn build_client(&self, proxy_url: Option<Url>) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.youtube.timeout_secs))
            .user_agent(self.youtube.user_agent.as_str())
            .default_headers(headers);

        if let Some(url) = proxy_url {
            let proxy = reqwest::Proxy::all(url.as_str())
                .map_err(|e| FetchError::InvalidProxy(e.to_string()))?;
            // No pooled connections, so every request gets a fresh exit IP.
            builder = builder.proxy(proxy).pool_max_idle_per_host(0);
        }

        builder
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))
    }
}

impl ApiFactory for YouTubeApiFactory {
    fn direct(&self) -> Result<Box<dyn TranscriptApi>> {
        let client = self.build_client(None)?;
        Ok(Box::new(YouTubeApi {
            client,
            languages: self.youtube.languages.clone(),
            name: "youtube",
        }))
    }

    fn with_proxy(&self, proxy: &ProxyConfig) -> Result<Box<dyn TranscriptApi>> {
        let url = proxy.webshare_url(&self.proxy)?;
        tracing::debug!(
            "Routing through proxy {}:{}",
            self.proxy.domain,
            self.proxy.port
        );
        let client = self.build_client(Some(url))?;
        Ok(Box::new(YouTubeApi {
            client,
            languages: self.youtube.languages.clone(),
            name: "youtube-webshare",
        }))
    }
}

/// Fetches transcripts from YouTube's watch page and Innertube player API.
pub struct YouTubeApi {
    client: Client,
    languages: Vec<String>,
    name: &'static str,
}

impl TranscriptApi for YouTubeApi {
    fn name(&self) -> &str {
        self.name
    }

    fn fetch(&self, video_id: &str) -> Result<FetchedTranscript> {
        let (html, cookie) = self.fetch_video_html(video_id)?;
        let api_key = extract_api_key(&html, video_id)?;

        let player = self.fetch_player(video_id, &api_key, cookie.as_deref())?;
        player.assert_playable(video_id)?;

        let tracks = player.caption_tracks(video_id)?;
        let track = select_track(tracks, &self.languages, video_id)?;
        if track.requires_po_token() {
            return Err(FetchError::PoTokenRequired {
                video_id: video_id.to_string(),
            });
        }

        tracing::debug!(
            "Downloading {} transcript ({})",
            track.language_code,
            if track.is_generated() { "generated" } else { "manual" }
        );
        let request = with_cookie(self.client.get(track.transcript_url()), cookie.as_deref());
        let xml = send(request, video_id)?.text()?;
        let snippets =
            parse_transcript_xml(&xml).map_err(|detail| FetchError::YouTubeDataUnparsable {
                video_id: video_id.to_string(),
                detail,
            })?;

        Ok(FetchedTranscript {
            video_id: video_id.to_string(),
            language: track.name.text(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated(),
            snippets,
        })
    }
}

impl YouTubeApi {
    /// Load the watch page, accepting the cookie consent interstitial once if
    /// it shows up. Returns the page and the consent cookie, if one was set.
    fn fetch_video_html(&self, video_id: &str) -> Result<(String, Option<String>)> {
        let url = format!("{}{}", WATCH_URL, video_id);
        tracing::debug!("GET {}", url);
        let html = send(self.client.get(&url), video_id)?.text()?;
        if !html.contains(CONSENT_FORM_MARKER) {
            return Ok((html, None));
        }

        let consent_failed = || FetchError::FailedToCreateConsentCookie {
            video_id: video_id.to_string(),
        };
        let value = consent_value(&html).ok_or_else(consent_failed)?;
        let cookie = format!("CONSENT=YES+{}", value);

        tracing::debug!("Consent page shown, retrying with consent cookie");
        let html = send(with_cookie(self.client.get(&url), Some(&cookie)), video_id)?.text()?;
        if html.contains(CONSENT_FORM_MARKER) {
            return Err(consent_failed());
        }
        Ok((html, Some(cookie)))
    }

    fn fetch_player(
        &self,
        video_id: &str,
        api_key: &str,
        cookie: Option<&str>,
    ) -> Result<PlayerResponse> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        tracing::debug!("POST Innertube player for {}", video_id);
        let request = with_cookie(
            self.client
                .post(format!("{}{}", INNERTUBE_PLAYER_URL, api_key))
                .json(&body),
            cookie,
        );
        send(request, video_id)?
            .json::<PlayerResponse>()
            .map_err(|e| FetchError::YouTubeDataUnparsable {
                video_id: video_id.to_string(),
                detail: e.to_string(),
            })
    }
}

fn with_cookie(request: RequestBuilder, cookie: Option<&str>) -> RequestBuilder {
    match cookie {
        Some(cookie) => request.header(COOKIE, cookie),
        None => request,
    }
}

fn send(request: RequestBuilder, video_id: &str) -> Result<Response> {
    let response = request.send()?;
    check_status(response.status(), response.url().as_str(), video_id)?;
    Ok(response)
}

fn check_status(status: StatusCode, url: &str, video_id: &str) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::IpBlocked {
            video_id: video_id.to_string(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

fn extract_api_key(html: &str, video_id: &str) -> Result<String> {
    if let Some(caps) = api_key_regex().captures(html) {
        return Ok(caps[1].to_string());
    }
    if html.contains(RECAPTCHA_MARKER) {
        return Err(FetchError::IpBlocked {
            video_id: video_id.to_string(),
        });
    }
    Err(FetchError::YouTubeDataUnparsable {
        video_id: video_id.to_string(),
        detail: "INNERTUBE_API_KEY not found in watch page".to_string(),
    })
}

fn consent_value(html: &str) -> Option<String> {
    consent_value_regex()
        .captures(html)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSy_abc-123","OTHER":1})</script>"#;
        assert_eq!(extract_api_key(html, "abc").unwrap(), "AIzaSy_abc-123");
    }

    #[test]
    fn test_extract_api_key_recaptcha_is_ip_blocked() {
        let html = r#"<div class="g-recaptcha" data-sitekey="x"></div>"#;
        let err = extract_api_key(html, "abc").unwrap_err();
        assert!(matches!(err, FetchError::IpBlocked { .. }));
    }

    #[test]
    fn test_extract_api_key_missing_is_unparsable() {
        let err = extract_api_key("<html></html>", "abc").unwrap_err();
        assert!(matches!(err, FetchError::YouTubeDataUnparsable { .. }));
    }

    #[test]
    fn test_consent_value() {
        let html = r#"<form action="https://consent.youtube.com/s"><input type="hidden" name="v" value="cb.20210328-17-p0.de+FX+123"></form>"#;
        assert!(html.contains(CONSENT_FORM_MARKER));
        assert_eq!(
            consent_value(html).as_deref(),
            Some("cb.20210328-17-p0.de+FX+123")
        );
        assert!(consent_value("<form></form>").is_none());
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK, "https://x", "abc").is_ok());
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS, "https://x", "abc").unwrap_err(),
            FetchError::IpBlocked { .. }
        ));
        match check_status(StatusCode::FORBIDDEN, "https://x", "abc").unwrap_err() {
            FetchError::HttpStatus { status, url } => {
                assert_eq!(status, 403);
                assert_eq!(url, "https://x");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_factory_builds_direct_and_proxied_clients() {
        let factory = YouTubeApiFactory::new(&Config::default());
        assert_eq!(factory.direct().unwrap().name(), "youtube");

        let proxy = ProxyConfig {
            proxy_username: "user".to_string(),
            proxy_password: "pass".to_string(),
        };
        assert_eq!(factory.with_proxy(&proxy).unwrap().name(), "youtube-webshare");
    }

    #[test]
    fn test_factory_rejects_bad_proxy_domain() {
        let mut config = Config::default();
        config.proxy.domain = "bad domain with spaces".to_string();
        let factory = YouTubeApiFactory::new(&config);
        let proxy = ProxyConfig {
            proxy_username: "user".to_string(),
            proxy_password: "pass".to_string(),
        };
        let err = factory.with_proxy(&proxy).err().unwrap();
        assert!(matches!(err, FetchError::InvalidProxy(_)));
    }
}
