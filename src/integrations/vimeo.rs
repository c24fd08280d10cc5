use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::IntegrationError;
use crate::config;
use crate::types::ProcessingStatus;

const VIMEO_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
const VIDEO_FIELDS: &str = "uri,link,play,files,transcode.status,upload.status,name,duration";
const MP4: &str = "video/mp4";
const HLS: &str = "application/x-mpegURL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VimeoVideo {
    pub uri: Option<String>,
    pub upload: Option<StatusField>,
    pub transcode: Option<StatusField>,
    pub play: Option<PlayData>,
    pub files: Option<Vec<VideoFile>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusField {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayData {
    pub progressive: Option<Vec<VideoFile>>,
    pub hls: Option<VideoFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoFile {
    pub quality: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub link: Option<String>,
}

impl VimeoVideo {
    fn status_of(field: &Option<StatusField>) -> Option<&str> {
        field.as_ref().and_then(|f| f.status.as_deref())
    }

    pub fn upload_status(&self) -> Option<&str> {
        Self::status_of(&self.upload)
    }

    pub fn transcode_status(&self) -> Option<&str> {
        Self::status_of(&self.transcode)
    }

    pub fn is_ready(&self) -> bool {
        self.upload_status() == Some("complete") && self.transcode_status() == Some("complete")
    }

    /// Processing state as stored on the calendar day
    pub fn processing_status(&self) -> ProcessingStatus {
        if self.is_ready() {
            ProcessingStatus::Complete
        } else if self.transcode_status() == Some("error") || self.upload_status() == Some("error") {
            ProcessingStatus::Failed
        } else {
            ProcessingStatus::Processing
        }
    }
}

/// Normalize a client supplied identifier to `/videos/<id>`.
/// Accepts `/videos/<id>`, `videos/<id>`, a bare numeric id, or any vimeo.com URL.
pub fn normalize_video_uri(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let id = if let Some(rest) = trimmed.strip_prefix("/videos/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("videos/") {
        rest
    } else if trimmed.contains("vimeo.com") {
        return vimeo_url_id(trimmed).map(|id| format!("/videos/{}", id));
    } else {
        trimmed
    };

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("/videos/{}", id))
    } else {
        None
    }
}

fn vimeo_url_id(raw: &str) -> Option<String> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?;
    if host != "vimeo.com" && !host.ends_with(".vimeo.com") {
        return None;
    }
    parsed
        .path_segments()?
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn find_mp4<'a>(files: &'a [VideoFile], quality: Option<&str>) -> Option<&'a str> {
    files
        .iter()
        .filter(|f| f.mime_type.as_deref() == Some(MP4))
        .filter(|f| quality.is_none() || f.quality.as_deref() == quality)
        .find_map(|f| f.link.as_deref())
}

fn progressive_link(play: &PlayData) -> Option<&str> {
    let files = play.progressive.as_deref().filter(|files| !files.is_empty())?;
    ["1080p", "hd", "sd", "720p", "540p"]
        .iter()
        .find_map(|quality| find_mp4(files, Some(quality)))
        .or_else(|| find_mp4(files, None))
}

fn hls_link(play: &PlayData) -> Option<&str> {
    let hls = play.hls.as_ref()?;
    match hls.mime_type.as_deref() {
        None | Some(HLS) => hls.link.as_deref(),
        _ => None,
    }
}

fn legacy_file_link(files: &[VideoFile]) -> Option<&str> {
    find_mp4(files, Some("hd"))
        .or_else(|| find_mp4(files, Some("sd")))
        .or_else(|| find_mp4(files, None))
}

/// Choose the best streamable link for a fully processed video
pub fn select_playable_link(video: &VimeoVideo) -> Option<String> {
    if !video.is_ready() {
        return None;
    }

    let from_play = video
        .play
        .as_ref()
        .and_then(|play| progressive_link(play).or_else(|| hls_link(play)));

    from_play
        .or_else(|| video.files.as_deref().and_then(legacy_file_link))
        .map(str::to_string)
}

pub struct VimeoClient {
    http: reqwest::Client,
    api_base: String,
    access_token: Option<String>,
}

static SHARED: Lazy<VimeoClient> = Lazy::new(|| {
    let integrations = &config::config().integrations;
    VimeoClient::new(&integrations.vimeo_api_base, integrations.vimeo_access_token.clone())
});

impl VimeoClient {
    pub fn new(api_base: &str, access_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Client built from application config
    pub fn shared() -> &'static VimeoClient {
        &SHARED
    }

    fn token(&self) -> Result<&str, IntegrationError> {
        self.access_token
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("Vimeo access token"))
    }

    /// Fetch video metadata; `Ok(None)` when Vimeo reports 404
    pub async fn get_video(&self, video_uri: &str) -> Result<Option<VimeoVideo>, IntegrationError> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base, video_uri))
            .query(&[("fields", VIDEO_FIELDS)])
            .bearer_auth(self.token()?)
            .header(reqwest::header::ACCEPT, VIMEO_ACCEPT)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let video = response
                    .json::<VimeoVideo>()
                    .await
                    .map_err(|e| IntegrationError::InvalidResponse(e.to_string()))?;
                Ok(Some(video))
            }
            _ => Err(IntegrationError::from_response("vimeo", response).await),
        }
    }

    /// Fresh playable link for a stored video URI, `None` while processing or missing
    pub async fn playable_url(&self, video_uri: &str) -> Result<Option<String>, IntegrationError> {
        let Some(normalized) = normalize_video_uri(video_uri) else {
            warn!("Unrecognized Vimeo URI: {}", video_uri);
            return Ok(None);
        };

        let Some(video) = self.get_video(&normalized).await? else {
            warn!("Vimeo has no metadata for {}", normalized);
            return Ok(None);
        };

        if !video.is_ready() {
            debug!(
                "Video {} not ready (upload: {:?}, transcode: {:?})",
                normalized,
                video.upload_status(),
                video.transcode_status()
            );
        }
        Ok(select_playable_link(&video))
    }

    /// Current processing state of a video; missing videos count as failed
    pub async fn processing_status(&self, video_uri: &str) -> Result<ProcessingStatus, IntegrationError> {
        let normalized = normalize_video_uri(video_uri)
            .ok_or_else(|| IntegrationError::InvalidResponse(format!("bad video uri {}", video_uri)))?;
        Ok(match self.get_video(&normalized).await? {
            Some(video) => video.processing_status(),
            None => ProcessingStatus::Failed,
        })
    }

    pub async fn delete_video(&self, video_uri: &str) -> Result<(), IntegrationError> {
        let normalized = normalize_video_uri(video_uri)
            .ok_or_else(|| IntegrationError::InvalidResponse(format!("bad video uri {}", video_uri)))?;
        let response = self
            .http
            .delete(format!("{}{}", self.api_base, normalized))
            .bearer_auth(self.token()?)
            .header(reqwest::header::ACCEPT, VIMEO_ACCEPT)
            .send()
            .await?;

        // Already gone counts as deleted
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(IntegrationError::from_response("vimeo", response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn file(quality: &str, mime: &str, link: &str) -> VideoFile {
        VideoFile {
            quality: Some(quality.to_string()),
            mime_type: Some(mime.to_string()),
            link: Some(link.to_string()),
        }
    }

    fn ready(play: Option<PlayData>, files: Option<Vec<VideoFile>>) -> VimeoVideo {
        VimeoVideo {
            uri: Some("/videos/42".to_string()),
            upload: Some(StatusField { status: Some("complete".to_string()) }),
            transcode: Some(StatusField { status: Some("complete".to_string()) }),
            play,
            files,
        }
    }

    #[test]
    fn normalizes_supported_identifier_shapes() {
        assert_eq!(normalize_video_uri("/videos/123").as_deref(), Some("/videos/123"));
        assert_eq!(normalize_video_uri("videos/123").as_deref(), Some("/videos/123"));
        assert_eq!(normalize_video_uri(" 123 ").as_deref(), Some("/videos/123"));
        assert_eq!(normalize_video_uri("https://vimeo.com/98765").as_deref(), Some("/videos/98765"));
        assert_eq!(normalize_video_uri("vimeo.com/channels/staff/555").as_deref(), Some("/videos/555"));
        assert_eq!(normalize_video_uri("videos/abc"), None);
        assert_eq!(normalize_video_uri("https://example.com/123"), None);
        assert_eq!(normalize_video_uri(""), None);
    }

    #[test]
    fn prefers_progressive_quality_order() {
        let play = PlayData {
            progressive: Some(vec![
                file("540p", MP4, "https://cdn/540"),
                file("sd", MP4, "https://cdn/sd"),
                file("1080p", MP4, "https://cdn/1080"),
            ]),
            hls: Some(VideoFile { quality: None, mime_type: None, link: Some("https://cdn/hls".to_string()) }),
        };
        assert_eq!(select_playable_link(&ready(Some(play), None)).as_deref(), Some("https://cdn/1080"));
    }

    #[test]
    fn falls_back_to_hls_then_legacy_files() {
        let hls_only = PlayData {
            progressive: Some(vec![]),
            hls: Some(file("auto", HLS, "https://cdn/master.m3u8")),
        };
        assert_eq!(
            select_playable_link(&ready(Some(hls_only), None)).as_deref(),
            Some("https://cdn/master.m3u8")
        );

        let wrong_hls_type = PlayData {
            progressive: None,
            hls: Some(file("auto", "text/plain", "https://cdn/nope")),
        };
        let files = vec![file("sd", MP4, "https://cdn/file-sd"), file("hls", HLS, "https://cdn/x")];
        assert_eq!(
            select_playable_link(&ready(Some(wrong_hls_type), Some(files))).as_deref(),
            Some("https://cdn/file-sd")
        );
    }

    #[test]
    fn unfinished_video_has_no_link() {
        let mut video = ready(None, Some(vec![file("hd", MP4, "https://cdn/hd")]));
        video.transcode = Some(StatusField { status: Some("in_progress".to_string()) });
        assert_eq!(select_playable_link(&video), None);
        assert_eq!(video.processing_status(), ProcessingStatus::Processing);

        video.transcode = Some(StatusField { status: Some("error".to_string()) });
        assert_eq!(video.processing_status(), ProcessingStatus::Failed);
    }

    #[tokio::test]
    async fn fetches_playable_url_from_api() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/videos/42").header("authorization", "Bearer vimeo-token");
                then.status(200).json_body(json!({
                    "uri": "/videos/42",
                    "upload": { "status": "complete" },
                    "transcode": { "status": "complete" },
                    "play": { "progressive": [
                        { "quality": "sd", "type": "video/mp4", "link": "https://cdn/sd.mp4" }
                    ]}
                }));
            })
            .await;

        let client = VimeoClient::new(&server.base_url(), Some("vimeo-token".to_string()));
        let url = client.playable_url("videos/42").await.unwrap();
        mock.assert_async().await;
        assert_eq!(url.as_deref(), Some("https://cdn/sd.mp4"));
    }

    #[tokio::test]
    async fn missing_video_is_none_and_delete_tolerates_404() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/videos/7");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/videos/7");
                then.status(404);
            })
            .await;

        let client = VimeoClient::new(&server.base_url(), Some("t".to_string()));
        assert_eq!(client.playable_url("/videos/7").await.unwrap(), None);
        assert_eq!(client.processing_status("/videos/7").await.unwrap(), ProcessingStatus::Failed);
        client.delete_video("/videos/7").await.unwrap();
    }

    #[tokio::test]
    async fn requires_access_token() {
        let client = VimeoClient::new("http://127.0.0.1:9", None);
        let err = client.get_video("/videos/1").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured(_)));
    }
}
