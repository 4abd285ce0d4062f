use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::video;

/// Creator video shown in the "loved by influencers" carousel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerVideo {
    pub id: Uuid,
    pub url: String,
    pub creator_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_summary: Option<String>,
}

/// Packing/dispatch clip, always hosted on YouTube.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchVideo {
    pub id: Uuid,
    pub url: String,
    pub thumbnail: String,
}

/// Singleton document holding homepage content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteContent {
    pub hero_images: Vec<String>,
    pub influencer_videos: Vec<InfluencerVideo>,
    pub dispatch_videos: Vec<DispatchVideo>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoKind {
    Influencer,
    Dispatch,
}

impl std::str::FromStr for VideoKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "influencer" => Ok(VideoKind::Influencer),
            "dispatch" => Ok(VideoKind::Dispatch),
            _ => Err(()),
        }
    }
}

/// A stored video plus the URL the storefront embeds.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView<T: Serialize> {
    #[serde(flatten)]
    pub video: T,
    pub embed_url: String,
}

impl VideoView<InfluencerVideo> {
    pub fn influencer(video: InfluencerVideo) -> Self {
        let embed_url = video::embed_url(&video.url);
        Self { video, embed_url }
    }
}

impl VideoView<DispatchVideo> {
    pub fn dispatch(video: DispatchVideo) -> Self {
        let embed_url = video::embed_url(&video.url);
        Self { video, embed_url }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideosView {
    pub influencer_videos: Vec<VideoView<InfluencerVideo>>,
    pub dispatch_videos: Vec<VideoView<DispatchVideo>>,
}

impl VideosView {
    pub fn from_content(content: &SiteContent) -> Self {
        Self {
            influencer_videos: content
                .influencer_videos
                .iter()
                .cloned()
                .map(VideoView::influencer)
                .collect(),
            dispatch_videos: content
                .dispatch_videos
                .iter()
                .cloned()
                .map(VideoView::dispatch)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContentView {
    pub hero_images: Vec<String>,
    #[serde(flatten)]
    pub videos: VideosView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<SiteContent> for SiteContentView {
    fn from(content: SiteContent) -> Self {
        Self {
            videos: VideosView::from_content(&content),
            hero_images: content.hero_images,
            updated_at: content.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HeroPayload {
    /// Kept untyped so a non-array value can be reported as a 400.
    #[serde(default)]
    pub images: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddVideoPayload {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub video: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerVideoInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub review_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DispatchVideoInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteVideoQuery {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_views_flatten_with_embed_url() {
        let view = VideoView::influencer(InfluencerVideo {
            id: Uuid::nil(),
            url: "https://www.instagram.com/reel/DNknvPgCU5_/".to_string(),
            creator_name: "Ritu".to_string(),
            review_summary: None,
        });

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["creatorName"], "Ritu");
        assert_eq!(
            value["embedUrl"],
            "https://www.instagram.com/reel/DNknvPgCU5_/embed"
        );
        assert!(value.get("reviewSummary").is_none());
    }

    #[test]
    fn empty_content_serializes_empty_lists() {
        let value = serde_json::to_value(SiteContentView::from(SiteContent::default())).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "heroImages": [],
                "influencerVideos": [],
                "dispatchVideos": []
            })
        );
        assert_eq!("dispatch".parse::<VideoKind>(), Ok(VideoKind::Dispatch));
        assert!("reel".parse::<VideoKind>().is_err());
    }
}
