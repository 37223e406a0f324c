use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::media::PlatformEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub schema_version: u32,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub platforms: PlatformSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_tool_tag")]
    pub tool_tag: String,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    #[serde(default = "default_subtitle_langs")]
    pub subtitle_langs: Vec<String>,
    #[serde(default = "default_subtitle_format")]
    pub subtitle_format: String,
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_platforms")]
    pub entries: Vec<PlatformEntry>,
}

fn default_tool_tag() -> String {
    "SocialGrab".into()
}

fn default_audio_codec() -> String {
    "mp3".into()
}

fn default_audio_quality() -> String {
    "192".into()
}

fn default_subtitle_langs() -> Vec<String> {
    vec!["en".into()]
}

fn default_subtitle_format() -> String {
    "srt".into()
}

fn default_primary() -> String {
    "youtube".into()
}

pub fn default_platforms() -> Vec<PlatformEntry> {
    vec![
        PlatformEntry::new("youtube", &["youtube.com", "youtu.be"]),
        PlatformEntry::new("facebook", &["facebook.com", "fb.watch"]),
        PlatformEntry::new("tiktok", &["tiktok.com"]),
        PlatformEntry::new("instagram", &["instagram.com"]),
        PlatformEntry::new("twitter", &["twitter.com", "x.com"]),
        PlatformEntry::new("reddit", &["reddit.com"]),
        PlatformEntry::new("vimeo", &["vimeo.com"]),
        PlatformEntry::new("dailymotion", &["dailymotion.com", "dai.ly"]),
        PlatformEntry::new("soundcloud", &["soundcloud.com"]),
    ]
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            tool_tag: default_tool_tag(),
            audio_codec: default_audio_codec(),
            audio_quality: default_audio_quality(),
            subtitle_langs: default_subtitle_langs(),
            subtitle_format: default_subtitle_format(),
            ytdlp_path: None,
        }
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            entries: default_platforms(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: 1,
            download: DownloadSettings::default(),
            platforms: PlatformSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"schema_version": 1}"#).unwrap();
        assert_eq!(settings.download.audio_codec, "mp3");
        assert_eq!(settings.download.subtitle_langs, vec!["en".to_string()]);
        assert_eq!(settings.platforms.primary, "youtube");
        assert_eq!(settings.platforms.entries.len(), 9);
    }

    #[test]
    fn partial_download_section_keeps_other_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"schema_version": 1, "download": {"tool_tag": "Grab", "output_dir": "/tmp/x"}}"#,
        )
        .unwrap();
        assert_eq!(settings.download.tool_tag, "Grab");
        assert_eq!(settings.download.output_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(settings.download.audio_quality, "192");
    }

    #[test]
    fn round_trip_preserves_platform_order() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        let ids: Vec<_> = back.platforms.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"youtube"));
        assert_eq!(ids.last(), Some(&"soundcloud"));
    }
}
