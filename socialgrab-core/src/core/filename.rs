use rand::RngExt;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::models::media::MediaKind;
use crate::models::settings::Settings;

static FORBIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

/// Engine placeholder for the final container extension.
pub const EXT_PLACEHOLDER: &str = "%(ext)s";
/// Engine placeholder for the source title.
pub const TITLE_PLACEHOLDER: &str = "%(title)s";

const RANDOM_RANGE: std::ops::Range<u32> = 10_000..100_000;

pub fn sanitize_title(name: &str) -> String {
    let name: String = name.nfc().collect();
    FORBIDDEN_RE.replace_all(&name, "").trim().to_string()
}

/// Literal text inside an engine output template must not be read as a field.
pub(crate) fn escape_template(literal: &str) -> String {
    literal.replace('%', "%%")
}

#[derive(Debug, Clone)]
pub struct FilenamePolicy {
    tool_tag: String,
    primary: String,
}

impl FilenamePolicy {
    pub fn new(tool_tag: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            tool_tag: tool_tag.into(),
            primary: primary.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.download.tool_tag.clone(),
            settings.platforms.primary.clone(),
        )
    }

    /// Titles are trusted on the primary platform, and for subtitle files,
    /// which must share a stem with the media they belong to.
    fn trusts_title(&self, platform: &str, media_kind: MediaKind) -> bool {
        platform == self.primary || media_kind == MediaKind::Subtitles
    }

    fn title_stem(
        &self,
        platform: &str,
        media_kind: MediaKind,
        source_title: Option<&str>,
    ) -> Option<String> {
        if !self.trusts_title(platform, media_kind) {
            return None;
        }
        source_title
            .map(sanitize_title)
            .filter(|stem| !stem.is_empty())
    }

    pub fn random_stem(&self) -> String {
        let n = rand::rng().random_range(RANDOM_RANGE);
        format!("{}_{}", self.tool_tag, n)
    }

    pub fn name_for(
        &self,
        platform: &str,
        media_kind: MediaKind,
        source_title: Option<&str>,
        extension: &str,
    ) -> String {
        let stem = self
            .title_stem(platform, media_kind, source_title)
            .unwrap_or_else(|| self.random_stem());
        format!("{}.{}", stem, extension)
    }

    /// Output template handed to the engine. The title placeholder is only
    /// emitted for a trusted platform whose title is not known yet.
    pub fn output_template(
        &self,
        platform: &str,
        media_kind: MediaKind,
        source_title: Option<&str>,
    ) -> String {
        match self.title_stem(platform, media_kind, source_title) {
            Some(stem) => format!("{}.{}", escape_template(&stem), EXT_PLACEHOLDER),
            None if self.trusts_title(platform, media_kind) && source_title.is_none() => {
                format!("{}.{}", TITLE_PLACEHOLDER, EXT_PLACEHOLDER)
            }
            None => format!("{}.{}", escape_template(&self.random_stem()), EXT_PLACEHOLDER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FilenamePolicy {
        FilenamePolicy::new("SocialGrab", "youtube")
    }

    #[test]
    fn sanitize_strips_forbidden_chars() {
        assert_eq!(sanitize_title(r#"a\b/c*d?e:f"g<h>i|j"#), "abcdefghij");
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize_title("  My Video  "), "My Video");
    }

    #[test]
    fn sanitize_unicode_nfc_normalization() {
        assert_eq!(sanitize_title("e\u{0301}"), "\u{00e9}");
    }

    #[test]
    fn primary_title_is_deterministic() {
        let p = policy();
        let a = p.name_for("youtube", MediaKind::Video, Some("Best of: 2024?"), "mp4");
        let b = p.name_for("youtube", MediaKind::Video, Some("Best of: 2024?"), "mp4");
        assert_eq!(a, "Best of 2024.mp4");
        assert_eq!(a, b);
    }

    #[test]
    fn non_primary_gets_random_stem() {
        let p = policy();
        let name = p.name_for("tiktok", MediaKind::Video, Some("ignored"), "mp4");
        let re = Regex::new(r"^SocialGrab_\d{5}\.mp4$").unwrap();
        assert!(re.is_match(&name), "{}", name);
    }

    #[test]
    fn non_primary_names_differ() {
        let p = policy();
        let names: std::collections::HashSet<String> = (0..20)
            .map(|_| p.name_for("vimeo", MediaKind::Audio, None, "mp3"))
            .collect();
        assert!(names.len() > 1);
    }

    #[test]
    fn primary_without_title_is_random() {
        let name = policy().name_for("youtube", MediaKind::Video, None, "mp4");
        assert!(name.starts_with("SocialGrab_"));
    }

    #[test]
    fn title_that_sanitizes_to_nothing_is_random() {
        let name = policy().name_for("youtube", MediaKind::Video, Some("???"), "mp4");
        assert!(name.starts_with("SocialGrab_"));
    }

    #[test]
    fn template_uses_title_placeholder_only_for_primary() {
        let p = policy();
        assert_eq!(
            p.output_template("youtube", MediaKind::Audio, None),
            "%(title)s.%(ext)s"
        );
        let other = p.output_template("reddit", MediaKind::Video, None);
        assert!(other.starts_with("SocialGrab_"));
        assert!(other.ends_with(".%(ext)s"));
        assert!(!other.contains(TITLE_PLACEHOLDER));
    }

    #[test]
    fn template_escapes_percent_in_known_title() {
        let p = policy();
        assert_eq!(
            p.output_template("youtube", MediaKind::Video, Some("100% real")),
            "100%% real.%(ext)s"
        );
    }
}
