use crate::models::media::PlatformEntry;
use crate::models::settings::PlatformSettings;

/// Ordered platform table. Lookup walks the entries in declared order and the
/// first match wins.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    platforms: Vec<PlatformEntry>,
    primary: String,
}

impl PlatformRegistry {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            platforms: Vec::new(),
            primary: primary.into(),
        }
    }

    pub fn from_settings(settings: &PlatformSettings) -> Self {
        let mut registry = Self::new(settings.primary.clone());
        for entry in &settings.entries {
            registry.register(entry.clone());
        }
        registry
    }

    pub fn register(&mut self, platform: PlatformEntry) {
        self.platforms.push(platform);
    }

    pub fn detect(&self, url: &str) -> Option<&str> {
        let url = url.trim().to_lowercase();
        if url.is_empty() {
            return None;
        }
        self.platforms
            .iter()
            .find(|p| p.domain_markers.iter().any(|m| url.contains(m.as_str())))
            .map(|p| p.id.as_str())
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn is_primary(&self, platform: &str) -> bool {
        platform == self.primary
    }

    pub fn entries(&self) -> &[PlatformEntry] {
        &self.platforms
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::from_settings(&PlatformSettings::default())
    }
}
