use std::path::Path;

use socialgrab_core::core::directory::{DirectoryResolver, HostInfo, OutputDir};
use socialgrab_core::core::engine::ExtractionEngine;
use socialgrab_core::core::events::DownloadEvents;
use socialgrab_core::core::filename::FilenamePolicy;
use socialgrab_core::core::format::FormatNegotiator;
use socialgrab_core::core::orchestrator::DownloadContext;
use socialgrab_core::core::registry::PlatformRegistry;
use socialgrab_core::models::settings::Settings;
use socialgrab_core::DownloadError;

use crate::storage::config;

/// Process-wide configuration, built once at startup.
pub struct Session {
    pub settings: Settings,
    pub registry: PlatformRegistry,
    pub filenames: FilenamePolicy,
    pub negotiator: FormatNegotiator,
    host: HostInfo,
    resolver: DirectoryResolver,
    output_dir: OutputDir,
}

impl Session {
    /// `output_override` must name an existing directory. A saved directory
    /// that has gone away only produces a warning.
    pub fn load(output_override: Option<&Path>) -> anyhow::Result<Self> {
        Self::from_settings(config::load_settings(), HostInfo::detect(), output_override)
    }

    pub fn from_settings(
        settings: Settings,
        host: HostInfo,
        output_override: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let resolver = DirectoryResolver::new();
        let output_dir = match (output_override, settings.download.output_dir.as_deref()) {
            (Some(dir), _) => resolver.set_custom(&host, dir)?,
            (None, Some(saved)) => resolver.set_custom(&host, saved).unwrap_or_else(|e| {
                tracing::warn!("Saved download directory unusable: {}", e);
                resolver.resolve_default(&host)
            }),
            (None, None) => resolver.resolve_default(&host),
        };
        tracing::info!("Saving downloads to {}", output_dir);

        Ok(Self {
            registry: PlatformRegistry::from_settings(&settings.platforms),
            filenames: FilenamePolicy::from_settings(&settings),
            negotiator: FormatNegotiator::new(settings.platforms.primary.clone()),
            settings,
            host,
            resolver,
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &OutputDir {
        &self.output_dir
    }

    /// Switches the output directory and persists the choice.
    pub fn change_output_dir(&mut self, path: &Path) -> Result<&OutputDir, DownloadError> {
        let dir = self.resolver.set_custom(&self.host, path)?;
        self.settings.download.output_dir = Some(dir.as_path().to_path_buf());
        if let Err(e) = config::save_settings(&self.settings) {
            tracing::warn!("Could not save settings: {:#}", e);
        }
        self.output_dir = dir;
        Ok(&self.output_dir)
    }

    pub fn context<'a>(
        &'a self,
        engine: &'a dyn ExtractionEngine,
        events: &'a dyn DownloadEvents,
    ) -> DownloadContext<'a> {
        DownloadContext {
            registry: &self.registry,
            filenames: &self.filenames,
            negotiator: &self.negotiator,
            settings: &self.settings.download,
            output_dir: &self.output_dir,
            engine,
            events,
        }
    }
}
