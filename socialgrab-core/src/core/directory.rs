use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::filename::escape_template;
use crate::error::DownloadError;

const WRITE_MARKER: &str = ".write_test";

const MOBILE_STORAGE_CANDIDATES: &[&str] = &[
    "/data/data/com.termux/files/home/storage/downloads",
    "/storage/emulated/0/Download",
    "/sdcard/Download",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
    Bsd,
    Android,
    Other,
}

impl OsFamily {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Self::Bsd,
            "android" => Self::Android,
            _ => Self::Other,
        }
    }
}

/// Host signals read once at startup.
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub os: OsFamily,
    pub mobile_runtime: bool,
    pub home_dir: Option<PathBuf>,
    pub user_profile: Option<PathBuf>,
    pub current_dir: PathBuf,
}

impl HostInfo {
    pub fn detect() -> Self {
        let os = OsFamily::current();
        Self {
            os,
            mobile_runtime: os == OsFamily::Android || std::env::var_os("ANDROID_ROOT").is_some(),
            home_dir: dirs::home_dir(),
            user_profile: std::env::var_os("USERPROFILE").map(PathBuf::from),
            current_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// A directory that has passed the writability probe (or is the working
/// directory fallback). Only `DirectoryResolver` creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir(PathBuf);

impl OutputDir {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Engine output template rooted here. `%` in the directory is escaped;
    /// `template` is expected to be escaped already.
    pub fn template_path(&self, template: &str) -> PathBuf {
        match self.0.to_str() {
            Some(dir) => PathBuf::from(escape_template(dir)).join(template),
            None => self.0.join(template),
        }
    }
}

impl fmt::Display for OutputDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    mobile_candidates: Vec<PathBuf>,
}

impl DirectoryResolver {
    pub fn new() -> Self {
        Self {
            mobile_candidates: MOBILE_STORAGE_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn with_mobile_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            mobile_candidates: candidates,
        }
    }

    pub fn candidate(&self, host: &HostInfo) -> PathBuf {
        if host.mobile_runtime {
            if let Some(existing) = self.mobile_candidates.iter().find(|p| p.is_dir()) {
                return existing.clone();
            }
            return match &host.home_dir {
                Some(home) => home.join("downloads"),
                None => host.current_dir.clone(),
            };
        }

        match host.os {
            OsFamily::Windows => host
                .user_profile
                .as_ref()
                .or(host.home_dir.as_ref())
                .map(|p| p.join("Downloads"))
                .unwrap_or_else(|| host.current_dir.clone()),
            OsFamily::Linux | OsFamily::MacOs | OsFamily::Bsd | OsFamily::Android => host
                .home_dir
                .as_ref()
                .map(|h| h.join("Downloads"))
                .unwrap_or_else(|| host.current_dir.clone()),
            OsFamily::Other => host.current_dir.clone(),
        }
    }

    /// Picks the per-OS default, creating it if needed, and verifies it once.
    pub fn resolve_default(&self, host: &HostInfo) -> OutputDir {
        let candidate = self.candidate(host);
        let verified = std::fs::create_dir_all(&candidate)
            .map_err(|source| DownloadError::DirectoryUnwritable {
                path: candidate.clone(),
                source,
            })
            .and_then(|_| verify_writable(&candidate));

        match verified {
            Ok(()) => {
                tracing::debug!("Using download directory {}", candidate.display());
                OutputDir(candidate)
            }
            Err(e) => {
                tracing::warn!("{}; falling back to {}", e, host.current_dir.display());
                OutputDir(host.current_dir.clone())
            }
        }
    }

    /// Accepts an existing directory chosen by the user. Never creates it.
    pub fn set_custom(
        &self,
        host: &HostInfo,
        path: impl AsRef<Path>,
    ) -> Result<OutputDir, DownloadError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(DownloadError::NotADirectory(path.to_path_buf()));
        }

        match verify_writable(path) {
            Ok(()) => Ok(OutputDir(path.to_path_buf())),
            Err(e) => {
                tracing::warn!("{}; falling back to {}", e, host.current_dir.display());
                Ok(OutputDir(host.current_dir.clone()))
            }
        }
    }
}

impl Default for DirectoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn verify_writable(dir: &Path) -> Result<(), DownloadError> {
    let marker = dir.join(WRITE_MARKER);
    std::fs::write(&marker, b"test")
        .and_then(|_| std::fs::remove_file(&marker))
        .map_err(|source| DownloadError::DirectoryUnwritable {
            path: dir.to_path_buf(),
            source,
        })
}
