use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Unsupported URL or platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Could not list qualities for {url}: {message}")]
    ProbeFailed { url: String, message: String },

    #[error("Directory {path} is not writable: {source}")]
    DirectoryUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("{0}")]
    EngineFailure(String),

    #[error("Format '{format}' rejected: {message}")]
    InvalidManualFormat { format: String, message: String },

    #[error("Subtitles are only supported for {primary} (got {platform})")]
    SubtitlesUnsupported { platform: String, primary: String },
}

/// Per-request failure category carried by a `DownloadOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedPlatform,
    SubtitlesUnsupported,
    EngineFailure,
    InvalidManualFormat,
}

impl DownloadError {
    /// Maps request-level errors onto the outcome taxonomy. Errors that are
    /// handled by fallback (probe, directory) never reach an outcome and are
    /// reported as engine failures if they ever do.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedPlatform(_) => FailureKind::UnsupportedPlatform,
            Self::SubtitlesUnsupported { .. } => FailureKind::SubtitlesUnsupported,
            Self::InvalidManualFormat { .. } => FailureKind::InvalidManualFormat,
            Self::EngineFailure(_)
            | Self::ProbeFailed { .. }
            | Self::DirectoryUnwritable { .. }
            | Self::NotADirectory(_) => FailureKind::EngineFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_message_names_url() {
        let err = DownloadError::UnsupportedPlatform("https://example.test/x".into());
        assert_eq!(
            err.to_string(),
            "Unsupported URL or platform: https://example.test/x"
        );
        assert_eq!(err.failure_kind(), FailureKind::UnsupportedPlatform);
    }

    #[test]
    fn engine_failure_is_verbatim() {
        let err = DownloadError::EngineFailure("ERROR: HTTP Error 403: Forbidden".into());
        assert_eq!(err.to_string(), "ERROR: HTTP Error 403: Forbidden");
        assert_eq!(err.failure_kind(), FailureKind::EngineFailure);
    }

    #[test]
    fn manual_format_kind() {
        let err = DownloadError::InvalidManualFormat {
            format: "999".into(),
            message: "Requested format is not available".into(),
        };
        assert_eq!(err.failure_kind(), FailureKind::InvalidManualFormat);
        assert!(err.to_string().contains("999"));
    }
}
