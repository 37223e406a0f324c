use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use socialgrab_core::core::engine::{
    ExtractionEngine, FetchRequest, FetchResult, MediaDirectives,
};
use socialgrab_core::core::progress::ProgressTracker;
use socialgrab_core::models::media::{FormatInfo, MediaMetadata, ProgressSample};

use crate::core::tools;

const PROGRESS_MARKER: &str = "[progress]";
const FILE_MARKER: &str = "[file]";
const PROGRESS_TEMPLATE: &str = concat!(
    "download:[progress] %(progress.downloaded_bytes)s ",
    "%(progress.total_bytes)s %(progress.total_bytes_estimate)s"
);
const FILE_PRINT: &str = "video:[file]%(filename)s";

/// yt-dlp driven as a child process. ffmpeg is picked up from `PATH` by
/// yt-dlp itself for merging and audio extraction.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub async fn locate(configured: Option<&Path>) -> anyhow::Result<Self> {
        match tools::resolve_tool(tools::YTDLP, configured).await {
            Some(binary) => {
                tracing::debug!("Using yt-dlp at {}", binary.display());
                Ok(Self::new(binary))
            }
            None => bail!(
                "yt-dlp not found. Install it (https://github.com/yt-dlp/yt-dlp) or place it in {}",
                socialgrab_core::fs_paths::managed_bin_dir()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "the socialgrab bin directory".into())
            ),
        }
    }

    fn fetch_args(url: &str, request: &FetchRequest) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(format) = &request.format {
            args.extend(["-f".to_string(), format.to_string()]);
        }

        match &request.directives {
            MediaDirectives::Video => {
                args.extend(["--merge-output-format".to_string(), "mp4".to_string()]);
            }
            MediaDirectives::ExtractAudio {
                codec,
                quality,
                embed_metadata,
            } => {
                args.extend([
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    codec.clone(),
                    "--audio-quality".to_string(),
                    quality.clone(),
                ]);
                if *embed_metadata {
                    args.push("--embed-metadata".to_string());
                }
            }
            MediaDirectives::SubtitlesOnly { langs, format } => {
                args.extend([
                    "--write-subs".to_string(),
                    "--write-auto-subs".to_string(),
                    "--sub-format".to_string(),
                    format.clone(),
                    "--convert-subs".to_string(),
                    format.clone(),
                    "--sub-langs".to_string(),
                    langs.join(","),
                    "--skip-download".to_string(),
                ]);
            }
        }

        args.extend([
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            FILE_PRINT.to_string(),
            "-o".to_string(),
            request.output_template.to_string_lossy().to_string(),
            url.to_string(),
        ]);
        args
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> anyhow::Result<MediaMetadata> {
        let output = crate::core::process::command(&self.binary)
            .args(["--dump-json", "--no-warnings", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run yt-dlp: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("{}", error_message(&stderr, output.status)));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| anyhow!("yt-dlp returned invalid JSON: {}", e))?;

        Ok(MediaMetadata {
            title: json.get("title").and_then(|v| v.as_str()).map(str::to_string),
            formats: parse_formats(&json),
        })
    }

    async fn fetch(
        &self,
        url: &str,
        request: &FetchRequest,
        progress: &ProgressTracker,
    ) -> anyhow::Result<FetchResult> {
        let output_dir = request
            .output_template
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let args = Self::fetch_args(url, request);
        tracing::debug!("yt-dlp {}", args.join(" "));

        let mut child = crate::core::process::command(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to start yt-dlp: {}", e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("yt-dlp stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("yt-dlp stderr not captured"))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut reported: Option<PathBuf> = None;
        while let Some(line) = lines.next_line().await? {
            if let Some(sample) = parse_progress_line(&line) {
                progress.on_sample(sample);
            } else if let Some(name) = line.trim().strip_prefix(FILE_MARKER) {
                reported = Some(PathBuf::from(name));
            } else {
                tracing::trace!("yt-dlp: {}", line);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| anyhow!("yt-dlp process failed: {}", e))?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(anyhow!("{}", error_message(&stderr, status)));
        }

        let filename = match reported {
            Some(path) => path,
            None => find_downloaded_file(&output_dir).await?,
        };
        Ok(FetchResult { filename })
    }
}

/// Parses a line produced by [`PROGRESS_TEMPLATE`]. yt-dlp prints `NA` for
/// fields it does not know and may print byte counts as floats.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.split_whitespace();
    let downloaded = parse_bytes(fields.next()?)?;
    let total = parse_bytes(fields.next()?);
    let estimate = fields.next().and_then(parse_bytes);
    if fields.next().is_some() {
        return None;
    }

    Some(ProgressSample {
        downloaded_bytes: downloaded,
        total_bytes: total.or(estimate).filter(|t| *t > 0),
    })
}

fn parse_bytes(field: &str) -> Option<u64> {
    if field.eq_ignore_ascii_case("na") || field.eq_ignore_ascii_case("none") {
        return None;
    }
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u64)
}

/// `ERROR:` lines from stderr, or the whole of it when there are none.
fn error_message(stderr: &str, status: std::process::ExitStatus) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:"))
        .collect();
    if !errors.is_empty() {
        return errors.join("\n");
    }
    match stderr.trim() {
        "" => format!("yt-dlp exited with {}", status),
        other => other.to_string(),
    }
}

pub fn parse_formats(json: &serde_json::Value) -> Vec<FormatInfo> {
    let Some(formats) = json.get("formats").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    formats
        .iter()
        .filter_map(|f| {
            let format_id = f.get("format_id").and_then(|v| v.as_str())?.to_string();
            let text = |key: &str| f.get(key).and_then(|v| v.as_str()).map(str::to_string);
            Some(FormatInfo {
                format_id,
                ext: text("ext").unwrap_or_default(),
                height: f.get("height").and_then(|v| v.as_u64()).map(|v| v as u32),
                vcodec: text("vcodec"),
                acodec: text("acodec"),
                format_note: text("format_note"),
            })
        })
        .collect()
}

/// Newest finished file in `output_dir`, for when yt-dlp did not print the
/// prepared name.
async fn find_downloaded_file(output_dir: &Path) -> anyhow::Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(output_dir).await?;
    let mut best: Option<(PathBuf, std::time::SystemTime)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(".part") || name.ends_with(".ytdl") || name.starts_with('.') {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        if let Ok(modified) = meta.modified() {
            if best.as_ref().map_or(true, |(_, t)| modified > *t) {
                best = Some((path, modified));
            }
        }
    }

    best.map(|(p, _)| p)
        .ok_or_else(|| anyhow!("Downloaded file not found in {}", output_dir.display()))
}
