use std::path::{Path, PathBuf};
use std::process::Stdio;

use socialgrab_core::fs_paths::managed_bin_dir;

pub const YTDLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";

fn bin_name(tool: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", tool)
    } else {
        tool.to_string()
    }
}

fn version_flag_for(tool: &str) -> &'static str {
    match tool {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Locates a tool on `PATH` (managed bin dir first) or in the managed bin
/// dir directly. Nothing is installed.
pub async fn find_tool(tool: &str) -> Option<PathBuf> {
    let started = std::time::Instant::now();
    let name = bin_name(tool);

    if let Ok(status) = crate::core::process::command(&name)
        .arg(version_flag_for(tool))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        if status.success() {
            tracing::debug!("find_tool({}) took {:?}", tool, started.elapsed());
            return Some(PathBuf::from(&name));
        }
    }

    let managed = managed_bin_dir()?.join(&name);
    tracing::debug!("find_tool({}) took {:?}", tool, started.elapsed());
    managed.exists().then_some(managed)
}

/// A configured path wins when it exists; otherwise the usual lookup.
pub async fn resolve_tool(tool: &str, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(
            "Configured {} path {} does not exist; searching PATH",
            tool,
            path.display()
        );
    }
    find_tool(tool).await
}

pub async fn check_version(tool: &str, path: &Path) -> Option<String> {
    let output = crate::core::process::command(path)
        .arg(version_flag_for(tool))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }
    parse_version(tool, &String::from_utf8_lossy(&output.stdout))
}

fn parse_version(tool: &str, stdout: &str) -> Option<String> {
    let first_line = stdout.lines().next()?.trim();
    if first_line.is_empty() {
        return None;
    }
    match tool {
        // "ffmpeg version 6.1.1-3ubuntu5 Copyright ..."
        "ffmpeg" | "ffprobe" => first_line.split_whitespace().nth(2).map(str::to_string),
        _ => Some(first_line.to_string()),
    }
}
