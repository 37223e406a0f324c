use std::ffi::{OsStr, OsString};

use socialgrab_core::fs_paths::managed_bin_dir;

/// `PATH` with the managed bin dir in front, so tools dropped there by the
/// user win over system installs.
pub fn enhanced_path() -> Option<OsString> {
    let bin_dir = managed_bin_dir()?;
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut dirs = vec![bin_dir];
    dirs.extend(std::env::split_paths(&current));
    std::env::join_paths(dirs).ok()
}

/// Process-wide environment for every engine child. Called once from `main`
/// before the tokio runtime is built.
pub fn setup_environment() {
    std::env::remove_var("PYTHONHOME");
    std::env::remove_var("PYTHONPATH");
    if let Some(path) = enhanced_path() {
        std::env::set_var("PATH", path);
    }
    std::env::set_var("PYTHONIOENCODING", "utf-8");
    std::env::set_var("PYTHONUTF8", "1");
}

pub fn command<S: AsRef<OsStr>>(program: S) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000);
    if let Some(path) = enhanced_path() {
        cmd.env("PATH", path);
    }
    cmd.env("PYTHONIOENCODING", "utf-8");
    cmd.env("PYTHONUTF8", "1");
    cmd
}
