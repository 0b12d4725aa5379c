//! llama-server discovery
//!
//! Best-effort search for the server binary so a fresh install works
//! without configuration. An explicit path from settings always wins.

use std::path::{Path, PathBuf};

/// Platform executable name.
pub fn executable_name() -> &'static str {
    if cfg!(windows) {
        "llama-server.exe"
    } else {
        "llama-server"
    }
}

/// Directories searched, in priority order: next to this app's own binary,
/// the working directory, everything on PATH, then common install spots.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            dirs.push(parent.to_path_buf());
            dirs.push(parent.join("llama.cpp").join("build").join("bin"));
            dirs.push(parent.join("llama.cpp"));
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Some(path) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&path));
    }

    if cfg!(windows) {
        dirs.push(PathBuf::from("C:\\llamacpp"));
        dirs.push(PathBuf::from("C:\\Program Files\\llama.cpp"));
        if let Some(home) = std::env::var_os("USERPROFILE") {
            dirs.push(Path::new(&home).join("llamacpp"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/usr/bin"));
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(Path::new(&home).join("bin"));
        }
    }

    dirs
}

/// Find llama-server, falling back to the bare name (assume PATH) when the
/// search comes up empty.
pub fn find_server() -> String {
    let name = executable_name();

    for dir in search_dirs() {
        let candidate = dir.join(name);
        if candidate.is_file() {
            tracing::info!("found llama-server at: {}", candidate.display());
            return candidate.to_string_lossy().to_string();
        }
    }

    tracing::warn!(
        "llama-server not found in search paths; defaulting to '{}' (assuming PATH)",
        name
    );
    name.to_string()
}

/// The server path to use: the configured one when set, discovery
/// otherwise.
pub fn resolve_server_path(configured: &str) -> String {
    let configured = configured.trim();
    if configured.is_empty() {
        find_server()
    } else {
        configured.to_string()
    }
}
