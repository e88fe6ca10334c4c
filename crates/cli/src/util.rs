//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use garage_core::{current_timestamp_ms, Config, StateLayout};
use std::path::PathBuf;

/// Current directory with symlinks resolved
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .context("Failed to get current directory")?
        .canonicalize()
        .context("Failed to resolve current directory")
}

/// Find the watched tree by walking up from cwd to the first `.garage/`
pub fn find_root() -> Result<StateLayout> {
    let cwd = current_dir()?;
    StateLayout::discover(&cwd).context("Not a garage tree (run 'garage start' to begin watching)")
}

/// The enclosing watched tree, or a new one rooted at cwd
pub fn find_or_create_root() -> Result<StateLayout> {
    let cwd = current_dir()?;
    let layout = StateLayout::discover(&cwd).unwrap_or_else(|_| StateLayout::new(cwd));
    layout
        .ensure()
        .context("Failed to create state directory")?;
    Ok(layout)
}

pub fn load_config(layout: &StateLayout) -> Result<Config> {
    Config::load(&layout.config_path()).context("Failed to load configuration")
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts_ms: u64) -> String {
    let now = current_timestamp_ms();
    if ts_ms > now {
        return "in the future".to_string();
    }

    let seconds = (now - ts_ms) / 1000;
    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Format timestamp as local absolute time ("2024-01-03 14:30:00")
pub fn format_absolute_time(ts_ms: u64) -> String {
    match Local.timestamp_millis_opt(ts_ms as i64).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown".to_string(),
    }
}

/// Path relative to the watched root for display
pub fn display_path(layout: &StateLayout, path: &str) -> String {
    let path = std::path::Path::new(path);
    match path.strip_prefix(layout.root()) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
        Ok(_) => ".".to_string(),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_relative_time() {
        let now = current_timestamp_ms();

        assert!(format_relative_time(now).contains("seconds ago"));
        assert!(format_relative_time(now - 3600 * 1000).contains("hour"));
        assert!(format_relative_time(now - 86400 * 1000).contains("day"));
        assert_eq!(format_relative_time(now + 60_000), "in the future");
    }

    #[test]
    fn test_display_path() {
        let layout = StateLayout::new("/work/project");

        assert_eq!(display_path(&layout, "/work/project/src/main.rs"), "src/main.rs");
        assert_eq!(display_path(&layout, "/work/project"), ".");
        assert_eq!(display_path(&layout, "/elsewhere/x"), "/elsewhere/x");
    }
}
