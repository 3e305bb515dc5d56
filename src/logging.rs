use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_BASENAME: &str = "macro-deck.log";
const LOG_DIR_ENV: &str = "MACRO_DECK_LOG_PATH";
const LOG_RETENTION_DAYS: u64 = 7;

/// Subsystem for macOS unified logging (os_log).
#[cfg(target_os = "macos")]
const OSLOG_SUBSYSTEM: &str = "dev.macro-deck.agent";

/// Get the log directory path
pub fn get_log_dir() -> Result<PathBuf> {
    resolve_log_dir()
}

/// Install the global subscriber: stderr plus a daily rolling file.
///
/// The returned guard flushes the file writer on drop and must be held
/// for the life of the process.
pub fn init_logging() -> Result<WorkerGuard> {
    let log_dir = resolve_log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    prune_old_logs(
        &log_dir,
        Duration::from_secs(60 * 60 * 24 * LOG_RETENTION_DAYS),
    );

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_BASENAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Console.app picks these up under the subsystem above
    #[cfg(target_os = "macos")]
    let oslog_layer = Some(tracing_oslog::OsLogger::new(OSLOG_SUBSYSTEM, "default"));
    #[cfg(not(target_os = "macos"))]
    let oslog_layer: Option<tracing_subscriber::layer::Identity> = None;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .with(oslog_layer)
        .init();

    Ok(guard)
}

fn resolve_log_dir() -> Result<PathBuf> {
    match std::env::var_os(LOG_DIR_ENV) {
        Some(path) => Ok(PathBuf::from(path)),
        None => platform_log_dir(),
    }
}

#[cfg(target_os = "macos")]
fn platform_log_dir() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("Failed to determine home directory for log path")?;
    Ok(home.join("Library").join("Logs").join("macro-deck"))
}

#[cfg(not(target_os = "macos"))]
fn platform_log_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", "macro-deck", "macro-deck")
        .context("Failed to determine project directories for log path")?;
    // Only Linux has a state dir
    let base = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(base.join("logs"))
}

fn prune_old_logs(log_dir: &Path, max_age: Duration) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if !file_name.starts_with(LOG_FILE_BASENAME) {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };

        if modified < cutoff {
            let _ = std::fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_log_dir_is_per_app() {
        let dir = platform_log_dir().unwrap();
        assert!(dir
            .components()
            .any(|c| c.as_os_str().to_string_lossy().contains("macro-deck")));
    }

    #[test]
    fn test_prune_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join(format!("{}.2026-10-17", LOG_FILE_BASENAME));
        let foreign = dir.path().join("notes.txt");
        std::fs::write(&fresh, "log").unwrap();
        std::fs::write(&foreign, "other").unwrap();

        prune_old_logs(dir.path(), Duration::from_secs(60));
        assert!(fresh.exists());

        // Everything matching the basename is older than a zero max age
        std::thread::sleep(Duration::from_millis(20));
        prune_old_logs(dir.path(), Duration::ZERO);
        assert!(!fresh.exists());
        assert!(foreign.exists());
    }
}
