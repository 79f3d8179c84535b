// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PROTOCOLO_LOG";

/// `PROTOCOLO_LOG` wins over the configured level when it is set and non-empty.
pub fn filter_directive(env_value: Option<String>, configured: &str) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_owned())
}

/// Installs the global subscriber. The terminal belongs to the UI, so every
/// line goes to `path` without ANSI colors.
pub fn init(path: &Path, configured_level: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let directive = filter_directive(env::var(LOG_ENV).ok(), configured_level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?}; fix [log].level or {LOG_ENV}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[cfg(test)]
mod tests {
    use super::{LOG_ENV, filter_directive, init};
    use anyhow::Result;
    use tracing::{debug, info};

    #[test]
    fn env_directive_overrides_configured_level() {
        assert_eq!(
            filter_directive(Some("protocolo_api=debug".to_owned()), "info"),
            "protocolo_api=debug"
        );
        assert_eq!(filter_directive(Some("  ".to_owned()), "warn"), "warn");
        assert_eq!(filter_directive(None, "info"), "info");
    }

    #[test]
    fn init_writes_plain_lines_to_file() -> Result<()> {
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("protocolo.log");
        init(&path, "info")?;

        info!(count = 3, "protocol list loaded");
        debug!("filtered out at info");

        let written = std::fs::read_to_string(&path)?;
        assert!(written.contains("protocol list loaded"));
        assert!(written.contains("count=3"));
        assert!(!written.contains("filtered out at info"));
        assert!(!written.contains('\u{1b}'));
        Ok(())
    }
}
