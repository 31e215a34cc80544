// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "TRACKER_LOG";

/// The terminal belongs to the UI, so interactive sessions log to a file.
pub fn init_file(level: &str, path: &Path) -> Result<()> {
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
        .with_context(|| {
            format!(
                "open log file {} -- set [log].file to a writable path",
                path.display()
            )
        })?;

    tracing_subscriber::registry()
        .with(filter(level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

pub fn init_stderr(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(level)?)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

/// `TRACKER_LOG` wins over the configured level.
fn filter(level: &str) -> Result<EnvFilter> {
    let directives = match env::var(LOG_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => level.to_owned(),
    };
    EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {directives:?}"))
}
