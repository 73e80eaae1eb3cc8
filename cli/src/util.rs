use std::{
    path::{Path, PathBuf},
    process::exit,
    time::Duration,
};

use anyhow::anyhow;
use langbench_core::{
    bench::{abort_pair, AbortSignal, Aborted},
    Config,
};

use crate::cmd::GlobalArgs;

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

/// `--config` if given, otherwise the nearest langbench.toml upwards.
pub fn load_config(args: &GlobalArgs) -> anyhow::Result<Config> {
    let cfg = match &args.config {
        Some(path) => Config::from_toml_file(path.clone())?,
        None => Config::from_file_finding_in_ancestors(self::current_dir())?,
    };
    if let Some(path) = &cfg.source_config_file {
        log::debug!("Config: {}", replace_homedir_to_tilde(path).to_string_lossy());
    }
    Ok(cfg)
}

/// Fire the abort on Ctrl-C, or once `deadline` elapsed.
pub fn spawn_abort_triggers(deadline: Option<Duration>) -> AbortSignal {
    let (handle, signal) = abort_pair();

    let h = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping running processes...");
            h.abort();
        }
    });

    if let Some(deadline) = deadline {
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            log::warn!(
                "Deadline of {}s exceeded, stopping running processes...",
                deadline.as_secs_f64()
            );
            handle.abort();
        });
    }
    signal
}

pub fn explain_abort(e: anyhow::Error) -> anyhow::Error {
    if e.is::<Aborted>() {
        anyhow!("Benchmark aborted before completion; no report was produced")
    } else {
        e
    }
}
