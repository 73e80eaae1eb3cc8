use std::time::Duration;

use serde::Serialize;

use crate::bench::{Aborted, ExecutionOutcome, LanguageSpec, ProcessRunner};

pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

pub const NOT_FOUND: &str = "not found";
pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub language: String,
    pub toolchain: String,
    pub version: String,
}

/// Ask every language for its version string, in the given order.
///
/// A failing version command is recorded as [`UNAVAILABLE`]; only an abort
/// stops the collection.
pub async fn collect_versions(
    languages: &[LanguageSpec],
    runner: &ProcessRunner,
) -> anyhow::Result<Vec<VersionInfo>> {
    let runner = runner.clone().timeout(VERSION_TIMEOUT).capture_stdout(true);

    let mut infos = Vec::with_capacity(languages.len());
    for lang in languages {
        let version = if !lang.is_available() {
            NOT_FOUND.to_owned()
        } else {
            self::query_version(lang, &runner).await?
        };
        infos.push(VersionInfo {
            language: lang.name().to_owned(),
            toolchain: lang.get_toolchain().to_string(),
            version,
        });
    }
    Ok(infos)
}

async fn query_version(lang: &LanguageSpec, runner: &ProcessRunner) -> anyhow::Result<String> {
    let Some(cmd) = lang.version_command()? else {
        return Ok(UNAVAILABLE.to_owned());
    };

    let res = match runner.run(&cmd).await {
        Ok(res) => res,
        Err(e) if e.is::<Aborted>() => return Err(e),
        Err(e) => {
            log::warn!("Cannot query version of {}: {:#}", lang.name(), e);
            return Ok(UNAVAILABLE.to_owned());
        }
    };

    if !matches!(res.outcome, ExecutionOutcome::Success(_)) {
        log::warn!("Version command of {} failed: {:?}", lang.name(), res.outcome);
        return Ok(UNAVAILABLE.to_owned());
    }

    // Some toolchains (javac, for one) print their version to stderr.
    Ok(self::first_nonempty_line(&res.stdout)
        .or_else(|| self::first_nonempty_line(&res.stderr))
        .unwrap_or(UNAVAILABLE)
        .to_owned())
}

fn first_nonempty_line(s: &str) -> Option<&str> {
    s.lines().map(str::trim).find(|line| !line.is_empty())
}
