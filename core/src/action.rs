pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use error::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::bench::{
    AbortSignal, Coordinator, Dimension, LanguageRow, LanguageSpec, PairHook, ResultsTable,
    TestCase, TestExecutor,
};
use crate::config::Config;
use crate::environment::SystemInfo;
use crate::style;
use crate::versions::{self, VersionInfo};

/// Write the example config into `dir`. Never overwrites.
pub fn init_config(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let filepath = dir.as_ref().join(Config::FILENAME);
    ensure!(
        !filepath.exists(),
        "Config file already exists: {}",
        filepath.to_string_lossy()
    );
    fsutil::write_with_mkdir(&filepath, Config::example_toml())
        .context("Failed to write example config")?;
    Ok(filepath)
}

/// Validate the config, look every selected toolchain up once and return the
/// languages in priority order.
///
/// An empty `only` selects every language.
pub fn resolve_languages(cfg: &Config, only: &[String]) -> Result<Vec<LanguageSpec>> {
    cfg.validate().context("Invalid configuration")?;

    if let Some(unknown) = only
        .iter()
        .find(|name| !cfg.languages.iter().any(|l| &l.name == *name))
    {
        bail!("Unknown language '{}'", unknown);
    }

    let langs = cfg
        .languages
        .iter()
        .filter(|l| only.is_empty() || only.contains(&l.name))
        .map(|l| l.resolve())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid configuration")?;

    for lang in langs.iter().filter(|l| !l.is_available()) {
        log::warn!("{}: toolchain {}", lang.name(), lang.get_toolchain());
    }
    Ok(Coordinator::sort_by_priority(&langs))
}

pub async fn do_benchmark(
    cfg: &Config,
    languages: &[LanguageSpec],
    abort: AbortSignal,
) -> Result<ResultsTable> {
    let cases = cfg.test_cases();
    ensure!(!languages.is_empty(), "No language to benchmark");

    let workdir = cfg.workdir();
    ensure!(
        workdir.is_dir(),
        "Working directory does not exist: {}",
        workdir.to_string_lossy()
    );

    let runner = cfg
        .process_runner()
        .context("Invalid configuration")?
        .abort_signal(abort);
    let executor = TestExecutor::new(runner).repetitions(cfg.bench.repetitions);

    log::info!(
        "Benchmarking {} languages x {} tests ({} runs each, timeout {}s, {} jobs)",
        languages.len(),
        cases.len(),
        cfg.bench.repetitions,
        cfg.bench.timeout_secs,
        cfg.bench.jobs,
    );

    let bar = ProgressBar::new((languages.len() * cases.len()) as u64).with_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let hook: PairHook = {
        let bar = bar.clone();
        Arc::new(move |case: &TestCase, row: &LanguageRow| {
            bar.println(self::pair_line(case, row));
            bar.set_message(format!("{} test {} done", row.language, case.index + 1));
            bar.inc(1);
        })
    };

    let res = Coordinator::new(executor)
        .jobs(cfg.bench.jobs)
        .on_pair_done(hook)
        .run_all(languages, &cases)
        .await;

    bar.finish_and_clear();
    let table = res?;
    eprintln!("{}", style::horizontal_rule());
    style::print_bench_summary(&table);
    Ok(table)
}

fn pair_line(case: &TestCase, row: &LanguageRow) -> String {
    let cells: Vec<String> = [Dimension::Cycle, Dimension::Hanoi]
        .into_iter()
        .map(|dim| {
            let stat = row.get(dim);
            let detail = match stat.mean() {
                Some(mean) => format!("{:.3}s", mean),
                None => stat.verdict().to_string(),
            };
            format!("{} {} {}", dim, style::verdict_badge(stat.verdict()), detail)
        })
        .collect();
    format!(
        "{} {}: {}",
        format!("[test {}]", case.index + 1).dimmed(),
        row.language.bold(),
        cells.join("  ")
    )
}

pub async fn collect_versions(
    cfg: &Config,
    languages: &[LanguageSpec],
    abort: AbortSignal,
) -> Result<Vec<VersionInfo>> {
    let runner = cfg
        .process_runner()
        .context("Invalid configuration")?
        .abort_signal(abort);
    versions::collect_versions(languages, &runner)
        .await
        .context("Failed to collect toolchain versions")
}

/// Host description, read off the async runtime.
pub async fn collect_system_info() -> Result<SystemInfo> {
    tokio::task::spawn_blocking(SystemInfo::detect)
        .await
        .context("Failed to collect system information")
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("langbench-action-{}", rand::random::<u64>()));
        fsutil::mkdir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn init_writes_example_once() {
        let dir = scratch_dir();
        let path = init_config(&dir).unwrap();
        assert_eq!(path, dir.join(Config::FILENAME));
        assert_eq!(fsutil::read_to_string(&path).unwrap(), Config::example_toml());
        assert!(init_config(&dir).is_err());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn resolve_filters_and_sorts() {
        let cfg = Config::from_toml(
            r#"
            [[language]]
            name = "B"
            order = 2
            run = "b"
            [[language]]
            name = "A"
            order = 1
            run = "a"
            [[language]]
            name = "C"
            order = 1
            run = "c"
            "#,
        )
        .unwrap();

        let names = |langs: Vec<LanguageSpec>| -> Vec<String> {
            langs.iter().map(|l| l.name().to_owned()).collect()
        };
        assert_eq!(names(resolve_languages(&cfg, &[]).unwrap()), ["A", "C", "B"]);
        assert_eq!(
            names(resolve_languages(&cfg, &["B".to_owned(), "C".to_owned()]).unwrap()),
            ["C", "B"]
        );
        assert!(resolve_languages(&cfg, &["Z".to_owned()]).is_err());
    }

    #[tokio::test]
    async fn system_info_describes_this_host() {
        let info = collect_system_info().await.unwrap();
        assert_eq!(info.arch, std::env::consts::ARCH);
        assert!(info.entries().iter().any(|(label, _)| *label == "OS"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn benchmark_runs_in_config_workdir() {
        let dir = scratch_dir();
        let toml = r##"
            [bench]
            repetitions = 2
            timeout_secs = 0.5
            jobs = 2

            [[test]]
            discs = 3
            pegs = 3
            iterations = 10

            [[language]]
            name = "Sh"
            compile = "touch built"
            run = "test -f built"
            clean = ["built"]

            [[language]]
            name = "Missing"
            program = "surely-not-an-installed-compiler-xyz"
            run = "#{program}"
            "##;
        let cfg_path = dir.join(Config::FILENAME);
        fsutil::write(&cfg_path, toml).unwrap();
        let cfg = Config::from_toml_file(cfg_path).unwrap();

        let langs = resolve_languages(&cfg, &[]).unwrap();
        let table = do_benchmark(&cfg, &langs, AbortSignal::never()).await.unwrap();

        assert_eq!(table.entry_count(), 2);
        assert_eq!(table.get("Sh", 0).unwrap().cycle.sample_count(), 2);
        assert!(!table.get("Missing", 0).unwrap().hanoi.is_available());
        assert!(!dir.join("built").exists());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
