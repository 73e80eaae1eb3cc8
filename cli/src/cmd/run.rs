use std::path::PathBuf;

use anyhow::Context as _;
use langbench_core::{action, config, print_success, report};

use super::{GlobalArgs, SubcmdResult};
use crate::util;

/// Benchmark every configured language and print the report
#[derive(Debug, clap::Args)]
pub struct Args {
    /// Number of languages benchmarked at the same time
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Runs per (language, test, program)
    #[arg(short = 'n', long)]
    pub repetitions: Option<usize>,

    /// Per-run timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// Abort the whole run after this many seconds
    #[arg(long)]
    pub deadline: Option<f64>,

    /// Benchmark only these languages (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    pub only: Vec<String>,

    /// Include toolchain versions in the report
    #[arg(long)]
    pub versions: bool,

    /// Include OS, CPU and memory of this machine in the report
    #[arg(long)]
    pub system_info: bool,

    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let mut cfg = util::load_config(global_args)?;
    if let Some(n) = args.jobs {
        cfg.bench.jobs = n;
    }
    if let Some(n) = args.repetitions {
        cfg.bench.repetitions = n;
    }
    if let Some(t) = args.timeout {
        cfg.bench.timeout_secs = t;
    }
    let deadline = match args.deadline {
        Some(secs) => Some(
            config::positive_secs(secs).with_context(|| {
                format!("--deadline must be a positive number of seconds (got {})", secs)
            })?,
        ),
        None => None,
    };

    let langs = action::resolve_languages(&cfg, &args.only)?;
    let abort = util::spawn_abort_triggers(deadline);

    let versions = if args.versions {
        let v = action::collect_versions(&cfg, &langs, abort.clone()).await;
        Some(v.map_err(util::explain_abort)?)
    } else {
        None
    };

    let table = action::do_benchmark(&cfg, &langs, abort)
        .await
        .map_err(util::explain_abort)?;

    let mut info = report::RunInfo::now(cfg.bench.repetitions, cfg.bench.timeout()?);
    if args.system_info {
        info = info.system(action::collect_system_info().await?);
    }
    let text = if args.json {
        report::render_json(&table, &info, versions.as_deref())? + "\n"
    } else {
        report::render_markdown(&table, &info, versions.as_deref())
    };

    match &args.output {
        Some(path) => {
            fsutil::write_with_mkdir(path, text).context("Failed to write report")?;
            print_success!(
                "Report saved to {}",
                util::replace_homedir_to_tilde(path).to_string_lossy()
            );
        }
        None => print!("{}", text),
    }
    Ok(())
}
