use langbench_core::{action, report};

use super::{GlobalArgs, SubcmdResult};
use crate::util;

/// Print the version of every configured toolchain
#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(short, long)]
    pub json: bool,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = util::load_config(global_args)?;
    let langs = action::resolve_languages(&cfg, &[])?;
    let abort = util::spawn_abort_triggers(None);

    let versions = action::collect_versions(&cfg, &langs, abort).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    } else {
        println!("{}", report::version_table(&versions));
    }
    Ok(())
}
