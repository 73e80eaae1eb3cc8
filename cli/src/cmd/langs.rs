use std::io;

use colored::Colorize as _;
use langbench_core::action;
use serde::Serialize;

use super::{GlobalArgs, SubcmdResult};
use crate::util;

/// List configured languages in benchmark order
#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Serialize)]
struct LangEntry<'a> {
    name: &'a str,
    order: i64,
    toolchain: String,
    available: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = util::load_config(global_args)?;
    let langs = action::resolve_languages(&cfg, &[])?;

    if args.json {
        let entries: Vec<_> = langs
            .iter()
            .map(|l| LangEntry {
                name: l.name(),
                order: l.get_order(),
                toolchain: l.get_toolchain().to_string(),
                available: l.is_available(),
            })
            .collect();
        serde_json::to_writer_pretty(io::stdout(), &entries)?;
        println!();
        return Ok(());
    }

    for lang in langs {
        let toolchain = lang.get_toolchain().to_string();
        println!(
            "{:>4}  {} {}",
            lang.get_order(),
            format!("{:<24}", lang.name()).bold(),
            if lang.is_available() {
                toolchain.normal()
            } else {
                toolchain.bright_red()
            }
        );
    }
    Ok(())
}
