pub mod init;
pub mod langs;
pub mod run;
pub mod versions;

use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Config file. Searched in the current dir and its ancestors if omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),
    Langs(langs::Args),

    #[command(alias("r"))]
    Run(run::Args),

    Versions(versions::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Langs(args) => langs::exec(args, self),
            Run(args) => run::exec(args, self).await,
            Versions(args) => versions::exec(args, self).await,
        }
    }
}
