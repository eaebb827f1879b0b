//! `git-branchstack`: rebuild topic branches out of `[topic]`-tagged
//! commits in `@{upstream}..HEAD` (or an explicit range).

mod logging;
mod opts;
mod orchestrator;

use clap::Parser;

use branchstack::error::BranchstackError;
use branchstack::git::{GitRunInfo, Repo};
use branchstack::util::{exit_code_for, EyreExitOr};

use opts::Opts;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opts = Opts::parse();
    logging::install_tracing(opts.verbose)?;

    match run(&opts)? {
        Ok(()) => Ok(()),
        Err(exit_code) => std::process::exit(exit_code.0),
    }
}

fn run(opts: &Opts) -> EyreExitOr<()> {
    let repo = Repo::discover_from_current_dir()?;
    let git_run = GitRunInfo::default();

    match orchestrator::run(&repo, &git_run, opts) {
        Ok(()) => Ok(Ok(())),
        Err(report) => match report.downcast::<BranchstackError>() {
            Ok(err) => {
                eprintln!("error: {err}");
                Ok(Err(exit_code_for(&err)))
            }
            Err(report) => Err(report),
        },
    }
}
