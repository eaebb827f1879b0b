//! Testing utilities: a disposable repository wrapper used by unit tests in
//! this crate and by the binary crate's scenario tests under `tests/`.
//!
//! This lives in `src` rather than `tests` because unit tests in other
//! modules use it too.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use eyre::Context;
use tempfile::TempDir;

use crate::git::Repo;

const DUMMY_NAME: &str = "Testy McTestface";
const DUMMY_EMAIL: &str = "test@example.com";
const DUMMY_DATE: &str = "1600000000 +0000";

/// A disposable Git repository on disk, for driving end-to-end scenarios.
pub struct GitWrapper {
    _dir: TempDir,
    pub path: PathBuf,
}

impl GitWrapper {
    /// Initialize a fresh repository with one commit on its default branch.
    pub fn init() -> eyre::Result<Self> {
        let dir = tempfile::tempdir().wrap_err("Creating scratch repo dir")?;
        let path = dir.path().to_path_buf();
        let wrapper = Self { _dir: dir, path };
        wrapper.run(&["init", "-q", "-b", "main"])?;
        wrapper.run(&["config", "user.name", DUMMY_NAME])?;
        wrapper.run(&["config", "user.email", DUMMY_EMAIL])?;
        wrapper.commit("base", "base commit")?;
        Ok(wrapper)
    }

    /// Run a raw `git` subcommand in the repository, failing the test on a
    /// non-zero exit.
    pub fn run(&self, args: &[&str]) -> eyre::Result<String> {
        let mut command = Command::new("git");
        command.current_dir(&self.path);
        command.args(args);
        command.env("GIT_AUTHOR_NAME", DUMMY_NAME);
        command.env("GIT_AUTHOR_EMAIL", DUMMY_EMAIL);
        command.env("GIT_AUTHOR_DATE", DUMMY_DATE);
        command.env("GIT_COMMITTER_NAME", DUMMY_NAME);
        command.env("GIT_COMMITTER_EMAIL", DUMMY_EMAIL);
        command.env("GIT_COMMITTER_DATE", DUMMY_DATE);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let output = command
            .output()
            .wrap_err_with(|| format!("Running git {:?}", args))?;
        if !output.status.success() {
            eyre::bail!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run `git` with extra environment overrides, e.g. to stamp a
    /// different author/committer timestamp per commit.
    pub fn run_with_env(&self, args: &[&str], env: &HashMap<&str, &str>) -> eyre::Result<String> {
        let mut command = Command::new("git");
        command.current_dir(&self.path);
        command.args(args);
        for (key, value) in env {
            command.env(key, value);
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let output = command
            .output()
            .wrap_err_with(|| format!("Running git {:?}", args))?;
        if !output.status.success() {
            eyre::bail!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Append a line to `name.txt` (creating it if needed) and commit with
    /// `subject`, using the fixed dummy author/committer identity so
    /// resulting oids are reproducible across test runs modulo content.
    pub fn commit(&self, file_stem: &str, subject: &str) -> eyre::Result<String> {
        let file_path = self.path.join(format!("{file_stem}.txt"));
        let mut content = std::fs::read_to_string(&file_path).unwrap_or_default();
        content.push_str(subject);
        content.push('\n');
        std::fs::write(&file_path, content)?;
        self.run(&["add", "-A"])?;
        self.run(&["commit", "-q", "-m", subject])?;
        self.run(&["rev-parse", "HEAD"])
    }

    /// Commit touching a specific path with specific content, for conflict
    /// scenarios that need two topics to collide on the same file.
    pub fn commit_file(&self, path: &str, content: &str, subject: &str) -> eyre::Result<String> {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        self.run(&["add", "-A"])?;
        self.run(&["commit", "-q", "-m", subject])?;
        self.run(&["rev-parse", "HEAD"])
    }

    pub fn open(&self) -> eyre::Result<Repo> {
        Repo::discover_from(&self.path)
    }

    /// The subject lines of every commit on `branch`, oldest first.
    pub fn branch_subjects(&self, branch: &str) -> eyre::Result<Vec<String>> {
        let out = self.run(&["log", "--reverse", "--format=%s", &format!("main..{branch}")])?;
        if out.is_empty() {
            return Ok(Vec::new());
        }
        Ok(out.lines().map(str::to_string).collect())
    }
}
