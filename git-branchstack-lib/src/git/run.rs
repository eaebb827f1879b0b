use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use eyre::Context;
use tracing::instrument;

use crate::error::BranchstackError;

/// Everything needed to invoke the `git` executable as a subprocess:
/// ancillary queries that don't have a convenient `git2` binding
/// (`merge-base`, `rev-parse`, `for-each-ref`), plus the `merge-file`
/// three-way text merge primitive the Conflict Diagnostic relies on.
#[derive(Clone, Debug)]
pub struct GitRunInfo {
    pub path_to_git: PathBuf,
    pub working_directory: PathBuf,
    pub env: HashMap<OsString, OsString>,
}

impl Default for GitRunInfo {
    fn default() -> Self {
        Self {
            path_to_git: PathBuf::from("git"),
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env: std::env::vars_os().collect(),
        }
    }
}

/// The result of invoking Git: exit code, stdout, stderr.
pub struct GitRunResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl GitRunInfo {
    fn command(&self) -> Command {
        let mut command = Command::new(&self.path_to_git);
        command.current_dir(&self.working_directory);
        command.env_clear();
        command.envs(self.env.iter());
        command
    }

    /// Run `git <args>` and return its captured stdout, failing on any
    /// non-zero exit code.
    #[instrument(skip(self))]
    pub fn run<S: AsRef<str> + std::fmt::Debug>(&self, args: &[S]) -> eyre::Result<Vec<u8>> {
        let result = self.run_allow_failure(args)?;
        if result.exit_code != 0 {
            return Err(BranchstackError::CalledProcessError(result.exit_code).into());
        }
        Ok(result.stdout)
    }

    /// Run `git <args>` without treating a non-zero exit as an error; the
    /// caller inspects `exit_code` itself. Used by `merge-file`, whose exit
    /// status distinguishes a clean merge (0) from one with conflicts (1).
    #[instrument(skip(self))]
    pub fn run_allow_failure<S: AsRef<str> + std::fmt::Debug>(
        &self,
        args: &[S],
    ) -> eyre::Result<GitRunResult> {
        let mut command = self.command();
        command.args(args.iter().map(AsRef::as_ref));
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let output = command
            .output()
            .wrap_err("Spawning git subprocess")
            .wrap_err_with(|| format!("git {:?}", args))?;
        Ok(GitRunResult {
            exit_code: output.status.code().unwrap_or(1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Run `git merge-file` on three files to produce a three-way content
    /// merge with conflict markers on collision, exactly as Git's own
    /// `rebase`/`cherry-pick` machinery would. This is the "VCS's native
    /// three-way merge" the specification's Non-goals refer to: we don't
    /// reimplement a merge algorithm, we shell out to the one Git ships.
    #[instrument(skip(self, ours, base, theirs))]
    pub fn merge_file(
        &self,
        labels: (&str, &str, &str),
        ours: &[u8],
        base: &[u8],
        theirs: &[u8],
    ) -> eyre::Result<(bool, Vec<u8>)> {
        let dir = tempfile::tempdir().wrap_err("Creating scratch dir for merge-file")?;
        let ours_path = dir.path().join("ours");
        let base_path = dir.path().join("base");
        let theirs_path = dir.path().join("theirs");
        std::fs::write(&ours_path, ours)?;
        std::fs::write(&base_path, base)?;
        std::fs::write(&theirs_path, theirs)?;

        let (label_ours, label_base, label_theirs) = labels;
        let mut command = self.command();
        command
            .args([
                "merge-file",
                "-p",
                "-L",
                label_ours,
                "-L",
                label_base,
                "-L",
                label_theirs,
            ])
            .arg(&ours_path)
            .arg(&base_path)
            .arg(&theirs_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let output = command.output().wrap_err("Running git merge-file")?;
        // Per git-merge-file(1): 0 = clean merge, >0 = that many conflicts,
        // <0 = some other error.
        let clean = output.status.success();
        if output.status.code().unwrap_or(-1) < 0 {
            return Err(BranchstackError::CalledProcessError(
                output.status.code().unwrap_or(-1),
            )
            .into());
        }
        Ok((clean, output.stdout))
    }

    /// `git merge-base <a> <b>`.
    pub fn merge_base(&self, a: &str, b: &str) -> eyre::Result<String> {
        let stdout = self.run(&["merge-base", "--", a, b])?;
        decode_single_line(&stdout)
    }

    /// `git rev-parse <rev>`.
    pub fn rev_parse(&self, rev: &str) -> eyre::Result<String> {
        let stdout = self.run(&["rev-parse", rev])?;
        decode_single_line(&stdout)
    }

    /// `git symbolic-ref --short HEAD`.
    pub fn current_branch_name(&self) -> eyre::Result<Option<String>> {
        let result = self.run_allow_failure(&["symbolic-ref", "--short", "HEAD"])?;
        if result.exit_code != 0 {
            return Ok(None);
        }
        Ok(Some(decode_single_line(&result.stdout)?))
    }

    /// Invoke the user's configured editor on a file in place, analogous to
    /// `git var GIT_EDITOR`'s consumers. Returns an error if the editor
    /// exits non-zero.
    #[instrument(skip(self))]
    pub fn run_editor(&self, editor: &str, path: &std::path::Path) -> eyre::Result<()> {
        // Editor commands may be multi-word (e.g. "code --wait"); split on
        // whitespace the same way `sh -c` would for a simple command.
        let parts = shell_words_lite(editor);
        let (program, rest) = parts
            .split_first()
            .ok_or_else(|| BranchstackError::EditorError("empty editor command".to_string()))?;
        let mut command = Command::new(program);
        command.current_dir(&self.working_directory);
        command.env_clear();
        command.envs(self.env.iter());
        command.args(rest);
        command.arg(path);
        command.stdin(Stdio::inherit());
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
        let status = command
            .spawn()
            .and_then(|mut child| child.wait())
            .wrap_err_with(|| format!("Invoking editor: {editor}"))?;
        if !status.success() {
            return Err(BranchstackError::EditorError(format!(
                "editor exited with {}",
                status.code().unwrap_or(-1)
            ))
            .into());
        }
        Ok(())
    }
}

fn decode_single_line(bytes: &[u8]) -> eyre::Result<String> {
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|err| BranchstackError::ValueError(err.to_string()))?;
    Ok(text.trim().to_string())
}

/// A minimal whitespace-based command splitter, good enough for the editor
/// commands Git config realistically contains (no quoting support).
fn shell_words_lite(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_file_clean() -> eyre::Result<()> {
        let git = GitRunInfo::default();
        let (clean, merged) =
            git.merge_file(("ours", "base", "theirs"), b"a\nb\nc\n", b"a\nb\nc\n", b"a\nb\nd\n")?;
        assert!(clean);
        assert_eq!(merged, b"a\nb\nd\n");
        Ok(())
    }

    #[test]
    fn test_merge_file_conflict() -> eyre::Result<()> {
        let git = GitRunInfo::default();
        let (clean, merged) = git.merge_file(
            ("ours", "base", "theirs"),
            b"a\nOURS\nc\n",
            b"a\nb\nc\n",
            b"a\nTHEIRS\nc\n",
        )?;
        assert!(!clean);
        let merged = String::from_utf8_lossy(&merged);
        assert!(merged.contains("<<<<<<<"));
        assert!(merged.contains("======="));
        assert!(merged.contains(">>>>>>>"));
        Ok(())
    }
}
