//! Repository-specific configuration, read through `git2::Config` so that
//! it honors the same precedence (worktree, local, global, system) Git
//! itself applies.

use tracing::instrument;

use super::Repo;

/// Default value of `branchstack.subjectPrefixPrefix`.
pub const DEFAULT_SUBJECT_PREFIX_PREFIX: &str = "[";
/// Default value of `branchstack.subjectPrefixSuffix`.
pub const DEFAULT_SUBJECT_PREFIX_SUFFIX: &str = "]";

#[instrument(skip(repo))]
pub fn get_subject_prefix_prefix(repo: &Repo) -> eyre::Result<String> {
    get_string_or(
        repo,
        "branchstack.subjectPrefixPrefix",
        DEFAULT_SUBJECT_PREFIX_PREFIX,
    )
}

#[instrument(skip(repo))]
pub fn get_subject_prefix_suffix(repo: &Repo) -> eyre::Result<String> {
    get_string_or(
        repo,
        "branchstack.subjectPrefixSuffix",
        DEFAULT_SUBJECT_PREFIX_SUFFIX,
    )
}

/// Resolve the editor to invoke on conflict, following the same fallback
/// chain as `git var GIT_EDITOR`: `branchstack.editor`, then `core.editor`,
/// then `$GIT_EDITOR`, then `$EDITOR`, then `vi`.
#[instrument(skip(repo))]
pub fn get_editor_command(repo: &Repo) -> eyre::Result<String> {
    let config = repo.config()?;
    if let Some(editor) = config.get_string("branchstack.editor").ok() {
        return Ok(editor);
    }
    if let Some(editor) = config.get_string("core.editor").ok() {
        return Ok(editor);
    }
    if let Ok(editor) = std::env::var("GIT_EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.is_empty() {
            return Ok(editor);
        }
    }
    Ok("vi".to_string())
}

fn get_string_or(repo: &Repo, key: &str, default: &str) -> eyre::Result<String> {
    let config = repo.config()?;
    match config.get_string(key) {
        Ok(value) => Ok(value),
        Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(default.to_string()),
        Err(err) => Err(err.into()),
    }
}
