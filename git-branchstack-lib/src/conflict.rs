//! The Conflict Diagnostic: resolves per-path conflicts raised while the
//! Replay Engine cherry-picks a commit, modeled as an explicit capability
//! object (`MergeBlobs`) threaded through from the Replay Engine rather
//! than a process-global callback (see DESIGN.md, "Merge hook injection").

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::instrument;

use crate::error::BranchstackError;
use crate::git::{get_subject_prefix_prefix, get_subject_prefix_suffix, GitRunInfo, ObjectId, Repo};
use crate::parser::parse_subject;

const RESOLUTIONS_DIR_NAME: &str = "branchstack-resolutions";

/// Owned state for resolving merge-blob conflicts during a single replay
/// run: where recorded resolutions live, and what to tell the user about
/// candidate missing dependencies when a conflict has no recorded fix.
pub struct MergeBlobs<'a> {
    repo: &'a Repo,
    git_run: &'a GitRunInfo,
    editor: String,
    resolutions_dir: PathBuf,
}

/// Context about the commit being replayed, used only to print a useful
/// "missing dependency?" diagnostic.
pub struct ConflictContext<'a> {
    pub base: ObjectId,
    /// The parent of the commit being replayed, in the *original* history
    /// (not the rewritten one) — the diagnostic range is `base..parent`.
    pub original_parent: ObjectId,
    pub closure_topics: &'a IndexSet<String>,
}

impl<'a> MergeBlobs<'a> {
    pub fn new(repo: &'a Repo, git_run: &'a GitRunInfo, editor: String) -> Self {
        Self {
            repo,
            git_run,
            editor,
            resolutions_dir: repo.private_dir().join(RESOLUTIONS_DIR_NAME),
        }
    }

    /// Resolve every conflicting path in `index`, mutating it in place with
    /// `git2::Index::add`-equivalent writes via [`Repo::resolve_conflict_and_finish`].
    /// Returns the resulting tree once every conflict has a resolution.
    #[instrument(skip(self, index, context))]
    pub fn resolve_index(
        &self,
        index: &mut git2::Index,
        context: ConflictContext<'_>,
    ) -> eyre::Result<ObjectId> {
        let paths = self.repo.conflicting_paths(index)?;
        let mut resolutions = Vec::with_capacity(paths.len());
        for path in paths {
            let resolved = self.resolve_path(index, &path, &context)?;
            resolutions.push((path, resolved));
        }
        self.repo.resolve_conflict_and_finish(index, &resolutions)
    }

    fn resolve_path(
        &self,
        index: &git2::Index,
        path: &Path,
        context: &ConflictContext<'_>,
    ) -> eyre::Result<Vec<u8>> {
        let (base, ours, theirs) = self.repo.conflict_sides(index, path)?;
        let (clean, merged) = self.git_run.merge_file(
            ("ours", "base", "theirs"),
            ours.as_deref().unwrap_or_default(),
            base.as_deref().unwrap_or_default(),
            theirs.as_deref().unwrap_or_default(),
        )?;
        if clean {
            return Ok(merged);
        }

        let conflict_id = conflict_id_of(&merged);
        if let Some(resolved) = self.read_recorded_resolution(&conflict_id)? {
            tracing::debug!(path = %path.display(), conflict_id, "replaying recorded resolution");
            return Ok(resolved);
        }

        self.print_candidate_missing_dependencies(path, context)?;
        self.prompt_and_edit(path, &merged, &conflict_id)
    }

    /// Per §4.5 step 2: candidates are commits in `base..original_parent`
    /// that *touched this conflicting path* and whose topic isn't already
    /// part of the closure being replayed.
    fn print_candidate_missing_dependencies(
        &self,
        path: &Path,
        context: &ConflictContext<'_>,
    ) -> eyre::Result<()> {
        println!("Missing dependency on one of the commits below?");
        let prefix = get_subject_prefix_prefix(self.repo)?;
        let suffix = get_subject_prefix_suffix(self.repo)?;
        let touching = self
            .repo
            .commits_touching_path(context.base, context.original_parent, path)?;
        for id in touching {
            let commit = self.repo.find_commit(id)?;
            let parsed = parse_subject(
                commit.raw_subject.as_slice(),
                prefix.as_bytes(),
                suffix.as_bytes(),
            );
            if let Some(topic) = &parsed.topic {
                if context.closure_topics.contains(topic) {
                    continue;
                }
            }
            let tag = match &parsed.topic {
                Some(topic) if !topic.is_empty() => format!("[{topic}] "),
                Some(_) => "[] ".to_string(),
                None => String::new(),
            };
            let line = format!("{} {}{}", commit.id.short(), tag, parsed.trimmed_subject);
            println!("\t{}", console::style(line).dim());
        }
        Ok(())
    }

    fn prompt_and_edit(
        &self,
        path: &Path,
        conflicted: &[u8],
        conflict_id: &str,
    ) -> eyre::Result<Vec<u8>> {
        if !confirm(&format!("Conflict in {}. Edit to resolve?", path.display()))? {
            return Err(BranchstackError::MergeConflict(format!(
                "user declined to resolve conflict in {}",
                path.display()
            ))
            .into());
        }

        let dir = tempfile::tempdir()?;
        let scratch_path = dir.path().join(
            path.file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("conflict")),
        );
        std::fs::write(&scratch_path, conflicted)?;

        self.git_run.run_editor(&self.editor, &scratch_path)?;
        let edited = std::fs::read(&scratch_path)?;

        if edited == conflicted {
            println!("Warning: file was not modified.");
        }
        if has_conflict_markers(&edited) {
            println!("Warning: conflict markers are still present.");
        }

        if !confirm("Merge successful?")? {
            return Err(BranchstackError::MergeConflict(format!(
                "conflict in {} was not marked resolved",
                path.display()
            ))
            .into());
        }

        self.record_resolution(conflict_id, &edited)?;
        Ok(edited)
    }

    fn read_recorded_resolution(&self, conflict_id: &str) -> eyre::Result<Option<Vec<u8>>> {
        let path = self.resolutions_dir.join(conflict_id);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn record_resolution(&self, conflict_id: &str, resolved: &[u8]) -> eyre::Result<()> {
        std::fs::create_dir_all(&self.resolutions_dir)?;
        std::fs::write(self.resolutions_dir.join(conflict_id), resolved)?;
        Ok(())
    }
}

/// Content hash of the conflict-marked preimage, used to key recorded
/// resolutions so an identical conflict hit again on a later invocation
/// resolves automatically.
fn conflict_id_of(conflict_marked_bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    conflict_marked_bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn has_conflict_markers(content: &[u8]) -> bool {
    content.split(|&b| b == b'\n').any(|line| {
        line.starts_with(b"<<<<<<<") || line.starts_with(b"=======") || line.starts_with(b">>>>>>>")
    })
}

fn confirm(prompt: &str) -> eyre::Result<bool> {
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_id_is_stable() {
        let a = conflict_id_of(b"<<<<<<< ours\nx\n=======\ny\n>>>>>>> theirs\n");
        let b = conflict_id_of(b"<<<<<<< ours\nx\n=======\ny\n>>>>>>> theirs\n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_has_conflict_markers() {
        assert!(has_conflict_markers(b"a\n<<<<<<< ours\nb\n"));
        assert!(!has_conflict_markers(b"a\nb\nc\n"));
    }
}
