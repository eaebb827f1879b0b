use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bstr::{BString, ByteSlice};
use tracing::instrument;

use crate::error::BranchstackError;

use super::commit::{CommitRecord, Identity, ParentEdge};
use super::oid::ObjectId;

/// Thin wrapper around [`git2::Repository`]; the VCS Gateway's entry point
/// for everything that has a convenient `git2` binding. Ancillary queries
/// that don't (`merge-base`, `rev-parse`, `for-each-ref`, `merge-file`) go
/// through [`super::run::GitRunInfo`] instead.
pub struct Repo {
    pub(crate) inner: git2::Repository,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Repo at {:?}>", self.inner.path())
    }
}

impl Repo {
    #[instrument]
    pub fn discover_from_current_dir() -> eyre::Result<Self> {
        let path = std::env::current_dir()?;
        Self::discover_from(&path)
    }

    #[instrument]
    pub fn discover_from(path: &Path) -> eyre::Result<Self> {
        let inner = git2::Repository::discover(path)
            .map_err(|err| BranchstackError::ValueError(format!("not a git repository: {err}")))?;
        Ok(Self { inner })
    }

    /// Path to the VCS private directory (`.git`, or the resolved gitdir
    /// for a worktree). This is where the Branch Cache and recorded
    /// resolutions live.
    pub fn private_dir(&self) -> PathBuf {
        self.inner.path().to_path_buf()
    }

    pub fn working_directory(&self) -> PathBuf {
        self.inner
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.private_dir())
    }

    pub fn config(&self) -> eyre::Result<git2::Config> {
        Ok(self.inner.config()?)
    }

    /// Escape hatch for callers (the Replay Engine) that need to call
    /// `git2` APIs with no wrapper of their own, such as
    /// `Index::write_tree_to`.
    pub fn raw(&self) -> &git2::Repository {
        &self.inner
    }

    /// Whether a rebase is currently in progress (`rebase-merge` exists in
    /// the private dir), used by the Orchestrator to DWIM the working
    /// branch and base.
    pub fn rebase_merge_dir(&self) -> Option<PathBuf> {
        let dir = self.private_dir().join("rebase-merge");
        dir.exists().then_some(dir)
    }

    pub fn head_oid(&self) -> eyre::Result<ObjectId> {
        let head = self.inner.head()?;
        let oid = head
            .target()
            .ok_or_else(|| BranchstackError::ValueError("HEAD is unborn".to_string()))?;
        Ok(ObjectId::from_git2(oid))
    }

    #[instrument(skip(self))]
    pub fn find_commit(&self, id: ObjectId) -> eyre::Result<CommitRecord> {
        let commit = self.inner.find_commit(id.as_git2())?;
        let full_message: BString = commit.message_bytes().into();
        let raw_subject: BString = commit.summary_bytes().unwrap_or_default().into();

        let author = identity_of(&commit.author());
        let committer = identity_of(&commit.committer());
        let tree = ObjectId::from_git2(commit.tree_id());
        let parents = commit.parent_ids().map(ObjectId::from_git2).collect();

        Ok(CommitRecord {
            id,
            topic: None,
            declared_parents: Vec::new(),
            trimmed_subject: raw_subject.clone(),
            raw_subject,
            full_message,
            author,
            committer,
            tree,
            parents,
        })
    }

    /// Create a new commit object. `parents` must be non-empty; the Replay
    /// Engine always replays onto a concrete base.
    #[instrument(skip(self, author, committer, message))]
    pub fn create_commit(
        &self,
        tree: ObjectId,
        parents: &[ObjectId],
        author: &Identity,
        committer: &Identity,
        message: &str,
    ) -> eyre::Result<ObjectId> {
        let tree = self.inner.find_tree(tree.as_git2())?;
        let parent_commits: Vec<git2::Commit> = parents
            .iter()
            .map(|oid| self.inner.find_commit(oid.as_git2()))
            .collect::<Result<_, _>>()?;
        let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();

        let author_sig = signature_of(author)?;
        let committer_sig = signature_of(committer)?;

        let oid = self.inner.commit(
            None,
            &author_sig,
            &committer_sig,
            message,
            &tree,
            &parent_refs,
        )?;
        Ok(ObjectId::from_git2(oid))
    }

    pub fn ref_lookup(&self, name: &str) -> eyre::Result<Option<ObjectId>> {
        match self.inner.find_reference(name) {
            Ok(reference) => Ok(reference
                .target()
                .map(ObjectId::from_git2)),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self))]
    pub fn ref_update(&self, name: &str, new_oid: ObjectId, reason: &str) -> eyre::Result<()> {
        self.inner
            .reference(name, new_oid.as_git2(), true, reason)?;
        Ok(())
    }

    /// Cherry-pick `patch` onto `onto`, returning the resulting index. If
    /// `index.has_conflicts()`, the caller (the Conflict Diagnostic) must
    /// resolve each conflicting path before the index can be turned into a
    /// tree.
    #[instrument(skip(self))]
    pub fn cherry_pick_to_index(
        &self,
        patch: ObjectId,
        onto: ObjectId,
    ) -> eyre::Result<git2::Index> {
        let patch_commit = self.inner.find_commit(patch.as_git2())?;
        let onto_commit = self.inner.find_commit(onto.as_git2())?;
        let index = self
            .inner
            .cherrypick_commit(&patch_commit, &onto_commit, 0, None)?;
        Ok(index)
    }

    /// The set of paths with unresolved conflicts in `index`.
    pub fn conflicting_paths(&self, index: &git2::Index) -> eyre::Result<HashSet<PathBuf>> {
        let mut result = HashSet::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            for entry in [&conflict.ancestor, &conflict.our, &conflict.their] {
                if let Some(entry) = entry {
                    result.insert(PathBuf::from(entry.path.to_path_lossy().into_owned()));
                }
            }
        }
        Ok(result)
    }

    /// Fetch the three sides (base/ours/theirs) of one conflicting path's
    /// blob contents, any of which may be absent (file added/deleted on one
    /// side).
    pub fn conflict_sides(
        &self,
        index: &git2::Index,
        path: &Path,
    ) -> eyre::Result<(Option<Vec<u8>>, Option<Vec<u8>>, Option<Vec<u8>>)> {
        let path_bytes = path.to_path_lossy();
        let entry = index
            .conflicts()?
            .filter_map(|c| c.ok())
            .find(|conflict| {
                [&conflict.ancestor, &conflict.our, &conflict.their]
                    .into_iter()
                    .flatten()
                    .any(|e| e.path.to_path_lossy() == path_bytes)
            })
            .ok_or_else(|| {
                BranchstackError::ValueError(format!("no conflict entry for {}", path.display()))
            })?;

        let blob_of = |e: &Option<git2::IndexEntry>| -> eyre::Result<Option<Vec<u8>>> {
            match e {
                Some(entry) => Ok(Some(self.inner.find_blob(entry.id)?.content().to_vec())),
                None => Ok(None),
            }
        };

        Ok((
            blob_of(&entry.ancestor)?,
            blob_of(&entry.our)?,
            blob_of(&entry.their)?,
        ))
    }

    /// Replace a conflicting path in `index` with resolved content and
    /// return the resulting tree once every conflict has been resolved.
    pub fn resolve_conflict_and_finish(
        &self,
        index: &mut git2::Index,
        resolutions: &[(PathBuf, Vec<u8>)],
    ) -> eyre::Result<ObjectId> {
        for (path, content) in resolutions {
            let blob_oid = self.inner.blob(content)?;
            let mode = index
                .get_path(path, 0)
                .map(|e| e.mode)
                .unwrap_or(0o100644);
            index.remove_path(path)?;
            index.add(&git2::IndexEntry {
                ctime: git2::IndexTime::new(0, 0),
                mtime: git2::IndexTime::new(0, 0),
                dev: 0,
                ino: 0,
                mode,
                uid: 0,
                gid: 0,
                file_size: content.len() as u32,
                id: blob_oid,
                flags: 0,
                flags_extended: 0,
                path: path.to_path_lossy().into_owned().into_bytes(),
            })?;
        }
        if index.has_conflicts() {
            let remaining = self.conflicting_paths(index)?;
            return Err(BranchstackError::ValueError(format!(
                "unresolved conflicts remain: {remaining:?}"
            ))
            .into());
        }
        let tree_oid = index.write_tree_to(&self.inner)?;
        Ok(ObjectId::from_git2(tree_oid))
    }

    /// List the oids in `base..tip`, newest first (the same order
    /// `git log base..tip` reports without `--reverse`). The Log Scanner
    /// reverses this itself when it needs chronological order.
    #[instrument(skip(self))]
    pub fn commit_range(&self, base: ObjectId, tip: ObjectId) -> eyre::Result<Vec<ObjectId>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        revwalk.push(tip.as_git2())?;
        revwalk.hide(base.as_git2())?;
        revwalk
            .map(|oid| Ok(ObjectId::from_git2(oid?)))
            .collect()
    }

    /// List `(oid, subject)` pairs for commits in `base..tip` that touched
    /// `path`, in the VCS's natural (newest-first) traversal order. Used by
    /// the Conflict Diagnostic to enumerate candidate missing dependencies.
    #[instrument(skip(self))]
    pub fn commits_touching_path(
        &self,
        base: ObjectId,
        tip: ObjectId,
        path: &Path,
    ) -> eyre::Result<Vec<ObjectId>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.push(tip.as_git2())?;
        revwalk.hide(base.as_git2())?;
        let mut result = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.inner.find_commit(oid)?;
            if commit.parent_count() > 1 {
                continue;
            }
            let tree = commit.tree()?;
            let parent_tree = commit.parents().next().map(|p| p.tree()).transpose()?;
            let diff = self.inner.diff_tree_to_tree(
                parent_tree.as_ref(),
                Some(&tree),
                None::<&mut git2::DiffOptions>,
            )?;
            let touched = diff.deltas().any(|delta| {
                delta
                    .new_file()
                    .path()
                    .map(|p| p == path)
                    .unwrap_or(false)
                    || delta
                        .old_file()
                        .path()
                        .map(|p| p == path)
                        .unwrap_or(false)
            });
            if touched {
                result.push(ObjectId::from_git2(oid));
            }
        }
        Ok(result)
    }
}

fn identity_of(sig: &git2::Signature) -> Identity {
    Identity {
        name: sig.name().unwrap_or_default().to_string(),
        email: sig.email().unwrap_or_default().to_string(),
        time: sig.when().seconds(),
        offset_minutes: sig.when().offset_minutes(),
    }
}

fn signature_of(identity: &Identity) -> eyre::Result<git2::Signature<'static>> {
    let time = git2::Time::new(identity.time, identity.offset_minutes);
    Ok(git2::Signature::new(&identity.name, &identity.email, &time)?)
}
