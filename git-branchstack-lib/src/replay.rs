//! The Replay Engine: cherry-picks one topic's commits onto a base,
//! stripping or retaining subject tags per the run's retention policy, and
//! updates `refs/heads/<topic>` to the result.

use indexmap::IndexSet;
use tracing::instrument;

use crate::conflict::{ConflictContext, MergeBlobs};
use crate::git::{CommitRecord, ObjectId, Repo};
use crate::resolve::Closure;

/// How much of a replayed commit's original subject tag to retain on the
/// rewritten commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TagRetention {
    /// Strip every tag (the default): replayed subjects become
    /// `trimmed_subject`.
    #[default]
    None,
    /// Retain tags on every commit whose topic is not the target topic.
    Dependencies,
    /// Retain every tag, including the target topic's own commits.
    All,
}

/// The outcome of replaying one topic.
pub struct ReplayResult {
    pub topic: String,
    pub head: ObjectId,
    pub previous: Option<ObjectId>,
    pub commit_count: usize,
}

/// Replay `target_topic`'s closure of commits from `ordered_commits` onto
/// `base`, three-way-merging each one via `merge_blobs`, and move
/// `refs/heads/<target_topic>` to the result.
///
/// `ordered_commits` is the full scanned range in original order; only
/// commits whose topic is a key of `closure` participate. The original
/// (pre-replay) parent of each replayed commit is threaded through to
/// `merge_blobs` so conflict diagnostics can search `base..parent` for
/// missing dependencies.
#[instrument(skip(repo, merge_blobs, ordered_commits, closure))]
pub fn replay_topic(
    repo: &Repo,
    merge_blobs: &MergeBlobs<'_>,
    target_topic: &str,
    closure: &Closure,
    ordered_commits: &[CommitRecord],
    base: ObjectId,
    retention: TagRetention,
) -> eyre::Result<ReplayResult> {
    let closure_topics: IndexSet<String> = closure.keys().cloned().collect();

    let mut head = base;
    let mut commit_count = 0;
    for commit in ordered_commits {
        let Some(topic) = &commit.topic else {
            continue;
        };
        let Some(&keep_tag) = closure.get(topic) else {
            continue;
        };

        let mut index = repo.cherry_pick_to_index(commit.id, head)?;
        let tree = if index.has_conflicts() {
            let original_parent = commit
                .parents
                .first()
                .copied()
                .unwrap_or(commit.id);
            merge_blobs.resolve_index(
                &mut index,
                ConflictContext {
                    base,
                    original_parent,
                    closure_topics: &closure_topics,
                },
            )?
        } else {
            let tree_oid = index.write_tree_to(repo.raw())?;
            ObjectId::from_git2(tree_oid)
        };

        let retain_tag = match retention {
            TagRetention::All => true,
            TagRetention::Dependencies => topic != target_topic,
            TagRetention::None => false,
        } || keep_tag;

        let message = if retain_tag {
            commit.full_message.to_string()
        } else {
            render_message(commit)
        };

        head = repo.create_commit(
            tree,
            &[head],
            &commit.author,
            &commit.committer,
            &message,
        )?;
        commit_count += 1;
    }

    let ref_name = format!("refs/heads/{target_topic}");
    if repo.ref_lookup(&ref_name)?.is_none() {
        repo.ref_update(&ref_name, base, "git-branchstack create")?;
    }
    let previous = repo.ref_lookup(&ref_name)?;
    if previous != Some(head) {
        repo.ref_update(&ref_name, head, "git-branchstack rewrite")?;
        println!(
            "{target_topic}: {} -> {}",
            previous
                .map(|oid| oid.short())
                .unwrap_or_else(|| "(none)".to_string()),
            head.short()
        );
    }

    Ok(ReplayResult {
        topic: target_topic.to_string(),
        head,
        previous,
        commit_count,
    })
}

fn render_message(commit: &CommitRecord) -> String {
    let body = commit.body();
    if body.is_empty() {
        commit.trimmed_subject.to_string()
    } else {
        format!("{}\n\n{}", commit.trimmed_subject, body)
    }
}
