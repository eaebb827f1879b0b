//! Walks a commit range and produces the [`CommitRecord`] list (and, in
//! `reverse` direction, the [`DependencyGraph`]) that every downstream
//! component builds on.

use indexmap::IndexMap;
use tracing::instrument;

use crate::git::{CommitRecord, ObjectId, Repo};
use crate::parser::parse_subject;

/// Which way the scan walks the range. This mirrors the reference
/// implementation's use of `git log`'s `--reverse` flag and, with it, the
/// two jobs the scanner is asked to do:
///
/// - `Reverse` walks the range oldest-first (chronological replay order),
///   drops untagged commits, and builds the [`DependencyGraph`]. This is
///   the scan the Orchestrator runs to discover topics.
/// - `Forward` walks the range newest-first (`git log`'s default order),
///   keeps untagged commits, and builds no graph. This is the scan the
///   Conflict Diagnostic runs to list candidate missing dependencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// An insertion-ordered mapping from topic name to its insertion-ordered
/// declared-parent map (parent topic name -> `keep_tag`), per the Data
/// Model's `DependencyGraph` definition. `IndexMap` rather than a plain hash
/// map so that iteration order is deterministic across runs against
/// identical input.
pub type DependencyGraph = IndexMap<String, IndexMap<String, bool>>;

/// The result of a single [`scan_range`] call.
pub struct ScanResult {
    pub commits: Vec<CommitRecord>,
    /// Only populated for [`Direction::Reverse`].
    pub graph: DependencyGraph,
}

/// Walk `base..tip` and emit `CommitRecord`s with subject tags already
/// parsed, in the VCS's linear traversal order for `direction`.
#[instrument(skip(repo))]
pub fn scan_range(
    repo: &Repo,
    base: ObjectId,
    tip: ObjectId,
    direction: Direction,
) -> eyre::Result<ScanResult> {
    let prefix = crate::git::get_subject_prefix_prefix(repo)?;
    let suffix = crate::git::get_subject_prefix_suffix(repo)?;
    let include_others = direction == Direction::Forward;

    let mut ids = repo.commit_range(base, tip)?;
    if direction == Direction::Reverse {
        ids.reverse();
    }

    let mut commits = Vec::with_capacity(ids.len());
    let mut graph = DependencyGraph::new();

    for id in ids {
        let mut record = repo.find_commit(id)?;
        let parsed = parse_subject(
            record.raw_subject.as_slice(),
            prefix.as_bytes(),
            suffix.as_bytes(),
        );
        record.topic = parsed.topic.clone();
        record.declared_parents = parsed.parents.clone();
        record.trimmed_subject = parsed.trimmed_subject;

        // An explicit empty tag (`Some("")`) is falsy for this purpose too:
        // the reference implementation's `if not topic:` treats "no tag" and
        // "tagged with the empty string" the same way when deciding whether
        // a commit takes part in the topic scan. The distinction between the
        // two survives on the record itself (`None` vs `Some("")`) for
        // display purposes elsewhere, e.g. the Conflict Diagnostic's
        // candidate listing.
        let is_tagged = record.topic.as_deref().is_some_and(|topic| !topic.is_empty());
        if !is_tagged {
            if include_others {
                commits.push(record);
            }
            continue;
        }

        if direction == Direction::Reverse {
            let topic = record.topic.clone().expect("checked above");
            let parents = graph.entry(topic).or_default();
            for edge in &record.declared_parents {
                parents.entry(edge.topic.clone()).or_insert(edge.keep_tag);
            }
        }

        commits.push(record);
    }

    Ok(ScanResult { commits, graph })
}
