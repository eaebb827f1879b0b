//! The Branch Cache: a flat `<topic> <oid>` file that lets a run detect
//! whether a generated branch was touched by something other than this
//! tool since the last time it wrote it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::instrument;

use crate::error::BranchstackError;
use crate::git::{ObjectId, Repo};

const CACHE_FILE_NAME: &str = "branchstack-cache";

fn cache_path(repo: &Repo) -> PathBuf {
    repo.private_dir().join(CACHE_FILE_NAME)
}

fn read_cache(path: &Path) -> eyre::Result<IndexMap<String, ObjectId>> {
    let mut entries = IndexMap::new();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
        Err(err) => return Err(err.into()),
    };
    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        let (Some(topic), Some(oid)) = (parts.next(), parts.next()) else {
            continue;
        };
        entries.insert(topic.to_string(), oid.parse()?);
    }
    Ok(entries)
}

fn write_cache(path: &Path, entries: &IndexMap<String, ObjectId>) -> eyre::Result<()> {
    let mut contents = String::new();
    for (topic, oid) in entries {
        contents.push_str(topic);
        contents.push(' ');
        contents.push_str(&oid.to_string());
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Check the on-disk cache against `refs/heads/<topic>` for every topic this
/// run is about to (re)generate. Aborts with [`BranchstackError::BranchWasModified`]
/// if a branch's current tip disagrees with what we last wrote for it,
/// unless `force` is set.
///
/// A topic whose cached entry has no corresponding reference anymore is
/// tolerated: the branch was deleted and this run will simply recreate it.
#[instrument(skip(repo, topics_this_run))]
pub fn validate_cache(
    repo: &Repo,
    topics_this_run: &HashSet<String>,
    force: bool,
) -> eyre::Result<()> {
    let cached = read_cache(&cache_path(repo))?;
    for (topic, cached_oid) in &cached {
        if !topics_this_run.contains(topic) {
            continue;
        }
        let Some(current_oid) = repo.ref_lookup(&format!("refs/heads/{topic}"))? else {
            continue;
        };
        if current_oid != *cached_oid {
            if force {
                println!("Warning: branch '{topic}' was modified; overwriting due to --force.");
                continue;
            }
            return Err(BranchstackError::branch_was_modified(topic.clone()).into());
        }
    }
    Ok(())
}

/// Merges `updates` (the topics actually (re)written by this run) into the
/// on-disk cache. Topics only on disk are carried over unchanged; topics in
/// both take the new oid. Intended to be driven through [`CacheUpdateGuard`]
/// so it always runs, even when replay fails partway through.
#[instrument(skip(repo, updates))]
pub fn update_cache(repo: &Repo, updates: &IndexMap<String, ObjectId>) -> eyre::Result<()> {
    let path = cache_path(repo);
    let mut merged = read_cache(&path)?;
    for (topic, oid) in updates {
        merged.insert(topic.clone(), *oid);
    }
    write_cache(&path, &merged)
}

/// RAII guard pairing the replay loop's per-topic writes with a guaranteed
/// cache flush on drop, mirroring the reference implementation's
/// `try/finally` around `update_cache`. Call [`CacheUpdateGuard::record`] as
/// each topic finishes replaying; the accumulated map is written to disk
/// when the guard is dropped, whether that happens via normal completion or
/// via an early return from an error.
pub struct CacheUpdateGuard<'a> {
    repo: &'a Repo,
    updates: IndexMap<String, ObjectId>,
}

impl<'a> CacheUpdateGuard<'a> {
    pub fn new(repo: &'a Repo) -> Self {
        Self {
            repo,
            updates: IndexMap::new(),
        }
    }

    pub fn record(&mut self, topic: impl Into<String>, oid: ObjectId) {
        self.updates.insert(topic.into(), oid);
    }
}

impl Drop for CacheUpdateGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = update_cache(self.repo, &self.updates) {
            tracing::warn!(error = %err, "failed to persist branch cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        let mut entries = IndexMap::new();
        entries.insert(
            "a".to_string(),
            "0000000000000000000000000000000000000001"
                .parse()
                .unwrap(),
        );
        entries.insert(
            "b".to_string(),
            "0000000000000000000000000000000000000002"
                .parse()
                .unwrap(),
        );
        write_cache(&path, &entries).unwrap();
        let read_back = read_cache(&path).unwrap();
        assert_eq!(read_back, entries);
    }

    #[test]
    fn test_read_missing_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist");
        assert!(read_cache(&path).unwrap().is_empty());
    }
}
