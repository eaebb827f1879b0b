//! Drives a full run: resolves the commit range and base, scans it,
//! restricts to the requested topics, and replays each one in turn.

use std::collections::HashSet;

use itertools::Itertools;
use tracing::instrument;

use branchstack::cache::{validate_cache, CacheUpdateGuard};
use branchstack::conflict::MergeBlobs;
use branchstack::error::BranchstackError;
use branchstack::git::{get_editor_command, GitRunInfo, ObjectId, Repo};
use branchstack::replay::{replay_topic, TagRetention};
use branchstack::resolve::closure;
use branchstack::scan::{scan_range, Direction};

use crate::opts::Opts;

/// Run the tool end to end. Returns `Ok(())` on success; errors from the
/// closed §7 error set are returned as-is so `main` can print a one-line
/// diagnostic instead of a full report.
#[instrument(skip(repo, git_run, opts))]
pub fn run(repo: &Repo, git_run: &GitRunInfo, opts: &Opts) -> eyre::Result<()> {
    let (base_rev, tip_rev, current_branch) =
        resolve_range(repo, git_run, opts.range.as_deref())?;
    let base = ObjectId::from_git2(git2::Oid::from_str(
        &git_run.merge_base(&base_rev, &tip_rev)?,
    )?);
    let tip = ObjectId::from_git2(git2::Oid::from_str(&git_run.rev_parse(&tip_rev)?)?);

    let scan = scan_range(repo, base, tip, Direction::Reverse)?;

    let mut topics_in_scan_order: Vec<String> = Vec::new();
    for commit in &scan.commits {
        if let Some(topic) = &commit.topic {
            if !topics_in_scan_order.contains(topic) {
                topics_in_scan_order.push(topic.clone());
            }
        }
    }

    let requested_topics: Vec<String> = if opts.topics.is_empty() {
        topics_in_scan_order.clone()
    } else {
        for topic in &opts.topics {
            if !topics_in_scan_order.contains(topic) {
                return Err(BranchstackError::topic_not_found(topic.clone(), base, &tip_rev).into());
            }
        }
        opts.topics
            .iter()
            .sorted_by_key(|topic| {
                topics_in_scan_order
                    .iter()
                    .position(|found| found == *topic)
            })
            .cloned()
            .collect()
    };

    if let Some(current_branch) = &current_branch {
        if requested_topics.contains(current_branch) {
            return Err(eyre::eyre!(
                "refusing to overwrite current branch {current_branch}"
            ));
        }
    }

    let all_topics: HashSet<String> = topics_in_scan_order.iter().cloned().collect();
    for topic in &requested_topics {
        if let Some(parents) = scan.graph.get(topic) {
            for parent in parents.keys() {
                if !all_topics.contains(parent) {
                    eprintln!(
                        "Warning: topic '{topic}' depends on missing topic '{parent}'."
                    );
                }
            }
        }
    }

    let retention = match &opts.keep_tags {
        Some(spec) => crate::opts::parse_keep_tags(spec)?,
        None => TagRetention::None,
    };
    let topics_this_run: HashSet<String> = requested_topics.iter().cloned().collect();
    validate_cache(repo, &topics_this_run, opts.force)?;

    let editor = get_editor_command(repo)?;
    let mut guard = CacheUpdateGuard::new(repo);
    for topic in &requested_topics {
        let topic_closure = closure(&scan.graph, topic, false);
        let merge_blobs = MergeBlobs::new(repo, git_run, editor.clone());
        let result = replay_topic(
            repo,
            &merge_blobs,
            topic,
            &topic_closure,
            &scan.commits,
            base,
            retention,
        )?;
        guard.record(topic, result.head);
    }
    drop(guard);

    for topic in &requested_topics {
        println!("{}", console::style(topic).bold());
        let range = format!("{base}..refs/heads/{topic}");
        let log = git_run
            .run(&["log", range.as_str(), "--oneline"])
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        for line in log.lines() {
            println!("\t{}", console::style(line).dim());
        }
    }

    Ok(())
}

/// DWIM the working branch and base: an in-progress rebase wins, then an
/// explicit `--range`, then the current branch's upstream. The tip of the
/// range is always `HEAD`; the "current branch" is only tracked so the
/// caller can refuse to overwrite it.
///
/// Returns `(base_rev, tip_rev, current_branch)`.
fn resolve_range(
    repo: &Repo,
    git_run: &GitRunInfo,
    explicit_range: Option<&str>,
) -> eyre::Result<(String, String, Option<String>)> {
    if let Some(spec) = explicit_range {
        let (base, tip) = crate::opts::parse_range(spec)?;
        return Ok((base, tip, None));
    }

    if let Some(rebase_dir) = repo.rebase_merge_dir() {
        let onto = std::fs::read_to_string(rebase_dir.join("onto"))?
            .trim()
            .to_string();
        let head_name = std::fs::read_to_string(rebase_dir.join("head-name"))
            .ok()
            .map(|s| {
                s.trim()
                    .rsplit('/')
                    .next()
                    .unwrap_or(s.trim())
                    .to_string()
            });
        return Ok((onto, "HEAD".to_string(), head_name));
    }

    let branch = git_run
        .current_branch_name()?
        .ok_or_else(|| eyre::eyre!("not currently on a branch"))?;
    let upstream = format!("{branch}@{{upstream}}");
    Ok((upstream, "HEAD".to_string(), Some(branch)))
}
