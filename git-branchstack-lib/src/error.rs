//! The closed set of error kinds that the Orchestrator knows how to render
//! as a single diagnostic line and map to a process exit code. Anything
//! that doesn't fit one of these variants should instead propagate as
//! `eyre::Report` with `.wrap_err(..)` context; see `util::EyreExitOr`.

use thiserror::Error;

use crate::git::ObjectId;

/// Errors produced by the core engine that the CLI front-end is expected to
/// catch, print a one-line diagnostic for, and translate into an exit code.
#[derive(Debug, Error)]
pub enum BranchstackError {
    /// A generated branch was modified since the last run and `--force` was
    /// not given.
    #[error("generated branch {topic} has been modified. Use --force to overwrite.")]
    BranchWasModified { topic: String },

    /// A topic named on the command line via positional arguments was not
    /// found anywhere in the scanned commit range.
    #[error("topic '{topic}' not found {base}..{tip}")]
    TopicNotFound {
        topic: String,
        base: String,
        tip: String,
    },

    /// `--range` was given a value without a `..`.
    #[error("invalid commit range: {spec} should be a valid \"a..b\" range")]
    InvalidRange { spec: String },

    /// The user declined to resolve a merge conflict, or marked their
    /// resolution as unsuccessful.
    #[error("merge conflict: {reason}")]
    MergeConflict { reason: String },

    /// The external editor exited non-zero or produced no usable output.
    #[error("editor error: {0}")]
    EditorError(String),

    /// A Git subprocess exited with a non-zero status.
    #[error("subprocess exited with non-zero status: {0}")]
    CalledProcessError(i32),

    /// Malformed data read back from the VCS (unparseable log entry,
    /// non-UTF-8 where UTF-8 was required, and so on).
    #[error("invalid value: {0}")]
    ValueError(String),
}

impl BranchstackError {
    pub fn branch_was_modified(topic: impl Into<String>) -> Self {
        Self::BranchWasModified {
            topic: topic.into(),
        }
    }

    pub fn topic_not_found(topic: impl Into<String>, base: ObjectId, tip: &str) -> Self {
        Self::TopicNotFound {
            topic: topic.into(),
            base: base.to_string(),
            tip: tip.to_string(),
        }
    }
}
