//! Tools for interfacing with the Git repository: a `git2`-backed gateway
//! for object/reference access plus a subprocess-backed gateway for the
//! handful of ancillary queries (`merge-base`, `merge-file`, ...) that
//! don't have a convenient `git2` binding.

mod commit;
mod config;
mod oid;
mod repo;
mod run;

pub use commit::{CommitRecord, Identity, ParentEdge};
pub use config::{
    get_editor_command, get_subject_prefix_prefix, get_subject_prefix_suffix,
    DEFAULT_SUBJECT_PREFIX_PREFIX, DEFAULT_SUBJECT_PREFIX_SUFFIX,
};
pub use oid::ObjectId;
pub use repo::Repo;
pub use run::{GitRunInfo, GitRunResult};
