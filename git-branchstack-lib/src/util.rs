//! Utility types shared across the crate.

use std::fmt::Display;

use crate::error::BranchstackError;

/// Represents the code to exit the process with.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode(0))
    }
}

impl Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self(code) = self;
        write!(f, "exit code {code}")
    }
}

impl std::error::Error for ExitCode {}

/// Helper type for situations where we might return any normal error
/// (wrapped by `eyre::Result`) or a known, already-diagnosed `ExitCode`.
pub type EyreExitOr<T> = eyre::Result<Result<T, ExitCode>>;

/// All of the closed-set [`BranchstackError`] variants exit with status 1,
/// per §6/§9 of the specification (including `TopicNotFound`, which the
/// reference implementation left at exit 0 -- treated here as a bug fix).
pub fn exit_code_for(_err: &BranchstackError) -> ExitCode {
    ExitCode(1)
}
