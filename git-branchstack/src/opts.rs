//! Command-line surface for `git-branchstack`, per §6 of the specification.

use clap::Parser;

use branchstack::error::BranchstackError;
use branchstack::replay::TagRetention;

/// Create branches for commits in a tagged commit range whose subject
/// begins with `[<topic>]`.
#[derive(Parser, Debug)]
#[command(name = "git-branchstack", version, about)]
pub struct Opts {
    /// Restrict produced branches to these topics. Empty means "all topics
    /// found in the scanned range".
    pub topics: Vec<String>,

    /// Overwrite branches that were modified since the last run of this
    /// tool, instead of aborting.
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Retain original subject tags on replayed commits. Bare `-k` means
    /// `dependencies`; `--keep-tags=all` retains every tag. Validated by
    /// hand in [`parse_keep_tags`] rather than through clap's own
    /// `value_enum` machinery, so an invalid value exits 1 with our own
    /// diagnostic instead of clap's exit code 2.
    #[arg(
        short = 'k',
        long = "keep-tags",
        num_args = 0..=1,
        default_missing_value = "dependencies"
    )]
    pub keep_tags: Option<String>,

    /// Use this commit range (`<a>..<b>`) instead of `@{upstream}..HEAD`.
    #[arg(short = 'r', long = "range", value_name = "a..b")]
    pub range: Option<String>,

    /// Increase log verbosity. Repeatable.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Validate `--keep-tags`'s argument, per §6: anything other than
/// `dependencies` or `all` is an error, not a clap usage failure. Mirrors
/// the reference implementation's explicit check (`main.py`, `main()`)
/// rather than delegating to an enum derive.
pub fn parse_keep_tags(spec: &str) -> eyre::Result<TagRetention> {
    match spec {
        "dependencies" => Ok(TagRetention::Dependencies),
        "all" => Ok(TagRetention::All),
        _ => Err(BranchstackError::ValueError(
            "argument to --keep-tags must be one of 'dependencies' (the default) or 'all'"
                .to_string(),
        )
        .into()),
    }
}

/// Split a `--range` value on its `..`, rejecting anything else.
pub fn parse_range(spec: &str) -> eyre::Result<(String, String)> {
    match spec.split_once("..") {
        Some((base, tip)) if !base.is_empty() && !tip.is_empty() => {
            Ok((base.to_string(), tip.to_string()))
        }
        _ => Err(branchstack::error::BranchstackError::InvalidRange {
            spec: spec.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let (base, tip) = parse_range("main..topic").unwrap();
        assert_eq!(base, "main");
        assert_eq!(tip, "topic");
    }

    #[test]
    fn test_parse_range_missing_dots() {
        assert!(parse_range("main").is_err());
    }
}
