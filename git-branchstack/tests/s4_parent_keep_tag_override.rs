//! S4 from the specification's testable-properties section: a `+parent`
//! edge (rather than a plain `:parent`) retains that dependency's tag even
//! under the default (strip-everything) retention policy.

use assert_cmd::Command;
use branchstack::testing::GitWrapper;

#[test]
fn test_parent_keep_tag_override() -> eyre::Result<()> {
    let git = GitWrapper::init()?;
    let base = git.run(&["rev-parse", "HEAD"])?;
    git.commit("b", "[b] subject b")?;
    git.commit("a", "[a:+b] subject a")?;

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD")])
        .assert()
        .success();

    assert_eq!(
        git.branch_subjects("a")?,
        vec!["[b] subject b", "subject a"]
    );

    Ok(())
}
