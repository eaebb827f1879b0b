//! S1 from the specification's testable-properties section: commits tagged
//! with distinct topics land on distinct branches; untagged and
//! explicit-empty-tag commits land on none.

use assert_cmd::Command;
use branchstack::testing::GitWrapper;

#[test]
fn test_basic_grouping() -> eyre::Result<()> {
    let git = GitWrapper::init()?;
    let base = git.run(&["rev-parse", "HEAD"])?;
    git.commit("a", "[a] a1")?;
    git.commit("b", "[b] b1")?;
    git.commit("wip1", "WIP commit")?;
    git.commit("a", "[a] a2")?;
    git.commit("wip2", "[] a3")?;
    git.commit("wip3", "another WIP commit")?;

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD")])
        .assert()
        .success();

    assert_eq!(git.branch_subjects("a")?, vec!["a1", "a2"]);
    assert_eq!(git.branch_subjects("b")?, vec!["b1"]);
    assert!(git.run(&["rev-parse", "--verify", "refs/heads/a3"]).is_err());

    Ok(())
}
