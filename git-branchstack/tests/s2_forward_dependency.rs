//! S2 from the specification's testable-properties section: a commit whose
//! tag declares a forward dependency on another topic pulls that topic's
//! commits onto its own branch ahead of its own, with both tags stripped
//! under the default (no-retention) policy.

use assert_cmd::Command;
use branchstack::testing::GitWrapper;

#[test]
fn test_forward_dependency() -> eyre::Result<()> {
    let git = GitWrapper::init()?;
    let base = git.run(&["rev-parse", "HEAD"])?;
    git.commit("b", "[b] subject b")?;
    git.commit("a", "[a:b] subject a")?;

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD")])
        .assert()
        .success();

    assert_eq!(
        git.branch_subjects("a")?,
        vec!["subject b", "subject a"]
    );
    assert_eq!(git.branch_subjects("b")?, vec!["subject b"]);

    Ok(())
}
