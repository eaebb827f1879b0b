//! S6 from the specification's testable-properties section: the subject
//! tag's prefix/suffix delimiters are configurable, and a dependency edge
//! declared through a custom suffix still builds the expected closure.

use assert_cmd::Command;
use branchstack::testing::GitWrapper;

#[test]
fn test_custom_affixes() -> eyre::Result<()> {
    let git = GitWrapper::init()?;
    git.run(&["config", "branchstack.subjectPrefixPrefix", ""])?;
    git.run(&["config", "branchstack.subjectPrefixSuffix", ":"])?;

    let base = git.run(&["rev-parse", "HEAD"])?;
    git.commit("a", "a: a1")?;
    git.commit("b", "b: b1")?;
    git.commit("b", "b: b2")?;
    git.commit("a", "a: a2")?;
    git.commit("c", "c:a: c1")?;

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD")])
        .assert()
        .success();

    assert_eq!(git.branch_subjects("a")?, vec!["a1", "a2"]);
    assert_eq!(git.branch_subjects("b")?, vec!["b1", "b2"]);
    assert_eq!(git.branch_subjects("c")?, vec!["a1", "a2", "c1"]);

    Ok(())
}
