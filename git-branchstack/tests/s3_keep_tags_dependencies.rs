//! S3 from the specification's testable-properties section: with
//! `--keep-tags=dependencies`, a replayed commit keeps its original subject
//! tag unless its topic is the branch currently being produced.

use assert_cmd::Command;
use branchstack::testing::GitWrapper;

#[test]
fn test_keep_tags_dependencies() -> eyre::Result<()> {
    let git = GitWrapper::init()?;
    let base = git.run(&["rev-parse", "HEAD"])?;
    git.commit("b", "[b] subject b")?;
    git.commit("a", "[a:b] subject a")?;

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD"), "-k"])
        .assert()
        .success();

    assert_eq!(
        git.branch_subjects("a")?,
        vec!["[b] subject b", "subject a"]
    );

    Ok(())
}
