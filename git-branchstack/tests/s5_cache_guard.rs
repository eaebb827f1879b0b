//! S5 from the specification's testable-properties section: once a branch
//! has been produced, moving it out from under the cache aborts the next
//! run unless `--force` is given, and `--force` simply overwrites it back
//! to this run's output.

use assert_cmd::Command;
use branchstack::testing::GitWrapper;

#[test]
fn test_cache_guard() -> eyre::Result<()> {
    let git = GitWrapper::init()?;
    let base = git.run(&["rev-parse", "HEAD"])?;
    git.commit("a", "[a] a1")?;
    git.commit("b", "[b] b1")?;

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD")])
        .assert()
        .success();

    let expected_a = git.run(&["rev-parse", "refs/heads/a"])?;

    // Move `a` out from under the cache by committing directly onto it.
    git.run(&["checkout", "-q", "a"])?;
    git.commit_file("intruder.txt", "intruder", "not produced by the tool")?;
    git.run(&["checkout", "-q", "main"])?;

    let output = Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD")])
        .output()?;
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("modified"), "stderr was: {stderr}");
    // The branch should not have been touched by the rejected run.
    assert_ne!(git.run(&["rev-parse", "refs/heads/a"])?, expected_a);

    Command::cargo_bin("git-branchstack")?
        .current_dir(&git.path)
        .args(["-r", &format!("{base}..HEAD"), "--force"])
        .assert()
        .success();
    assert_eq!(git.run(&["rev-parse", "refs/heads/a"])?, expected_a);

    Ok(())
}
