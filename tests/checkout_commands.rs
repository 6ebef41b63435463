use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

mod common;

use common::command::{get_branch_commit_sha, get_head_commit_sha, kit_commit, run_kit_command};
use common::file::{FileSpec, write_file};

/// Create a repository with multiple commits and branches for checkout testing
#[fixture]
pub fn repository_with_branches() -> TempDir {
    common::redirect_temp_dir();
    let repository_dir = TempDir::new().expect("Failed to create temp dir");

    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    // First commit - create initial files
    write_file(FileSpec::new(
        repository_dir.path().join("file1.txt"),
        "initial content 1".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("file2.txt"),
        "initial content 2".to_string(),
    ));

    run_kit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    kit_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    // Second commit - modify file1 and add file3
    write_file(FileSpec::new(
        repository_dir.path().join("file1.txt"),
        "modified content 1".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("file3.txt"),
        "new content 3".to_string(),
    ));

    run_kit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    kit_commit(repository_dir.path(), "Second commit")
        .assert()
        .success();

    // Create feature branch at this point
    run_kit_command(repository_dir.path(), &["branch", "feature"])
        .assert()
        .success();

    // Third commit - modify file2
    write_file(FileSpec::new(
        repository_dir.path().join("file2.txt"),
        "modified content 2".to_string(),
    ));

    run_kit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    kit_commit(repository_dir.path(), "Third commit")
        .assert()
        .success();

    repository_dir
}

#[rstest]
fn checkout_branch_successfully(
    repository_with_branches: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_branches;

    let feature_commit = get_branch_commit_sha(repository_dir.path(), "feature")?;

    // Verify initial workspace state (at third commit)
    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file1.txt"))?,
        "modified content 1"
    );
    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file2.txt"))?,
        "modified content 2"
    );

    // Checkout the feature branch (which is at the second commit)
    run_kit_command(repository_dir.path(), &["checkout", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to branch 'feature'"));

    // HEAD is symbolic on the feature branch, which resolves to its commit
    let head_content =
        std::fs::read_to_string(repository_dir.path().join(".kit").join("HEAD"))?;
    assert_eq!(head_content.trim(), "ref: refs/heads/feature");
    assert_eq!(get_head_commit_sha(repository_dir.path())?, feature_commit);

    // file1 keeps its second-commit content
    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file1.txt"))?,
        "modified content 1"
    );

    // file2 reverts to its initial content (modified only in the third commit)
    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file2.txt"))?,
        "initial content 2"
    );

    // file3 exists (added in the second commit)
    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file3.txt"))?,
        "new content 3"
    );

    Ok(())
}

#[rstest]
fn checkout_by_commit_sha_detaches_head(
    repository_with_branches: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_branches;

    let feature_commit = get_branch_commit_sha(repository_dir.path(), "feature")?;

    run_kit_command(repository_dir.path(), &["checkout", &feature_commit])
        .assert()
        .success()
        .stdout(predicate::str::contains("HEAD is now at"));

    // HEAD holds the bare hash now
    let head_content =
        std::fs::read_to_string(repository_dir.path().join(".kit").join("HEAD"))?;
    assert_eq!(head_content.trim(), feature_commit);

    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file2.txt"))?,
        "initial content 2"
    );

    Ok(())
}

#[rstest]
fn checkout_by_unambiguous_prefix(
    repository_with_branches: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_branches;

    let feature_commit = get_branch_commit_sha(repository_dir.path(), "feature")?;

    run_kit_command(repository_dir.path(), &["checkout", &feature_commit[..7]])
        .assert()
        .success();

    let head_content =
        std::fs::read_to_string(repository_dir.path().join(".kit").join("HEAD"))?;
    assert_eq!(head_content.trim(), feature_commit);

    Ok(())
}

#[rstest]
fn checkout_unknown_target_fails(
    repository_with_branches: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository_dir = repository_with_branches;

    run_kit_command(repository_dir.path(), &["checkout", "no-such-branch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    // the working directory is untouched
    assert_eq!(
        std::fs::read_to_string(repository_dir.path().join("file2.txt"))?,
        "modified content 2"
    );

    Ok(())
}

#[test]
fn checkout_recreates_the_staged_snapshot_exactly() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = TempDir::new()?;

    run_kit_command(dir.path(), &["init"]).assert().success();

    write_file(FileSpec::new(
        dir.path().join("a.txt"),
        "hello".to_string(),
    ));
    write_file(FileSpec::new(
        dir.path().join("dir").join("b.txt"),
        "world".to_string(),
    ));

    run_kit_command(dir.path(), &["add", "."]).assert().success();
    kit_commit(dir.path(), "first").assert().success();
    let first_commit = get_head_commit_sha(dir.path())?;

    // move on: drop dir/b.txt, add another file, commit
    std::fs::remove_dir_all(dir.path().join("dir"))?;
    write_file(FileSpec::new(
        dir.path().join("later.txt"),
        "later".to_string(),
    ));
    run_kit_command(dir.path(), &["add", "."]).assert().success();
    kit_commit(dir.path(), "second").assert().success();

    assert!(!dir.path().join("dir").exists());

    // going back must recreate dir/b.txt and remove later.txt
    run_kit_command(dir.path(), &["checkout", &first_commit])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt"))?, "hello");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("dir").join("b.txt"))?,
        "world"
    );
    assert!(!dir.path().join("later.txt").exists());

    Ok(())
}

#[test]
fn checkout_discards_uncommitted_changes_to_tracked_files()
-> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = TempDir::new()?;

    run_kit_command(dir.path(), &["init"]).assert().success();

    write_file(FileSpec::new(
        dir.path().join("file.txt"),
        "committed".to_string(),
    ));
    run_kit_command(dir.path(), &["add", "."]).assert().success();
    kit_commit(dir.path(), "base").assert().success();
    let base = get_head_commit_sha(dir.path())?;

    // local edit, never committed
    write_file(FileSpec::new(
        dir.path().join("file.txt"),
        "local edit".to_string(),
    ));

    run_kit_command(dir.path(), &["checkout", &base])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("file.txt"))?,
        "committed"
    );

    Ok(())
}

#[cfg(unix)]
#[test]
fn checkout_restores_the_executable_bit() -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    common::redirect_temp_dir();
    let dir = TempDir::new()?;

    run_kit_command(dir.path(), &["init"]).assert().success();

    let script_path = dir.path().join("run.sh");
    write_file(FileSpec::new(
        script_path.clone(),
        "#!/bin/sh\necho hi".to_string(),
    ));
    std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))?;

    run_kit_command(dir.path(), &["add", "run.sh"])
        .assert()
        .success();
    kit_commit(dir.path(), "add script").assert().success();
    let commit = get_head_commit_sha(dir.path())?;

    std::fs::remove_file(&script_path)?;

    run_kit_command(dir.path(), &["checkout", &commit])
        .assert()
        .success();

    let mode = std::fs::metadata(&script_path)?.permissions().mode();
    assert_ne!(mode & 0o111, 0, "executable bit was not restored");

    Ok(())
}
