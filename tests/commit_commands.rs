use assert_cmd::Command;
use assert_fs::fixture::{FileWriteStr, PathChild};
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;

mod common;

use common::command::{
    get_branch_commit_sha, get_commit_tree_id, get_head_commit_sha, get_parent_commit_id,
    kit_commit, run_kit_command,
};

fn init_repo(dir: &assert_fs::TempDir) {
    Command::cargo_bin("kit")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

#[test]
fn write_commit_object_successfully_for_flat_project() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("a.txt").write_str("alpha")?;
    dir.child("b.txt").write_str("beta")?;

    run_kit_command(dir.path(), &["add", "."]).assert().success();

    kit_commit(dir.path(), "first commit")
        .assert()
        .success()
        .stdout(predicate::str::contains("(root-commit) "))
        .stdout(predicate::str::contains("first commit"));

    // the current branch now holds the commit, HEAD stays symbolic
    let head_content = std::fs::read_to_string(dir.child(".kit/HEAD").path())?;
    assert_eq!(head_content.trim(), "ref: refs/heads/master");

    let commit_sha = get_branch_commit_sha(dir.path(), "master")?;
    assert_eq!(commit_sha.len(), 40);

    // the commit payload records tree, author and message
    let output = run_kit_command(dir.path(), &["cat-file", "-p", &commit_sha]).output()?;
    let commit_text = String::from_utf8(output.stdout)?;
    assert!(commit_text.starts_with("tree "));
    assert!(commit_text.contains("author fake_user <fake_email@email.com>"));
    assert!(commit_text.contains("first commit"));

    Ok(())
}

#[test]
fn following_parents_reaches_every_ancestor_in_order() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    let mut commit_shas = Vec::new();
    for n in 1..=3 {
        dir.child(format!("file{n}.txt"))
            .write_str(&format!("content {n}"))?;
        run_kit_command(dir.path(), &["add", "."]).assert().success();
        kit_commit(dir.path(), &format!("commit {n}"))
            .assert()
            .success();
        commit_shas.push(get_head_commit_sha(dir.path())?);
    }

    // walk the parent chain from the tip back to the root commit
    let mut walked = vec![commit_shas[2].clone()];
    let mut current = commit_shas[2].clone();
    while let Some(parent) = get_parent_commit_id(dir.path(), &current)? {
        walked.push(parent.clone());
        current = parent;
    }

    let mut expected = commit_shas.clone();
    expected.reverse();
    assert_eq!(walked, expected);

    Ok(())
}

#[test]
fn committing_an_empty_index_fails() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    kit_commit(dir.path(), "empty")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to commit"));

    Ok(())
}

#[test]
fn committing_an_unchanged_tree_fails() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("stable content")?;
    run_kit_command(dir.path(), &["add", "."]).assert().success();
    kit_commit(dir.path(), "first").assert().success();

    // nothing changed since the last commit
    kit_commit(dir.path(), "again")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to commit"));

    Ok(())
}

#[test]
fn commit_records_the_author_flag() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("content")?;
    run_kit_command(dir.path(), &["add", "."]).assert().success();

    run_kit_command(
        dir.path(),
        &["commit", "authored", "--author", "Jane Doe <jane@example.com>"],
    )
    .assert()
    .success();

    let commit_sha = get_head_commit_sha(dir.path())?;
    let output = run_kit_command(dir.path(), &["cat-file", "-p", &commit_sha]).output()?;
    let commit_text = String::from_utf8(output.stdout)?;
    assert!(commit_text.contains("author Jane Doe <jane@example.com>"));

    Ok(())
}

#[test]
fn identical_snapshots_produce_identical_tree_hashes() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();

    // stage the same (path, content) set in two repositories, in opposite
    // order, and compare the root tree hashes of the resulting commits
    let build = |paths: &[(&str, &str)]| -> Result<String, Box<dyn std::error::Error>> {
        let dir = assert_fs::TempDir::new()?;
        init_repo(&dir);

        for &(path, content) in paths {
            let file = dir.child(path);
            file.write_str(content)?;
            run_kit_command(dir.path(), &["add", path]).assert().success();
        }

        kit_commit(dir.path(), "snapshot").assert().success();
        let commit_sha = get_head_commit_sha(dir.path())?;
        Ok(get_commit_tree_id(dir.path(), &commit_sha)?)
    };

    let forward = build(&[
        ("a.txt", "one"),
        ("dir/b.txt", "two"),
        ("dir/sub/c.txt", "three"),
    ])?;
    let backward = build(&[
        ("dir/sub/c.txt", "three"),
        ("dir/b.txt", "two"),
        ("a.txt", "one"),
    ])?;

    assert_eq!(forward, backward);

    Ok(())
}

#[test]
fn commit_on_detached_head_advances_head_only() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("base")?;
    run_kit_command(dir.path(), &["add", "."]).assert().success();
    kit_commit(dir.path(), "base commit").assert().success();
    let base_sha = get_head_commit_sha(dir.path())?;

    // detach HEAD at the base commit
    run_kit_command(dir.path(), &["checkout", &base_sha])
        .assert()
        .success();

    dir.child("detached.txt").write_str("experimental")?;
    run_kit_command(dir.path(), &["add", "detached.txt"])
        .assert()
        .success();
    kit_commit(dir.path(), "detached commit").assert().success();

    // HEAD moved to the new commit, the branch did not
    let head_content = std::fs::read_to_string(dir.child(".kit/HEAD").path())?;
    let new_sha = head_content.trim().to_string();
    assert_ne!(new_sha, base_sha);
    assert!(!new_sha.starts_with("ref: "));

    let master_sha = get_branch_commit_sha(dir.path(), "master")?;
    assert_eq!(master_sha, base_sha);

    // the detached commit's parent is where HEAD was detached
    assert_eq!(
        get_parent_commit_id(dir.path(), &new_sha)?,
        Some(base_sha)
    );

    Ok(())
}
