use crate::common::file::{FileSpec, write_file};
use crate::common::redirect_temp_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    redirect_temp_dir();
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_kit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    let file1 = FileSpec::new(repository_dir.path().join("1.txt"), "one".to_string());
    write_file(file1);

    let file2 = FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    );
    write_file(file2);

    let file3 = FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    );
    write_file(file3);

    run_kit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    kit_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_kit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("kit").expect("Failed to find kit binary");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn kit_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_kit_command(dir, &["commit", message]);
    cmd.envs(vec![
        ("KIT_AUTHOR_NAME", &"fake_user".to_string()),
        ("KIT_AUTHOR_EMAIL", &"fake_email@email.com".to_string()),
        ("KIT_AUTHOR_DATE", &"2023-01-01 12:00:00 +0000".to_string()), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

/// Get the current HEAD commit hash, following a symbolic HEAD
pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let head_path = dir.join(".kit").join("HEAD");
    let head_content = std::fs::read_to_string(head_path)?;

    // HEAD contains either a commit hash or a ref like "ref: refs/heads/master"
    if let Some(ref_path) = head_content.strip_prefix("ref: ") {
        let ref_file = dir.join(".kit").join(ref_path.trim());
        let commit_sha = std::fs::read_to_string(ref_file)?;
        Ok(commit_sha.trim().to_string())
    } else {
        Ok(head_content.trim().to_string())
    }
}

/// Read the commit hash a branch points at
pub fn get_branch_commit_sha(
    dir: &Path,
    branch: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let branch_path = dir.join(".kit").join("refs").join("heads").join(branch);
    Ok(std::fs::read_to_string(branch_path)?.trim().to_string())
}

/// Get the parent commit hash of a given commit by scraping cat-file output
pub fn get_parent_commit_id(
    dir: &Path,
    commit_id: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let output = run_kit_command(dir, &["cat-file", "-p", commit_id]).output()?;

    let stdout = String::from_utf8(output.stdout)?;

    for line in stdout.lines() {
        if let Some(oid) = line.strip_prefix("parent ") {
            return Ok(Some(oid.to_string()));
        }
    }

    Ok(None)
}

/// Get the root tree hash recorded in a commit
pub fn get_commit_tree_id(
    dir: &Path,
    commit_id: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = run_kit_command(dir, &["cat-file", "-p", commit_id]).output()?;

    let stdout = String::from_utf8(output.stdout)?;

    for line in stdout.lines() {
        if let Some(oid) = line.strip_prefix("tree ") {
            return Ok(oid.to_string());
        }
    }

    Err("No tree found in commit".into())
}
