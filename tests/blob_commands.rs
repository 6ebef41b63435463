use assert_cmd::Command;
use assert_fs::fixture::{FileWriteStr, PathChild};
use bytes::Bytes;
use predicates::prelude::predicate;
use std::collections::HashMap;

mod common;

use kit::artifacts::objects::blob::Blob;
use kit::artifacts::objects::object::Object;

fn init_repo(dir: &assert_fs::TempDir) {
    Command::cargo_bin("kit")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

fn blob_oid(content: &str) -> String {
    Blob::new(Bytes::copy_from_slice(content.as_bytes()), Default::default())
        .object_id()
        .unwrap()
        .as_ref()
        .to_string()
}

/// Two contents whose blob hashes collide on the first two characters
fn colliding_contents() -> (String, String) {
    let mut seen: HashMap<String, String> = HashMap::new();

    for i in 0.. {
        let content = format!("collision probe {i}");
        let prefix = blob_oid(&content)[..2].to_string();

        if let Some(previous) = seen.get(&prefix) {
            return (previous.clone(), content);
        }
        seen.insert(prefix, content);
    }

    unreachable!()
}

#[test]
fn hash_object_prints_the_content_hash() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("some content")?;

    let expected = blob_oid("some content");

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["hash-object", "file.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&expected));

    // without -w nothing is stored
    assert_eq!(common::count_objects(dir.path()), 0);

    Ok(())
}

#[test]
fn hash_object_with_write_stores_the_blob() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("some content")?;

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["hash-object", "-w", "file.txt"])
        .assert()
        .success();

    assert_eq!(common::count_objects(dir.path()), 1);

    // writing the same content again does not duplicate storage
    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["hash-object", "-w", "file.txt"])
        .assert()
        .success();

    assert_eq!(common::count_objects(dir.path()), 1);

    Ok(())
}

#[test]
fn cat_file_round_trips_blob_content() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("round trip me")?;

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["hash-object", "-w", "file.txt"])
        .assert()
        .success();

    let oid = blob_oid("round trip me");

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["cat-file", "-p", &oid])
        .assert()
        .success()
        .stdout(predicate::str::contains("round trip me"));

    Ok(())
}

#[test]
fn cat_file_resolves_an_unambiguous_prefix() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    dir.child("file.txt").write_str("only object")?;

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["hash-object", "-w", "file.txt"])
        .assert()
        .success();

    let oid = blob_oid("only object");

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["cat-file", "-p", &oid[..4]])
        .assert()
        .success()
        .stdout(predicate::str::contains("only object"));

    Ok(())
}

#[test]
fn cat_file_with_an_ambiguous_prefix_fails() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    let (first, second) = colliding_contents();
    let shared_prefix = blob_oid(&first)[..2].to_string();
    assert_eq!(shared_prefix, &blob_oid(&second)[..2]);

    dir.child("first.txt").write_str(&first)?;
    dir.child("second.txt").write_str(&second)?;

    for file in ["first.txt", "second.txt"] {
        Command::cargo_bin("kit")?
            .current_dir(dir.path())
            .args(["hash-object", "-w", file])
            .assert()
            .success();
    }

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["cat-file", "-p", &shared_prefix])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ambiguous"));

    Ok(())
}

#[test]
fn cat_file_with_an_unknown_hash_fails() -> Result<(), Box<dyn std::error::Error>> {
    common::redirect_temp_dir();
    let dir = assert_fs::TempDir::new()?;
    init_repo(&dir);

    Command::cargo_bin("kit")?
        .current_dir(dir.path())
        .args(["cat-file", "-p", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    Ok(())
}
