#![allow(dead_code)]

pub mod command;
pub mod file;

const TMPDIR: &str = "target/playground";

/// Count the object files stored under `.kit/objects`
pub fn count_objects(dir: &std::path::Path) -> usize {
    walkdir::WalkDir::new(dir.join(".kit").join("objects"))
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .count()
}

pub fn redirect_temp_dir() {
    unsafe {
        std::env::set_var("TMPDIR", TMPDIR);
    }

    // Ensure the TMPDIR exists
    if !std::path::Path::new(TMPDIR).exists() {
        std::fs::create_dir_all(TMPDIR).expect("Failed to create TMPDIR");
    }
}
