use std::fs;
use std::path::Path;

use tempfile::tempdir;

use asm_harvester::{infer_corpus_name, resolve_root, sha256_bytes};

// The current directory is process-global state, so every cwd-dependent
// assertion lives in this one test.
#[test]
fn resolve_root_resolves_relative_paths_against_the_cwd() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let nested = tmp.path().join("nested");
    fs::create_dir_all(&nested).expect("create nested dir");

    std::env::set_current_dir(tmp.path()).expect("chdir into tempdir");

    let dot = resolve_root(".").expect("resolve dot");
    assert_eq!(
        dot.canonicalize().expect("canonicalize dot"),
        tmp.path().canonicalize().expect("canonicalize tmp")
    );

    let existing = resolve_root("nested").expect("resolve nested");
    assert_eq!(existing, nested.canonicalize().expect("canonicalize nested"));

    // A path that does not exist yet still comes back absolute.
    let missing = resolve_root("not-created-yet").expect("resolve missing");
    assert!(missing.is_absolute());
    assert!(missing.ends_with("not-created-yet"));

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn corpus_name_comes_from_the_last_path_component() {
    assert_eq!(infer_corpus_name(Path::new("/data/corpora/qemu-fns")), "qemu-fns");
    assert_eq!(infer_corpus_name(Path::new("relative/dir")), "dir");
}

#[test]
fn corpus_name_falls_back_when_the_root_has_no_name() {
    assert_eq!(infer_corpus_name(Path::new("/")), "unnamed-corpus");
}

#[test]
fn sha256_bytes_matches_known_digests() {
    assert_eq!(
        sha256_bytes(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        sha256_bytes(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
