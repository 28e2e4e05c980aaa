use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn bin(store: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sealbox"));
    cmd.env_remove("SEALBOX_PASSWORD")
        .env("SEALBOX_ITERATIONS", "1000")
        .arg("--store")
        .arg(store);
    cmd
}

fn add(store: &Path, file: &Path, password: &str) {
    bin(store)
        .env("SEALBOX_PASSWORD", password)
        .arg("add")
        .arg(file)
        .assert()
        .success();
}

#[test]
fn add_and_get_roundtrip() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");
    let file = dir.path().join("greeting.txt");
    fs::write(&file, "hello, world!").unwrap();

    bin(&store)
        .env("SEALBOX_PASSWORD", "correct horse")
        .arg("add")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("stored 'greeting.txt' (13 bytes)"));

    bin(&store)
        .env("SEALBOX_PASSWORD", "correct horse")
        .arg("get")
        .arg("greeting.txt")
        .assert()
        .success()
        .stdout("hello, world!");
}

#[test]
fn get_to_output_file() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");
    let file = dir.path().join("data.bin");
    let out = dir.path().join("restored.bin");
    fs::write(&file, [0u8, 1, 2, 255]).unwrap();
    add(&store, &file, "pw");

    bin(&store)
        .env("SEALBOX_PASSWORD", "pw")
        .arg("get")
        .arg("data.bin")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read(out).unwrap(), [0u8, 1, 2, 255]);
}

#[test]
fn wrong_password_fails() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");
    let file = dir.path().join("greeting.txt");
    fs::write(&file, "hello, world!").unwrap();
    add(&store, &file, "correct horse");

    bin(&store)
        .env("SEALBOX_PASSWORD", "wrong password")
        .arg("get")
        .arg("greeting.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid password or corrupted data",
        ));
}

#[test]
fn unlock_on_empty_store_accepts_any_password() {
    let dir = tempdir().unwrap();

    bin(&dir.path().join("records"))
        .env("SEALBOX_PASSWORD", "anything at all")
        .arg("unlock")
        .assert()
        .success()
        .stdout(predicate::str::contains("password accepted"));
}

#[test]
fn password_can_be_piped() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");
    let file = dir.path().join("note.txt");
    fs::write(&file, "piped").unwrap();

    bin(&store)
        .arg("add")
        .arg(&file)
        .write_stdin("pipe pw\n")
        .assert()
        .success();

    bin(&store)
        .arg("get")
        .arg("note.txt")
        .write_stdin("pipe pw\n")
        .assert()
        .success()
        .stdout("piped");
}

#[test]
fn list_shows_names() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");

    bin(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No files stored."));

    let file = dir.path().join("a.txt");
    fs::write(&file, "A").unwrap();
    add(&store, &file, "pw");

    bin(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"));
}

#[test]
fn remove_file_works() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");
    let file = dir.path().join("a.txt");
    fs::write(&file, "A").unwrap();
    add(&store, &file, "pw");

    bin(&store)
        .arg("remove")
        .arg("a.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed successfully"));

    bin(&store)
        .env("SEALBOX_PASSWORD", "pw")
        .arg("get")
        .arg("a.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn export_then_import_into_another_store() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let file = dir.path().join("a.txt");
    fs::write(&file, "portable").unwrap();
    add(&first, &file, "pw");

    let exported = bin(&first)
        .arg("export")
        .arg("a.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"iterationCount\": 1000"))
        .get_output()
        .stdout
        .clone();
    let json = dir.path().join("a.json");
    fs::write(&json, exported).unwrap();

    bin(&second)
        .env("SEALBOX_PASSWORD", "pw")
        .arg("import")
        .arg(&json)
        .assert()
        .success();

    bin(&second)
        .env("SEALBOX_PASSWORD", "pw")
        .arg("get")
        .arg("a.txt")
        .assert()
        .success()
        .stdout("portable");
}

#[test]
fn reset_requires_confirmation() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("records");
    let file = dir.path().join("a.txt");
    fs::write(&file, "A").unwrap();
    add(&store, &file, "pw");

    bin(&store)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    bin(&store)
        .arg("reset")
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 file(s)"));

    // The old password no longer matters.
    bin(&store)
        .env("SEALBOX_PASSWORD", "fresh start")
        .arg("unlock")
        .assert()
        .success();
}

#[test]
fn fingerprint_prints_base64_sha256() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("empty");
    fs::write(&file, "").unwrap();

    bin(&dir.path().join("records"))
        .arg("fingerprint")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
        ));
}

#[test]
fn zero_iterations_rejected() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "A").unwrap();

    bin(&dir.path().join("records"))
        .env("SEALBOX_PASSWORD", "pw")
        .arg("--iterations")
        .arg("0")
        .arg("add")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("iteration count"));
}
