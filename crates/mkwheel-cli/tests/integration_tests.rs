//! Integration tests for the `mkwheel` CLI binary.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use zip::ZipArchive;

/// Test context providing an isolated build tree (source root + dist dir).
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("py/dist"))
            .expect("failed to create dist dir");
        Self { temp_dir }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn mkwheel_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_mkwheel");
        let mut cmd = Command::new(bin_path);
        cmd.current_dir(self.root());
        cmd
    }

    fn write_artifact(&self, rel: &str, data: &[u8]) {
        let path = self.root().join("py").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).expect("failed to create artifact dir");
        std::fs::write(path, data).expect("failed to write artifact");
    }

    fn dist_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.root().join("py/dist"))
            .expect("failed to read dist dir")
            .map(|e| e.unwrap().path())
            .collect()
    }
}

/// The end-to-end tests need a real interpreter to probe.
fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx
        .mkwheel_cmd()
        .arg("--help")
        .output()
        .expect("failed to run mkwheel");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx
        .mkwheel_cmd()
        .arg("--version")
        .output()
        .expect("failed to run mkwheel");
    assert!(output.status.success());
}

#[test]
fn test_probe_failure_leaves_no_archive() {
    let ctx = TestContext::new();
    ctx.write_artifact("coho/__init__.py", b"data");

    let output = ctx
        .mkwheel_cmd()
        .args(["--python", "./definitely-not-a-python", "1.0.0"])
        .arg("py/coho/__init__.py")
        .output()
        .expect("failed to run mkwheel");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("probe"));
    assert!(ctx.dist_entries().is_empty());
}

#[test]
fn test_bad_artifact_prefix_fails() {
    if !python_available() {
        eprintln!("skipping: python3 not available");
        return;
    }

    let ctx = TestContext::new();
    let output = ctx
        .mkwheel_cmd()
        .args(["1.0.0", "elsewhere/coho/__init__.py"])
        .output()
        .expect("failed to run mkwheel");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("source root"));
    assert!(ctx.dist_entries().is_empty());
}

#[test]
fn test_builds_wheel_end_to_end() {
    if !python_available() {
        eprintln!("skipping: python3 not available");
        return;
    }

    let ctx = TestContext::new();
    let payload: &[u8] = b"# compiled extension placeholder\n";
    ctx.write_artifact("coho/__init__.py", payload);

    let output = ctx
        .mkwheel_cmd()
        .args(["1.2.0", "py/coho/__init__.py"])
        .output()
        .expect("failed to run mkwheel");
    assert!(
        output.status.success(),
        "mkwheel failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // The produced path is printed on stdout, relative to the build tree.
    let printed = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert!(printed.ends_with(".whl"));
    let wheel_path = ctx.root().join(&printed);
    assert!(wheel_path.exists());

    let mut archive =
        ZipArchive::new(std::fs::File::open(&wheel_path).unwrap()).expect("invalid zip");
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names.len(), 4);
    assert_eq!(names[0], "coho/__init__.py");
    assert!(names[1].ends_with(".dist-info/WHEEL"));
    assert!(names[2].ends_with(".dist-info/METADATA"));
    assert!(names[3].ends_with(".dist-info/RECORD"));

    // RECORD digest of the artifact must match its actual content hash.
    let mut record = String::new();
    archive
        .by_name("coho-1.2.0.dist-info/RECORD")
        .unwrap()
        .read_to_string(&mut record)
        .unwrap();
    let rows: Vec<&str> = record.split("\r\n").filter(|r| !r.is_empty()).collect();
    assert_eq!(rows.len(), 4);
    let expected = format!(
        "coho/__init__.py,sha256={},{}",
        URL_SAFE_NO_PAD.encode(Sha256::digest(payload)),
        payload.len()
    );
    assert_eq!(rows[0], expected);
    assert_eq!(rows[3], "coho-1.2.0.dist-info/RECORD,,");
}

#[test]
fn test_rerun_overwrites_archive() {
    if !python_available() {
        eprintln!("skipping: python3 not available");
        return;
    }

    let ctx = TestContext::new();
    ctx.write_artifact("coho/__init__.py", b"data");

    for _ in 0..2 {
        let output = ctx
            .mkwheel_cmd()
            .args(["1.2.0", "py/coho/__init__.py"])
            .output()
            .expect("failed to run mkwheel");
        assert!(output.status.success());
    }

    assert_eq!(ctx.dist_entries().len(), 1);
}
