//! Shared harness for end-to-end CLI tests.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated database per test.
pub struct TestEnv {
    _tmp: TempDir,
    db_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_path = tmp.path().join("study.db");
        Self { _tmp: tmp, db_path }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn dir(&self) -> &Path {
        self._tmp.path()
    }

    /// A command pre-wired to this environment's database.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("berea").expect("binary builds");
        cmd.arg("--db").arg(&self.db_path);
        cmd
    }

    /// Creates a note and returns nothing; panics on failure.
    pub fn add_note(&self, reference: &str, title: &str, content: &str) {
        self.cmd()
            .args(["new", reference, title, "--content", content])
            .assert()
            .success();
    }

    /// Creates a topic, optionally under a parent.
    pub fn add_topic(&self, name: &str, parent: Option<&str>) {
        let mut cmd = self.cmd();
        cmd.args(["topic", "new", name]);
        if let Some(parent) = parent {
            cmd.args(["--parent", parent]);
        }
        cmd.assert().success();
    }
}
