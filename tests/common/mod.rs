#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory for source files; removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("write temp file bytes");
        path
    }
}

/// Label export shaped like an annotation tool's task dump.
pub const TASKS_JSON: &str = r#"{
  "project_id": 5,
  "tasks": [
    {"task_id": 1, "label": "cat", "annotator": {"name": "ana", "seconds": 12}},
    {"task_id": 2, "label": "dog", "annotator": {"name": "bo", "seconds": 8}},
    {"task_id": 3, "label": "cat", "annotator": {"name": "ana", "seconds": 15}}
  ]
}"#;

/// Model predictions keyed on the same task ids as [`TASKS_JSON`].
pub const PREDICTIONS_CSV: &str = "task_id,label,confidence\n1,cat,0.98\n2,cat,0.51\n4,dog,0.77\n";
