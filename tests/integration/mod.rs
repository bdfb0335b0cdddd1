// Integration test utilities and common code
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dejatext::{Engine, EngineConfig, RunSummary};
use tempfile::TempDir;

/// Temporary input tree plus an output location next to it
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("cleanup_output");
        fs::create_dir_all(&input_dir).expect("Failed to create input directory");

        Self {
            temp_dir,
            input_dir,
            output_dir,
        }
    }

    /// Write a file under the input tree, creating parent directories
    pub fn create_document<P: AsRef<Path>>(&self, relative_path: P, content: impl AsRef<[u8]>) -> PathBuf {
        let file_path = self.input_dir.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    pub fn output_path<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        self.output_dir.join(relative_path)
    }

    pub fn read_output<P: AsRef<Path>>(&self, relative_path: P) -> String {
        fs::read_to_string(self.output_path(relative_path)).expect("Failed to read output file")
    }

    pub fn read_output_bytes<P: AsRef<Path>>(&self, relative_path: P) -> Vec<u8> {
        fs::read(self.output_path(relative_path)).expect("Failed to read output file")
    }

    pub fn output_exists<P: AsRef<Path>>(&self, relative_path: P) -> bool {
        self.output_path(relative_path).exists()
    }

    pub fn read_input<P: AsRef<Path>>(&self, relative_path: P) -> String {
        fs::read_to_string(self.input_dir.join(relative_path)).expect("Failed to read input file")
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            document_timeout: Duration::from_secs(10),
            ..EngineConfig::new(&self.input_dir, &self.output_dir)
        }
    }

    /// Run the engine with the default fixture config
    pub async fn run(&self) -> RunSummary {
        self.run_with(self.config()).await
    }

    pub async fn run_with(&self, config: EngineConfig) -> RunSummary {
        Engine::new(config)
            .expect("Engine config should be valid")
            .run()
            .await
            .expect("Run should succeed")
    }

    /// Second pass over the previous output, written to a sibling directory
    pub async fn rerun_on_output(&self) -> (RunSummary, PathBuf) {
        let second_output = self.temp_dir.path().join("second_pass");
        let config = EngineConfig {
            document_timeout: Duration::from_secs(10),
            ..EngineConfig::new(&self.output_dir, &second_output)
        };
        (self.run_with(config).await, second_output)
    }
}

/// Relative paths of all files under `root`, sorted
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .expect("walked path is under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}
