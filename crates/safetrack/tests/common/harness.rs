//! Test harness for isolated test execution.
//!
//! Every harness owns its own temporary base directory holding the config
//! file, the database, the uploads and the act template.

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use assert_fs::TempDir;
use walkdir::WalkDir;

use safetrack::config::{load_config, AppConfig, CONFIG_FILE_NAME};
use safetrack::AppContext;

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: AppConfig,
    pub ctx: AppContext,
}

impl TestHarness {
    /// Harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config_json(r#"{ "version": "1.0", "chart": { "width": 320, "height": 200 } }"#)
    }

    /// Harness whose config is read from `json`, written as the base
    /// directory's config file first.
    pub fn with_config_json(json: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_file = temp_dir.child(CONFIG_FILE_NAME);
        config_file.write_str(json).expect("Failed to write config");

        let config = load_config(config_file.path()).expect("Failed to load config");
        let ctx = AppContext::open(&config).expect("Failed to open context");

        Self {
            temp_dir,
            config,
            ctx,
        }
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.upload_dir()
    }

    /// Files currently under the upload root, recursively.
    pub fn uploaded_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(self.upload_dir())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}

/// Reads one part of a zip package as text.
pub fn package_part(package: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(package)).expect("Not a zip package");
    let mut part = archive.by_name(name).expect("Part missing");
    let mut content = String::new();
    part.read_to_string(&mut content).expect("Part is not text");
    content
}

/// Names of all parts of a zip package.
pub fn package_parts(package: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(package)).expect("Not a zip package");
    archive.file_names().map(str::to_string).collect()
}
