//! Common test utilities for tooluse integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

use tooluse_config::API_KEY_ENV_VARS;

/// Isolated HOME so the real config is never touched
pub struct TestEnv {
    pub home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempdir().expect("temp home"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.path().join(".tooluse").join("config.json")
    }

    pub fn write_config(&self, json: &str) {
        let path = self.config_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    /// The binary with HOME redirected and no API key in the environment
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tooluse"));
        cmd.env("HOME", self.home.path());
        for var in API_KEY_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}
