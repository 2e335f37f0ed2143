//! Process-wide configuration, read from environment variables.
//!
//! Mirrors the teacher's convention of small, serde-deserializable settings
//! structs populated from `env::var`, rather than a full config-file layer —
//! the core only needs two paths and an optional embedding model name.

use std::env;
use std::path::PathBuf;

const DEFAULT_INDEX_PATH: &str = ".kdd-index";
const DEFAULT_SPECS_PATH: &str = "specs";

#[derive(Debug, Clone)]
pub struct Settings {
    pub index_path: PathBuf,
    pub specs_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            index_path: env::var("KDD_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_INDEX_PATH)),
            specs_path: env::var("KDD_SPECS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SPECS_PATH)),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            specs_path: PathBuf::from(DEFAULT_SPECS_PATH),
        }
    }
}
