//! Persistence of engine parameters and generated key material.

use crate::engine::EngineParams;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use tracing::info;

/// Everything needed to rebuild an engine context with the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundle {
    pub params: EngineParams,
    pub seed: Option<u64>,
    pub mult_key: bool,
    pub rotation_shifts: Vec<i32>,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serde_json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io { path: path.to_path_buf(), source }
}

/// Writes `bundle` to `dir/filename`, creating `dir` and replacing an existing file.
pub fn save_keys(dir: &Path, filename: &str, bundle: &KeyBundle) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let path = dir.join(filename);
    if path.exists() {
        fs::remove_file(&path).map_err(io_error(&path))?;
    }
    let json = serde_json::to_vec_pretty(bundle)?;
    fs::write(&path, json).map_err(io_error(&path))?;
    info!("key bundle written to {:?}", path);
    Ok(path)
}

pub fn load_keys(path: &Path) -> Result<KeyBundle, StorageError> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    Ok(serde_json::from_slice(&bytes)?)
}
