use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {path:?}: {error}")]
    Read { path: PathBuf, error: std::io::Error },
    #[error("Failed to write {path:?}: {error}")]
    Write { path: PathBuf, error: std::io::Error },
    #[error("Invalid JSON in {path:?}: {error}")]
    Json { path: PathBuf, error: serde_json::Error },
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn read_untyped_json<P: AsRef<Path>>(path: P) -> Result<serde_json::Value> {
    read_json(path)
}

pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|error| Error::Read {
        path: path.to_owned(),
        error,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|error| Error::Json {
        path: path.to_owned(),
        error,
    })
}

/// Pretty-prints `value` to `path`, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| Error::Write {
            path: parent.to_owned(),
            error,
        })?;
    }

    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|error| Error::Write {
        path: path.to_owned(),
        error,
    })
}
