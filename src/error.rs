//! Error types. None of these are fatal: callers log them and continue with defaults or an
//! incomplete world.

use std::path::PathBuf;

use thiserror::Error;

use crate::state::GameMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record file {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] ron::Error),
}

/// Rejected transition requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("cannot switch to {requested:?} while a transition out of {current:?} is running")]
    TransitionInProgress {
        requested: GameMode,
        current: GameMode,
    },
}

/// Missing references that abort an entry action part-way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("AR pose source is unavailable")]
    MissingPoseSource,

    #[error("{0} prefab is not assigned")]
    MissingPrefab(&'static str),

    #[error("no collectible prefabs configured (all entries are bananas or the catalog is empty)")]
    NoCollectiblePrefabs,
}
