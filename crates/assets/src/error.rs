use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to import {path}: {source}")]
    Import {
        path: PathBuf,
        source: gltf::Error,
    },

    #[error("{path} contains no scene")]
    NoScene { path: PathBuf },

    #[error("{path}: mesh {mesh} primitive {primitive} has no positions")]
    MissingPositions {
        path: PathBuf,
        mesh: usize,
        primitive: usize,
    },

    #[error("loader thread for {path} exited without reporting")]
    Disconnected { path: PathBuf },
}
