use crate::ConfigError;

use terrain_tiles_storage::DecodeError;

use thiserror::Error;

/// A failed fetch, as reported by a `Transport`.
///
/// Transport failures are answers, not crashes: the provider records the tile as having no data and carries on.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TransportError {
    #[error("request for {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("request for {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("could not schedule request for {url}")]
    Spawn { url: String },
}

impl TransportError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Network {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Everything that can go wrong while turning a tile request into a grid.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
