use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server_url must start with http://, https://, ws:// or wss://: {0}")]
    InvalidServerUrl(String),
    #[error("transport is closed")]
    TransportClosed,
    #[error("no config directory available for the user store")]
    NoConfigDir,
    #[error("failed to access user store '{path}': {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed user store '{path}': {source}")]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode user store: {0}")]
    StoreEncode(#[from] toml::ser::Error),
    #[error("unknown page variant '{0}'")]
    UnknownVariant(String),
}
