use core_types::LayerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("{0} is not open")]
    NotOpen(LayerId),
    #[error("the root layer cannot be closed")]
    RootNotClosable,
    #[error("{0} still has descendants and must be peeled first")]
    HasDescendants(LayerId),
    #[error("unknown layer reference `{0}`")]
    InvalidRef(String),
    #[error("invalid url pattern `{0}`")]
    InvalidPattern(String),
    #[error("invalid layer config: {0}")]
    Config(#[from] toml::de::Error),
}
