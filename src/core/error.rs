use thiserror::Error;

/// Errors surfaced at the boundary of the simulation core.
///
/// Nothing inside the tick loop returns these. They only come from loading
/// configuration files and map descriptions supplied by collaborators.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Map parse error: {0}")]
    MapParse(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
