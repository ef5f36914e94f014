use thiserror::Error;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("Invalid map size: {width}x{height}")]
    InvalidMapSize { width: u32, height: u32 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
