use thiserror::Error;

use crate::core::types::{PieceId, PieceRole};

#[derive(Error, Debug)]
pub enum DungeonError {
    #[error("No templates registered for role {0}")]
    EmptyRole(PieceRole),

    #[error("Seed template '{0}' has no connectors")]
    SeedWithoutConnectors(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Piece not found: {0:?}")]
    PieceNotFound(PieceId),

    #[error("Piece {0:?} is already part of the layout")]
    PieceFinalized(PieceId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Catalog parse error: {0}")]
    CatalogParse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DungeonError>;
