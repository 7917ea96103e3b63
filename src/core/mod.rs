pub mod config;
pub mod error;
pub mod types;

pub use config::GeneratorConfig;
pub use error::{DungeonError, Result};
pub use types::{ConnectorRef, PieceId, PieceRole, Pose, TemplateId};
