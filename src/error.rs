use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::validate::SemanticError;

#[derive(Debug, Error)]
pub enum ErdotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Error in model file: {0}")]
    Document(#[from] DocumentError),
    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
