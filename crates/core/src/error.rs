use thiserror::Error;

use crate::entity::RecordId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("model '{model}' has no record {id}")]
    RecordNotFound { model: String, id: RecordId },

    #[error("configuration error: {0}")]
    Config(String),
}
