use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cannot map {from} to {to}: {message}")]
    Conversion {
        from: &'static str,
        to: &'static str,
        message: String,
    },
}

impl MappingError {
    pub fn conversion(target: &crate::MapTarget, message: impl std::fmt::Display) -> Self {
        MappingError::Conversion {
            from: target.source.name(),
            to: target.destination.name(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(err: serde_json::Error) -> Self {
        MappingError::Serialization(err.to_string())
    }
}
