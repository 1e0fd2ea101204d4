use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to save document {document} in collection {collection}: {source}")]
    Persistence {
        collection: String,
        document: String,
        #[source]
        source: Box<DomainError>,
    },

    #[error("data key is missing from document {document} in collection {collection}")]
    DataMissing { collection: String, document: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn persistence(
        collection: impl Into<String>,
        document: impl Into<String>,
        source: DomainError,
    ) -> Self {
        Self::Persistence {
            collection: collection.into(),
            document: document.into(),
            source: Box::new(source),
        }
    }

    pub fn data_missing(collection: impl Into<String>, document: impl Into<String>) -> Self {
        Self::DataMissing {
            collection: collection.into(),
            document: document.into(),
        }
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_message_names_target_and_cause() {
        let err = DomainError::persistence(
            "alerts",
            "alert-1",
            DomainError::external("PERMISSION_DENIED: missing scope"),
        );

        assert_eq!(
            err.to_string(),
            "Failed to save document alert-1 in collection alerts: \
             External service error: PERMISSION_DENIED: missing scope"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
