use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for database registration and lookup
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed plugin options, raised before any driver is touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication against the driver failed for a named database
    #[error("An error occurred while attempting to connect to DB [{name}], please check the configuration. Details: {message}")]
    DatabaseConnection { name: String, message: String },

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Schema sync error: {0}")]
    Sync(String),

    #[error("cannot find the {0} database instance")]
    DatabaseNotFound(String),

    #[error("onConnect callback failed: {0}")]
    Callback(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Several databases failed during the same registration
    #[error("{} databases failed to register: {}", .0.len(), join_messages(.0))]
    Multiple(Vec<Error>),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn database_connection(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DatabaseConnection {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn sync(msg: impl Into<String>) -> Self {
        Self::Sync(msg.into())
    }

    pub fn database_not_found(name: impl Into<String>) -> Self {
        Self::DatabaseNotFound(name.into())
    }

    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Collapse a list of setup failures into a single error.
    ///
    /// Returns `None` for an empty list and the error itself when only one
    /// database failed.
    pub fn aggregate(mut errors: Vec<Error>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Get error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "E_VALIDATION",
            Error::DatabaseConnection { .. } => "E_DB_CONNECTION",
            Error::ModelLoad(_) => "E_MODEL_LOAD",
            Error::Sync(_) => "E_DB_SYNC",
            Error::DatabaseNotFound(_) => "E_DB_NOT_FOUND",
            Error::Callback(_) => "E_ON_CONNECT",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
            Error::Io(_) => "E_IO",
            Error::Yaml(_) => "E_YAML",
            Error::Toml(_) => "E_TOML",
            Error::Internal(_) => "E_INTERNAL",
            Error::Multiple(_) => "E_MULTIPLE",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_names_database() {
        let err = Error::database_connection("analytics", "refused");
        let msg = err.to_string();
        assert!(msg.contains("[analytics]"));
        assert!(msg.ends_with("Details: refused"));
        assert_eq!(err.error_code(), "E_DB_CONNECTION");
    }

    #[test]
    fn test_not_found_message() {
        let err = Error::database_not_found("missing");
        assert_eq!(err.to_string(), "cannot find the missing database instance");
    }

    #[test]
    fn test_aggregate() {
        assert!(Error::aggregate(Vec::new()).is_none());

        let single = Error::aggregate(vec![Error::sync("boom")]).unwrap();
        assert!(matches!(single, Error::Sync(_)));

        let many = Error::aggregate(vec![Error::sync("a"), Error::model_load("b")]).unwrap();
        assert!(matches!(many, Error::Multiple(ref errors) if errors.len() == 2));
        assert!(many.to_string().starts_with("2 databases failed to register"));
    }

    #[test]
    fn test_context_keeps_code() {
        let err = Error::model_load("bad file").with_context("loading users");
        assert_eq!(err.to_string(), "loading users");
        assert_eq!(err.error_code(), "E_MODEL_LOAD");
    }
}
