use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecompositionError {
    #[error("Syntax error: {message} in `{fragment}`")]
    SyntaxError { message: String, fragment: String },

    #[error("Invalid FROM source `{source_text}`: {reason}")]
    SourceError { source_text: String, reason: String },

    #[error("FROM clause is empty")]
    EmptyFrom,

    #[error("Unsupported operator node in {pass} pass: {node}")]
    UnsupportedNode { pass: &'static str, node: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Engine `{engine}` failed: {source:#}")]
    EngineError {
        engine: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type DecompositionResult<T> = Result<T, DecompositionError>;

impl DecompositionError {
    pub fn syntax(message: &str, fragment: &str) -> Self {
        Self::SyntaxError {
            message: message.to_string(),
            fragment: fragment.to_string(),
        }
    }

    pub fn source(source_text: &str, reason: &str) -> Self {
        Self::SourceError {
            source_text: source_text.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported_node(pass: &'static str, node: &str) -> Self {
        Self::UnsupportedNode {
            pass,
            node: node.to_string(),
        }
    }

    pub fn config(message: &str) -> Self {
        Self::ConfigError {
            message: message.to_string(),
        }
    }

    pub fn engine(engine: &str, source: anyhow::Error) -> Self {
        Self::EngineError {
            engine: engine.to_string(),
            source,
        }
    }

    /// Errors caused by the query text itself, as opposed to configuration,
    /// internal invariants or collaborators.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::SyntaxError { .. } | Self::SourceError { .. })
    }
}
