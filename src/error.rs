use thiserror::Error;

#[derive(Error, Debug)]
pub enum TablecheckError {
    #[error("store connection failed: {message}")]
    Connection { message: String },

    #[error("load failed: {cause}")]
    Load { cause: String },

    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    #[error("column '{column}' holds non-numeric value '{value}'")]
    TypeMismatch { column: String, value: String },

    #[error("cannot coerce value '{value}' in column '{column}' to an integer")]
    Coercion { column: String, value: String },

    #[error("store query failed: {message}")]
    Store { message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TablecheckError {
    /// Translate a low-level store error at a component boundary so raw
    /// `rusqlite` errors never escape the crate.
    pub(crate) fn store(e: rusqlite::Error) -> Self {
        TablecheckError::Store {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TablecheckError>;
