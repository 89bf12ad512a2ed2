use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatingsError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("connection error: {message}")]
    Connection { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("config error: {message}")]
    Config { message: String },
    #[error("io error: {message}")]
    Io { message: String },
}

impl RatingsError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

pub type RatingsResult<T> = Result<T, RatingsError>;

impl From<sea_orm::DbErr> for RatingsError {
    fn from(value: sea_orm::DbErr) -> Self {
        RatingsError::storage(value.to_string())
    }
}
