use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Databasfel: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO-fel: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON-fel: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Valideringsfel: {0}")]
    Validation(String),

    #[error("Hittades inte: {0}")]
    NotFound(String),

    #[error("Redan finns: {0}")]
    AlreadyExists(String),

    /// Posten ändrades eller togs bort av en annan session
    #[error("Konflikt: {0}")]
    Conflict(String),

    /// Fel e-post eller lösenord, eller inaktivt konto
    #[error("Inloggning nekad: {0}")]
    Unauthorized(String),

    #[error("Lösenordsfel: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Backendfel: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
