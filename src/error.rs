use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoterError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Unknown variable {variable} in block {block}")]
    UnknownVariable { block: String, variable: String },

    #[error("Block {0} is not being edited (run `noter edit {0}` first)")]
    NotEditing(String),

    #[error("{variable} is a balance, not a flow, and cannot be edited")]
    NotEditable { variable: String },

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NoterError>;
