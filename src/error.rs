use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No image or PDF files found in: {0}")]
    NoFilesFound(String),

    #[error("Metadata store is corrupt: {0}")]
    CorruptStore(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] substation_intake_common::Error),
}

pub type Result<T> = std::result::Result<T, IntakeError>;

impl From<IntakeError> for substation_intake_common::Error {
    /// ストアトレイトの境界ではコアのエラー型に揃える
    fn from(err: IntakeError) -> Self {
        use substation_intake_common::Error as CommonError;
        match err {
            IntakeError::Common(inner) => inner,
            IntakeError::Io(inner) => CommonError::Io(inner),
            IntakeError::JsonParse(inner) => CommonError::Json(inner),
            IntakeError::FileNotFound(path) => CommonError::NotFound(path),
            IntakeError::Config(msg) => CommonError::Config(msg),
            other => CommonError::Storage(other.to_string()),
        }
    }
}
