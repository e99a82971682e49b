#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("could not load configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("could not set up logging: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error(transparent)]
    Search(#[from] search_client::Error),
    #[error("could not encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ServiceError {
    /// Process exit status for this failure: 2 for bad input, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            ServiceError::Search(err) if !err.is_upstream() => 2,
            ServiceError::Config(_) => 2,
            _ => 1,
        }
    }
}
